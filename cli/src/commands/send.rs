//! Notification delivery command.
//!
//! ```bash
//! pwa-push send --title "Hello" --body "Push is working"
//! ```

use anyhow::{Context, Result};

use crate::notifications::push::{BroadcastReport, NotificationPayload, PushSender};
use crate::persistence;
use crate::Config;

/// Sends `notification` to every stored subscription and prunes the ones
/// the push services report as gone.
///
/// # Errors
///
/// Returns an error if no VAPID keys are configured, or if every delivery
/// attempt failed.
pub fn send(config: &Config, notification: &NotificationPayload) -> Result<BroadcastReport> {
    let mut store = persistence::load_subscriptions(&config.data_dir)?;
    if store.is_empty() {
        println!("No subscriptions");
        return Ok(BroadcastReport::default());
    }

    let sender = PushSender::new(config.vapid_keys()?, config.vapid_subject.clone(), config.ttl)?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = runtime.block_on(sender.broadcast(&store, notification))?;

    let pruned = report
        .expired
        .iter()
        .filter(|identity| store.remove(identity))
        .count();
    if pruned > 0 {
        persistence::save_subscriptions(&config.data_dir, &store)?;
        log::info!("[WebPush] Pruned {} expired subscription(s)", pruned);
    }

    println!(
        "Delivered {}, expired {}, rate limited {}, failed {}",
        report.delivered,
        report.expired.len(),
        report.rate_limited,
        report.failed.len()
    );
    for (identity, error) in &report.failed {
        eprintln!("  {}: {}", identity, error);
    }

    if report.delivered == 0 && !report.failed.is_empty() {
        anyhow::bail!("Every push delivery failed");
    }
    Ok(report)
}
