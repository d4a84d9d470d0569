//! Push subscription management commands.
//!
//! Subscriptions arrive as the JSON a page gets from
//! `PushSubscription.toJSON()`:
//!
//! ```bash
//! # Store a subscription for a user
//! pwa-push subscribe --id alice --file subscription.json
//! echo "$SUBSCRIPTION_JSON" | pwa-push subscribe --id alice
//!
//! # Remove it again
//! pwa-push unsubscribe --id alice
//! ```

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::notifications::push::PushSubscription;
use crate::persistence;
use crate::Config;

/// Parse and validate subscription JSON.
pub fn parse(json: &str) -> Result<PushSubscription> {
    let subscription: PushSubscription =
        serde_json::from_str(json).context("Subscription is not valid PushSubscription JSON")?;
    subscription.validate()?;
    Ok(subscription)
}

/// Read subscription JSON from `file`, or stdin when no file is given.
pub fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read subscription from stdin")?;
            Ok(buf)
        }
    }
}

/// Stores a validated subscription for `identity`.
pub fn subscribe(config: &Config, identity: &str, json: &str) -> Result<()> {
    anyhow::ensure!(!identity.trim().is_empty(), "Identity must not be empty");
    let subscription = parse(json)?;

    let mut store = persistence::load_subscriptions(&config.data_dir)?;
    let endpoint = subscription.endpoint.clone();
    store.upsert(identity.to_string(), subscription);
    persistence::save_subscriptions(&config.data_dir, &store)?;

    log::info!("Stored push subscription for {}", identity);
    println!("Subscribed {} ({})", identity, endpoint);
    Ok(())
}

/// Removes subscriptions by identity and/or endpoint. Returns how many went.
pub fn unsubscribe(config: &Config, identity: Option<&str>, endpoint: Option<&str>) -> Result<usize> {
    anyhow::ensure!(
        identity.is_some() || endpoint.is_some(),
        "Pass --id or --endpoint"
    );

    let mut store = persistence::load_subscriptions(&config.data_dir)?;
    let mut removed = 0;
    if let Some(identity) = identity {
        removed += usize::from(store.remove(identity));
    }
    if let Some(endpoint) = endpoint {
        removed += store.remove_endpoint(endpoint);
    }

    if removed == 0 {
        println!("No matching subscription");
        return Ok(0);
    }

    persistence::save_subscriptions(&config.data_dir, &store)?;
    log::info!("Removed {} push subscription(s)", removed);
    println!("Removed {} subscription(s)", removed);
    Ok(removed)
}

/// Lists stored subscriptions.
pub fn list(config: &Config) -> Result<()> {
    let store = persistence::load_subscriptions(&config.data_dir)?;
    if store.is_empty() {
        println!("No subscriptions");
        return Ok(());
    }

    for (identity, record) in store.all() {
        println!(
            "{}\t{}\t{}",
            identity,
            record.subscribed_at.to_rfc3339(),
            record.subscription.endpoint
        );
    }
    Ok(())
}
