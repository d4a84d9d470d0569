//! pwa-push CLI - web push subscriptions and PWA diagnostics.
//!
//! This is the main binary entry point. See the `pwa_push` library for the
//! core functionality.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pwa_push::constants::ENV_LOG_FILE;
use pwa_push::notifications::push::NotificationPayload;
use pwa_push::{commands, Config};
use std::path::PathBuf;

// CLI
#[derive(Parser)]
#[command(name = "pwa-push")]
#[command(version)]
#[command(about = "Web push subscription management and PWA installability checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a URL-safe base64 key (defaults to the configured application server key)
    DecodeKey {
        /// Key to decode
        key: Option<String>,
    },
    /// Manage VAPID keys
    Vapid {
        #[command(subcommand)]
        action: VapidAction,
    },
    /// Store a browser push subscription (PushSubscription JSON)
    Subscribe {
        /// Identity the subscription belongs to (user or device id)
        #[arg(long)]
        id: String,
        /// File containing the subscription JSON (stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Remove push subscriptions
    Unsubscribe {
        /// Identity to remove
        #[arg(long)]
        id: Option<String>,
        /// Remove every subscription with this endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// List stored push subscriptions
    List,
    /// Send a notification to every stored subscription
    Send {
        /// Notification title
        #[arg(long)]
        title: String,
        /// Notification body
        #[arg(long)]
        body: String,
        /// Icon URL
        #[arg(long)]
        icon: Option<String>,
        /// URL opened when the notification is clicked
        #[arg(long)]
        url: Option<String>,
    },
    /// Check PWA installability and push readiness
    Doctor {
        /// Path to the web app manifest
        #[arg(long)]
        manifest: PathBuf,
        /// Origin the app is served from
        #[arg(long)]
        origin: String,
        /// Path to the service worker script (defaults to sw.js beside the manifest)
        #[arg(long)]
        service_worker: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to config.json (the private key is never written)
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum VapidAction {
    /// Generate and store a new VAPID keypair
    Generate {
        /// Replace existing keys
        #[arg(long)]
        force: bool,
    },
    /// Print the application server key
    Show,
}

fn init_logging() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();

    if let Ok(path) = std::env::var(ENV_LOG_FILE) {
        let log_file = std::fs::File::create(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create log file at {path:?}: {e}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }

    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::DecodeKey { key } => {
            commands::key::decode(&config, key.as_deref())?;
        }
        Commands::Vapid { action } => match action {
            VapidAction::Generate { force } => {
                commands::key::generate(&config, force)?;
            }
            VapidAction::Show => {
                commands::key::show(&config)?;
            }
        },
        Commands::Subscribe { id, file } => {
            let json = commands::subscription::read_source(file.as_deref())?;
            commands::subscription::subscribe(&config, &id, &json)?;
        }
        Commands::Unsubscribe { id, endpoint } => {
            commands::subscription::unsubscribe(&config, id.as_deref(), endpoint.as_deref())?;
        }
        Commands::List => {
            commands::subscription::list(&config)?;
        }
        Commands::Send {
            title,
            body,
            icon,
            url,
        } => {
            let notification = NotificationPayload {
                title,
                body,
                icon,
                url,
            };
            commands::send::send(&config, &notification)?;
        }
        Commands::Doctor {
            manifest,
            origin,
            service_worker,
        } => {
            if !commands::doctor::run(&config, &manifest, &origin, service_worker.as_deref())? {
                std::process::exit(1);
            }
        }
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save()?;
                log::info!("Saved configuration to {:?}", Config::config_dir()?);
            }
        }
    }

    Ok(())
}
