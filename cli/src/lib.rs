//! pwa-push - web push plumbing for Progressive Web Apps.
//!
//! Provides the server side of a PWA's push setup: decoding the
//! application server key, managing VAPID keys, storing browser push
//! subscriptions, delivering notifications, and checking installability.
//!
//! # Modules
//!
//! - [`encoding`] - URL-safe base64 decoding for key material
//! - [`notifications`] - VAPID keys, subscriptions, and push delivery
//! - [`install`] - manifest and installability diagnostics
//! - [`config`] - configuration loading/saving
//! - [`persistence`] - subscription and key files
//! - [`commands`] - CLI subcommand implementations

pub mod commands;
pub mod config;
pub mod constants;
pub mod encoding;
pub mod env;
pub mod install;
pub mod notifications;
pub mod persistence;

// Re-export commonly used types
pub use config::Config;
pub use encoding::{url_base64_to_bytes, DecodeError};
pub use notifications::push::{PushSubscription, PushSubscriptionStore};
pub use notifications::vapid::VapidKeys;
