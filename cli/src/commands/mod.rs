//! CLI subcommand implementations for pwa-push.
//!
//! Commands are organized into submodules by domain:
//!
//! - [`key`] - Application server key decoding and VAPID key generation
//! - [`subscription`] - Storing and removing browser push subscriptions
//! - [`send`] - Notification fan-out to stored subscriptions
//! - [`doctor`] - Installability and push readiness report
//!
//! # Usage
//!
//! Commands are invoked from the main CLI dispatcher:
//!
//! ```ignore
//! use pwa_push::{commands, Config};
//!
//! let config = Config::load()?;
//! commands::key::decode(&config, None)?;
//! commands::subscription::list(&config)?;
//! ```

pub mod doctor;
pub mod key;
pub mod send;
pub mod subscription;

// Re-export commonly used functions for convenience
#[doc(inline)]
pub use key::{decode as decode_key, generate as generate_vapid_keys};
#[doc(inline)]
pub use subscription::{list as list_subscriptions, subscribe, unsubscribe};
