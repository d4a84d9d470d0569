//! Application-wide constants for pwa-push.
//!
//! Centralizes environment variable names, file names, and push delivery
//! defaults so they are discoverable in one place.
//!
//! # Categories
//!
//! - **Environment**: variable names read by [`crate::config`] and [`crate::env`]
//! - **Storage**: file names inside the config and data directories
//! - **Push**: delivery defaults and key sizes

use std::time::Duration;

// ============================================================================
// Environment
// ============================================================================

/// Application server (VAPID public) key, URL-safe base64 without padding.
///
/// Shares its name with the variable the web page reads, so one `.env`
/// file serves both sides.
pub const ENV_VAPID_PUBLIC_KEY: &str = "NEXT_PUBLIC_VAPID_PUBLIC_KEY";

/// VAPID private key (raw 32-byte scalar, URL-safe base64).
pub const ENV_VAPID_PRIVATE_KEY: &str = "VAPID_PRIVATE_KEY";

/// Contact URI for the VAPID `sub` claim.
pub const ENV_VAPID_SUBJECT: &str = "VAPID_SUBJECT";

/// Push message TTL override, in seconds.
pub const ENV_TTL: &str = "PWA_PUSH_TTL";

/// Data directory override (subscriptions and generated keys).
pub const ENV_DATA_DIR: &str = "PWA_PUSH_DATA_DIR";

/// Config directory override.
pub const ENV_CONFIG_DIR: &str = "PWA_PUSH_CONFIG_DIR";

/// Runtime environment selector.
pub const ENV_RUNTIME: &str = "PWA_PUSH_ENV";

/// Log file override; logs go to stderr when unset.
pub const ENV_LOG_FILE: &str = "PWA_PUSH_LOG_FILE";

// ============================================================================
// Storage
// ============================================================================

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "pwa-push";

/// Configuration file name.
pub const CONFIG_FILE: &str = "config.json";

/// Stored browser push subscriptions.
pub const SUBSCRIPTIONS_FILE: &str = "push_subscriptions.json";

/// Generated VAPID keypair.
pub const VAPID_KEYS_FILE: &str = "vapid_keys.json";

// ============================================================================
// Push
// ============================================================================

/// Default push message time-to-live (24 hours).
pub const DEFAULT_TTL_SECS: u32 = 86_400;

/// Default VAPID subject when none is configured.
pub const DEFAULT_VAPID_SUBJECT: &str = "mailto:admin@example.com";

/// HTTP timeout for a single push service request.
pub const PUSH_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Uncompressed SEC1 P-256 point length (`0x04 || x || y`).
pub const P256_PUBLIC_KEY_LEN: usize = 65;

/// Raw P-256 private scalar length.
pub const P256_PRIVATE_KEY_LEN: usize = 32;

/// Push subscription auth secret length.
pub const AUTH_SECRET_LEN: usize = 16;
