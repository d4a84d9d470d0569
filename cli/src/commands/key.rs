//! Key material commands.
//!
//! # Examples
//!
//! ```bash
//! # Decode the configured application server key
//! pwa-push decode-key
//!
//! # Decode an arbitrary URL-safe base64 string
//! pwa-push decode-key FPQxkY
//!
//! # Create a VAPID keypair and print .env lines
//! pwa-push vapid generate
//! ```

use anyhow::{Context, Result};

use crate::constants::{ENV_VAPID_PRIVATE_KEY, ENV_VAPID_PUBLIC_KEY};
use crate::encoding::url_base64_to_bytes;
use crate::notifications::vapid::{validate_application_server_key, VapidKeys};
use crate::persistence;
use crate::Config;

/// Lowercase hex rendering of `bytes`.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes `key` (or the configured application server key) and prints
/// its length and hex bytes.
///
/// # Errors
///
/// Returns an error if:
/// - The key is empty or not configured
/// - The key is not valid URL-safe base64
pub fn decode(config: &Config, key: Option<&str>) -> Result<()> {
    let bytes = match key {
        Some(key) => {
            anyhow::ensure!(!key.trim().is_empty(), "Key is empty");
            url_base64_to_bytes(key.trim()).context("Failed to decode key")?
        }
        None => config.application_server_key()?,
    };

    println!("{} bytes", bytes.len());
    println!("{}", to_hex(&bytes));
    if validate_application_server_key(&bytes).is_ok() {
        println!("Valid P-256 application server key");
    }
    Ok(())
}

/// Generates a VAPID keypair, saves it to the data directory, and prints
/// the matching environment variable lines.
///
/// Refuses to replace existing keys unless `force` is set, since every
/// stored subscription is bound to the old public key.
pub fn generate(config: &Config, force: bool) -> Result<VapidKeys> {
    if !force && persistence::load_vapid_keys(&config.data_dir)?.is_some() {
        anyhow::bail!(
            "VAPID keys already exist in {}; pass --force to replace them \
             (existing subscriptions will stop working)",
            config.data_dir.display()
        );
    }

    let keys = VapidKeys::generate();
    persistence::save_vapid_keys(&config.data_dir, &keys)?;
    log::info!("Generated new VAPID keypair");

    println!("{}={}", ENV_VAPID_PUBLIC_KEY, keys.public_key_base64url());
    println!("{}={}", ENV_VAPID_PRIVATE_KEY, keys.private_key_base64url());
    Ok(keys)
}

/// Prints the application server key browsers should subscribe with.
pub fn show(config: &Config) -> Result<()> {
    let key = config
        .public_key()?
        .context("No VAPID public key configured; run `pwa-push vapid generate`")?;
    println!("{}", key);
    Ok(())
}
