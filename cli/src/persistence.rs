//! On-disk state for surviving restarts.
//!
//! # Storage structure
//!
//! ```text
//! {data_dir}/
//!     push_subscriptions.json    # Browser push subscriptions by identity
//!     vapid_keys.json            # Generated VAPID keypair (private!)
//! ```
//!
//! Both files are written owner read/write only on unix.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::constants::{SUBSCRIPTIONS_FILE, VAPID_KEYS_FILE};
use crate::notifications::push::PushSubscriptionStore;
use crate::notifications::vapid::VapidKeys;

fn write_private_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(value).context("Failed to serialize state")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Load push subscriptions from `data_dir`.
///
/// Returns an empty store if the file doesn't exist yet.
pub fn load_subscriptions(data_dir: &Path) -> Result<PushSubscriptionStore> {
    let subs_path = data_dir.join(SUBSCRIPTIONS_FILE);

    if !subs_path.exists() {
        return Ok(PushSubscriptionStore::default());
    }

    let content =
        fs::read_to_string(&subs_path).context("Failed to read push subscriptions file")?;
    let store: PushSubscriptionStore =
        serde_json::from_str(&content).context("Failed to parse push subscriptions file")?;

    log::info!("Loaded {} push subscription(s)", store.len());
    Ok(store)
}

/// Save push subscriptions to `data_dir`.
pub fn save_subscriptions(data_dir: &Path, store: &PushSubscriptionStore) -> Result<()> {
    let subs_path = data_dir.join(SUBSCRIPTIONS_FILE);
    write_private_json(&subs_path, store)?;
    log::debug!("Saved {} push subscription(s) to {:?}", store.len(), subs_path);
    Ok(())
}

/// Load the generated VAPID keypair, if one exists.
///
/// Keys are re-validated on load so a hand-edited file fails loudly.
pub fn load_vapid_keys(data_dir: &Path) -> Result<Option<VapidKeys>> {
    let keys_path = data_dir.join(VAPID_KEYS_FILE);

    if !keys_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&keys_path).context("Failed to read VAPID keys file")?;
    let stored: VapidKeys =
        serde_json::from_str(&content).context("Failed to parse VAPID keys file")?;
    let keys = VapidKeys::from_base64url(stored.public_key_base64url(), stored.private_key_base64url())
        .context("Stored VAPID keys are invalid")?;

    log::info!("Loaded VAPID keys from {:?}", keys_path);
    Ok(Some(keys))
}

/// Save a VAPID keypair to `data_dir`.
pub fn save_vapid_keys(data_dir: &Path, keys: &VapidKeys) -> Result<()> {
    let keys_path = data_dir.join(VAPID_KEYS_FILE);
    write_private_json(&keys_path, keys)?;
    log::debug!("Saved VAPID keys to {:?}", keys_path);
    Ok(())
}
