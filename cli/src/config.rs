//! Configuration loading and persistence.
//!
//! Settings come from `config.json` in the config directory, then
//! environment variables override them. The VAPID private key is only ever
//! read from the environment or the data directory; it is never written to
//! `config.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE, DEFAULT_TTL_SECS, DEFAULT_VAPID_SUBJECT, ENV_CONFIG_DIR,
    ENV_DATA_DIR, ENV_TTL, ENV_VAPID_PRIVATE_KEY, ENV_VAPID_PUBLIC_KEY, ENV_VAPID_SUBJECT,
};
use crate::notifications::vapid::{decode_application_server_key, VapidKeys};
use crate::persistence;

/// Configuration for the pwa-push CLI.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// Application server key handed to browsers (URL-safe base64, unpadded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vapid_public_key: Option<String>,
    /// VAPID private key - NOT serialized to disk.
    #[serde(skip)]
    pub vapid_private_key: Option<String>,
    /// Contact URI placed in the VAPID `sub` claim.
    pub vapid_subject: String,
    /// Push message time-to-live in seconds.
    pub ttl: u32,
    /// Directory holding subscriptions and generated keys.
    pub data_dir: PathBuf,
}

/// Repo-local scratch directory used in test mode.
fn test_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(|p| p.join("tmp").join(name))
        .unwrap_or_else(|| PathBuf::from("tmp").join(name))
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = if crate::env::is_test_mode() {
            test_dir("pwa-push-data")
        } else {
            dirs::data_dir()
                .map(|d| d.join(APP_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from("pwa-push-data"))
        };

        Self {
            vapid_public_key: None,
            vapid_private_key: None,
            vapid_subject: DEFAULT_VAPID_SUBJECT.to_string(),
            ttl: DEFAULT_TTL_SECS,
            data_dir,
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `PWA_PUSH_CONFIG_DIR` env var: explicit override
    /// 2. `PWA_PUSH_ENV=test`: repo `tmp/pwa-push-test`
    /// 3. Default: platform config dir (Linux: ~/.config/pwa-push)
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
            PathBuf::from(dir)
        } else if crate::env::is_test_mode() {
            test_dir("pwa-push-test")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join(APP_DIR_NAME)
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_dir()?)
    }

    /// Loads configuration from `dir`, with environment variable overrides.
    ///
    /// A missing file means defaults; an unreadable one is an error.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key/value source (the process environment
    /// in production). Empty values are ignored, as are unparsable TTLs.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(public_key) = get(ENV_VAPID_PUBLIC_KEY) {
            self.vapid_public_key = Some(public_key.trim().to_string());
        }

        if let Some(private_key) = get(ENV_VAPID_PRIVATE_KEY) {
            self.vapid_private_key = Some(private_key.trim().to_string());
        }

        if let Some(subject) = get(ENV_VAPID_SUBJECT) {
            self.vapid_subject = subject;
        }

        if let Some(ttl) = get(ENV_TTL) {
            match ttl.parse::<u32>() {
                Ok(ttl) => self.ttl = ttl,
                Err(_) => log::warn!("Ignoring invalid {}={:?}", ENV_TTL, ttl),
            }
        }

        if let Some(data_dir) = get(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(shellexpand::tilde(&data_dir).into_owned());
        }
    }

    /// Persists the current configuration to the config directory.
    /// Note: the private key is NOT saved.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_dir()?)
    }

    /// Persists the current configuration to `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let config_path = dir.join(CONFIG_FILE);
        fs::write(&config_path, serde_json::to_string_pretty(self)?)?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }

    /// The application server key browsers subscribe with, if any.
    ///
    /// Falls back to the generated keypair in the data directory.
    pub fn public_key(&self) -> Result<Option<String>> {
        if let Some(key) = &self.vapid_public_key {
            return Ok(Some(key.clone()));
        }
        Ok(persistence::load_vapid_keys(&self.data_dir)?
            .map(|keys| keys.public_key_base64url().to_string()))
    }

    /// Decoded application server key bytes.
    ///
    /// A missing or empty key is a configuration error; a key that does not
    /// decode to a P-256 point makes push subscription setup fail.
    pub fn application_server_key(&self) -> Result<Vec<u8>> {
        let key = self
            .public_key()?
            .filter(|k| !k.trim().is_empty())
            .with_context(|| {
                format!(
                    "Missing application server key: set {} or run `pwa-push vapid generate`",
                    ENV_VAPID_PUBLIC_KEY
                )
            })?;
        decode_application_server_key(&key)
            .map_err(|e| anyhow::anyhow!("Push subscription setup failed: {e}"))
    }

    /// The VAPID keypair used to sign pushes.
    ///
    /// Environment keys win over the stored keypair. A configured public key
    /// must always match whichever private key is in use.
    pub fn vapid_keys(&self) -> Result<VapidKeys> {
        let keys = match (&self.vapid_public_key, &self.vapid_private_key) {
            (Some(public), Some(private)) => VapidKeys::from_base64url(public, private)
                .context("VAPID keys from the environment are invalid")?,
            (None, Some(_)) => anyhow::bail!(
                "{} is set but {} is not",
                ENV_VAPID_PRIVATE_KEY,
                ENV_VAPID_PUBLIC_KEY
            ),
            (public, None) => {
                let stored = persistence::load_vapid_keys(&self.data_dir)?.with_context(|| {
                    format!(
                        "No VAPID keys found: set {} or run `pwa-push vapid generate`",
                        ENV_VAPID_PRIVATE_KEY
                    )
                })?;
                if let Some(public) = public {
                    anyhow::ensure!(
                        public == stored.public_key_base64url(),
                        "{} does not match the stored VAPID keypair",
                        ENV_VAPID_PUBLIC_KEY
                    );
                }
                stored
            }
        };
        Ok(keys)
    }
}
