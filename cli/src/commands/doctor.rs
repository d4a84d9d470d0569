//! Installability and push readiness report.
//!
//! ```bash
//! pwa-push doctor --manifest public/manifest.json --origin https://app.example.com
//! ```
//!
//! When `--service-worker` is omitted, `sw.js` next to the manifest is
//! checked.

use anyhow::{Context, Result};
use reqwest::Url;
use std::path::Path;

use crate::env::Environment;
use crate::install::{diagnose, DiagnoseInput, InstallReport, WebAppManifest, INSTALL_TIPS};
use crate::Config;

/// Default service worker file name looked up beside the manifest.
const DEFAULT_SERVICE_WORKER: &str = "sw.js";

/// Builds the report without printing it.
pub fn report(
    config: &Config,
    manifest_path: &Path,
    origin: &str,
    service_worker: Option<&Path>,
) -> Result<InstallReport> {
    let origin = Url::parse(origin).with_context(|| format!("Invalid origin URL: {origin}"))?;

    let manifest = WebAppManifest::load(manifest_path).map_err(|e| format!("{e:#}"));

    let service_worker_present = match service_worker {
        Some(path) => path.is_file(),
        None => manifest_path
            .parent()
            .map(|dir| dir.join(DEFAULT_SERVICE_WORKER))
            .is_some_and(|path| path.is_file()),
    };

    let key = config.public_key()?;

    Ok(diagnose(&DiagnoseInput {
        origin: &origin,
        manifest: manifest.as_ref().map_err(String::clone),
        service_worker_present,
        application_server_key: key.as_deref(),
        environment: Environment::current(),
    }))
}

/// Prints the report and install tips. Returns whether the app is installable.
pub fn run(
    config: &Config,
    manifest_path: &Path,
    origin: &str,
    service_worker: Option<&Path>,
) -> Result<bool> {
    let report = report(config, manifest_path, origin, service_worker)?;

    println!("PWA install diagnostics for {}", origin);
    println!("{}", report);
    println!();
    println!("Install prompt tips:");
    for tip in INSTALL_TIPS {
        println!("  - {}", tip);
    }

    Ok(report.is_installable())
}
