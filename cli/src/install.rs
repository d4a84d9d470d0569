//! PWA installability and push readiness diagnostics.
//!
//! Checks a web app manifest and origin against the criteria browsers use
//! before they fire `beforeinstallprompt`, and checks that the push setup
//! has a usable application server key. Each criterion becomes one
//! [`Check`] in an [`InstallReport`].

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::Path;

use crate::env::Environment;
use crate::notifications::vapid::{decode_application_server_key, KeyError};

/// Tips printed after the report; install prompts also depend on engagement.
pub const INSTALL_TIPS: &[&str] = &[
    "Visit the site multiple times over several days",
    "Spend at least 30 seconds on the page",
    "Interact with the page (click, scroll, etc.)",
    "Ensure you're on HTTPS (localhost is OK)",
    "Chrome: Check chrome://flags/#bypass-app-banner-engagement-checks",
    "DevTools: Application > Manifest > \"Add to homescreen\"",
];

/// Display modes that count as an installed-app experience.
const INSTALLABLE_DISPLAY_MODES: &[&str] = &["standalone", "fullscreen", "minimal-ui"];

/// Icon sizes browsers require in the manifest.
const REQUIRED_ICON_SIZES: &[&str] = &["192x192", "512x512"];

/// Whether a URL's host is `localhost` or a loopback address.
pub fn is_loopback_host(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}

/// A manifest icon entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    /// Icon URL.
    pub src: String,
    /// Space-separated `WxH` list, or `any`.
    #[serde(default)]
    pub sizes: Option<String>,
    /// MIME type.
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    /// `any`, `maskable`, or `monochrome`.
    #[serde(default)]
    pub purpose: Option<String>,
}

impl ManifestIcon {
    fn covers(&self, size: &str) -> bool {
        self.sizes
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .any(|s| s.eq_ignore_ascii_case(size) || s.eq_ignore_ascii_case("any"))
    }
}

/// The subset of the W3C web app manifest that affects installability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppManifest {
    /// Full application name.
    #[serde(default)]
    pub name: Option<String>,
    /// Short name for home screens.
    #[serde(default)]
    pub short_name: Option<String>,
    /// URL loaded when the app launches.
    #[serde(default)]
    pub start_url: Option<String>,
    /// Navigation scope.
    #[serde(default)]
    pub scope: Option<String>,
    /// Display mode.
    #[serde(default)]
    pub display: Option<String>,
    /// Icons.
    #[serde(default)]
    pub icons: Vec<ManifestIcon>,
    /// When `true`, browsers suggest a native app instead of installing.
    #[serde(default)]
    pub prefer_related_applications: Option<bool>,
    /// Theme color.
    #[serde(default)]
    pub theme_color: Option<String>,
    /// Splash background color.
    #[serde(default)]
    pub background_color: Option<String>,
}

impl WebAppManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Manifest is not valid JSON")
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Criterion met.
    Pass,
    /// Not blocking, but worth fixing.
    Warn,
    /// Blocks installation or push.
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Warn => write!(f, "WARN"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// One diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    /// Short criterion name.
    pub name: &'static str,
    /// Result.
    pub status: CheckStatus,
    /// Human-readable explanation.
    pub detail: String,
}

impl Check {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

/// Everything [`diagnose`] looks at.
#[derive(Debug, Clone)]
pub struct DiagnoseInput<'a> {
    /// Origin the app is served from.
    pub origin: &'a Url,
    /// Parsed manifest, or the reason it could not be loaded.
    pub manifest: Result<&'a WebAppManifest, String>,
    /// Whether a service worker script was found.
    pub service_worker_present: bool,
    /// Configured application server key, if any.
    pub application_server_key: Option<&'a str>,
    /// Runtime environment; development relaxes the secure-context check.
    pub environment: Environment,
}

/// Collected diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    /// Individual checks, in evaluation order.
    pub checks: Vec<Check>,
}

impl InstallReport {
    /// True when nothing failed.
    pub fn is_installable(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    /// Look up a check by name.
    pub fn check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Count of checks with the given status.
    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "[{}] {:<22} {}", check.status, check.name, check.detail)?;
        }
        write!(
            f,
            "{} passed, {} warnings, {} failed",
            self.count(CheckStatus::Pass),
            self.count(CheckStatus::Warn),
            self.count(CheckStatus::Fail)
        )
    }
}

fn secure_context(origin: &Url, environment: Environment) -> Check {
    const NAME: &str = "secure context";
    match origin.scheme() {
        "https" => Check::new(NAME, CheckStatus::Pass, format!("{} uses https", origin)),
        "http" if is_loopback_host(origin) => {
            Check::new(NAME, CheckStatus::Pass, "http on localhost is treated as secure")
        }
        "http" if environment.is_development() => Check::new(
            NAME,
            CheckStatus::Warn,
            "plain http outside localhost; browsers will not offer install",
        ),
        scheme => Check::new(
            NAME,
            CheckStatus::Fail,
            format!("{scheme}:// is not a secure context; serve over https"),
        ),
    }
}

fn manifest_checks(manifest: &WebAppManifest, checks: &mut Vec<Check>) {
    let has_text = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    checks.push(if has_text(&manifest.name) || has_text(&manifest.short_name) {
        Check::new(
            "manifest name",
            CheckStatus::Pass,
            manifest
                .name
                .clone()
                .or_else(|| manifest.short_name.clone())
                .unwrap_or_default(),
        )
    } else {
        Check::new("manifest name", CheckStatus::Fail, "set `name` or `short_name`")
    });

    checks.push(if has_text(&manifest.start_url) {
        Check::new(
            "start url",
            CheckStatus::Pass,
            manifest.start_url.clone().unwrap_or_default(),
        )
    } else {
        Check::new("start url", CheckStatus::Fail, "set `start_url`")
    });

    checks.push(match manifest.display.as_deref() {
        Some(mode) if INSTALLABLE_DISPLAY_MODES.contains(&mode) => {
            Check::new("display mode", CheckStatus::Pass, mode)
        }
        Some(mode) => Check::new(
            "display mode",
            CheckStatus::Fail,
            format!("`{mode}` is not one of {}", INSTALLABLE_DISPLAY_MODES.join(", ")),
        ),
        None => Check::new(
            "display mode",
            CheckStatus::Fail,
            "set `display` to standalone, fullscreen, or minimal-ui",
        ),
    });

    let missing: Vec<&str> = REQUIRED_ICON_SIZES
        .iter()
        .copied()
        .filter(|size| !manifest.icons.iter().any(|icon| icon.covers(size)))
        .collect();
    checks.push(if missing.is_empty() {
        Check::new(
            "icons",
            CheckStatus::Pass,
            format!("{} icon(s) declared", manifest.icons.len()),
        )
    } else {
        Check::new(
            "icons",
            CheckStatus::Fail,
            format!("missing icon size(s): {}", missing.join(", ")),
        )
    });

    checks.push(if manifest.prefer_related_applications == Some(true) {
        Check::new(
            "related applications",
            CheckStatus::Fail,
            "`prefer_related_applications` is true; browsers will suggest the native app",
        )
    } else {
        Check::new("related applications", CheckStatus::Pass, "web app preferred")
    });
}

fn push_readiness(key: Option<&str>) -> Check {
    const NAME: &str = "push key";
    match key.map(decode_application_server_key) {
        None | Some(Err(KeyError::Empty)) => Check::new(
            NAME,
            CheckStatus::Warn,
            "no application server key configured; push subscription unavailable",
        ),
        Some(Ok(bytes)) => Check::new(
            NAME,
            CheckStatus::Pass,
            format!("{}-byte P-256 application server key", bytes.len()),
        ),
        Some(Err(e)) => Check::new(NAME, CheckStatus::Fail, format!("subscription setup would fail: {e}")),
    }
}

/// Evaluate every installability and push readiness criterion.
pub fn diagnose(input: &DiagnoseInput<'_>) -> InstallReport {
    let mut checks = vec![secure_context(input.origin, input.environment)];

    match &input.manifest {
        Ok(manifest) => {
            checks.push(Check::new("manifest", CheckStatus::Pass, "found and parsed"));
            manifest_checks(manifest, &mut checks);
        }
        Err(reason) => checks.push(Check::new("manifest", CheckStatus::Fail, reason.clone())),
    }

    checks.push(if input.service_worker_present {
        Check::new("service worker", CheckStatus::Pass, "script present")
    } else {
        Check::new(
            "service worker",
            CheckStatus::Fail,
            "no service worker script; install and push both need one",
        )
    });

    checks.push(push_readiness(input.application_server_key));

    InstallReport { checks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::vapid::VapidKeys;

    const GOOD_MANIFEST: &str = r#"{
        "name": "Push Demo",
        "short_name": "Demo",
        "start_url": "/",
        "display": "standalone",
        "icons": [
            { "src": "/icon-192x192.png", "sizes": "192x192", "type": "image/png" },
            { "src": "/icon-512x512.png", "sizes": "512x512", "type": "image/png" }
        ]
    }"#;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("url")
    }

    fn report_for(origin: &Url, manifest: &WebAppManifest, key: Option<&str>) -> InstallReport {
        diagnose(&DiagnoseInput {
            origin,
            manifest: Ok(manifest),
            service_worker_present: true,
            application_server_key: key,
            environment: Environment::Production,
        })
    }

    #[test]
    fn test_complete_setup_is_installable() {
        let manifest = WebAppManifest::from_json(GOOD_MANIFEST).expect("parse");
        let keys = VapidKeys::generate();
        let report = report_for(
            &url("https://app.example.com"),
            &manifest,
            Some(keys.public_key_base64url()),
        );

        assert!(report.is_installable(), "{report}");
        assert_eq!(report.count(CheckStatus::Fail), 0);
        assert_eq!(report.count(CheckStatus::Warn), 0);
    }

    #[test]
    fn test_is_loopback_host() {
        assert!(is_loopback_host(&url("http://localhost:3000")));
        assert!(is_loopback_host(&url("http://127.0.0.1:3000")));
        assert!(is_loopback_host(&url("http://[::1]:3000")));
        assert!(!is_loopback_host(&url("http://192.168.1.10")));
        assert!(!is_loopback_host(&url("https://example.com")));
    }

    #[test]
    fn test_secure_context_rules() {
        let manifest = WebAppManifest::from_json(GOOD_MANIFEST).expect("parse");

        let local = report_for(&url("http://localhost:3000"), &manifest, None);
        assert_eq!(local.check("secure context").map(|c| c.status), Some(CheckStatus::Pass));

        let lan = report_for(&url("http://192.168.1.10:3000"), &manifest, None);
        assert_eq!(lan.check("secure context").map(|c| c.status), Some(CheckStatus::Fail));
        assert!(!lan.is_installable());

        let dev = diagnose(&DiagnoseInput {
            origin: &url("http://192.168.1.10:3000"),
            manifest: Ok(&manifest),
            service_worker_present: true,
            application_server_key: None,
            environment: Environment::Development,
        });
        assert_eq!(dev.check("secure context").map(|c| c.status), Some(CheckStatus::Warn));
    }

    #[test]
    fn test_manifest_gaps_fail() {
        let manifest = WebAppManifest::from_json(
            r#"{ "display": "browser", "icons": [{ "src": "/a.png", "sizes": "192x192" }] }"#,
        )
        .expect("parse");
        let report = report_for(&url("https://app.example.com"), &manifest, None);

        let status = |name| report.check(name).map(|c| c.status);
        assert_eq!(status("manifest name"), Some(CheckStatus::Fail));
        assert_eq!(status("start url"), Some(CheckStatus::Fail));
        assert_eq!(status("display mode"), Some(CheckStatus::Fail));
        assert_eq!(status("icons"), Some(CheckStatus::Fail));
        assert!(report
            .check("icons")
            .is_some_and(|c| c.detail.contains("512x512") && !c.detail.contains("192x192")));
    }

    #[test]
    fn test_any_sized_icon_covers_both_sizes() {
        let manifest = WebAppManifest::from_json(
            r#"{ "name": "x", "start_url": "/", "display": "minimal-ui",
                 "icons": [{ "src": "/icon.svg", "sizes": "any", "type": "image/svg+xml" }] }"#,
        )
        .expect("parse");
        let report = report_for(&url("https://app.example.com"), &manifest, None);
        assert_eq!(report.check("icons").map(|c| c.status), Some(CheckStatus::Pass));
    }

    #[test]
    fn test_prefer_related_applications_fails() {
        let mut manifest = WebAppManifest::from_json(GOOD_MANIFEST).expect("parse");
        manifest.prefer_related_applications = Some(true);
        let report = report_for(&url("https://app.example.com"), &manifest, None);
        assert!(!report.is_installable());
    }

    #[test]
    fn test_missing_manifest_and_worker() {
        let report = diagnose(&DiagnoseInput {
            origin: &url("https://app.example.com"),
            manifest: Err("manifest.json not found".to_string()),
            service_worker_present: false,
            application_server_key: None,
            environment: Environment::Production,
        });
        assert_eq!(report.check("manifest").map(|c| c.status), Some(CheckStatus::Fail));
        assert_eq!(report.check("service worker").map(|c| c.status), Some(CheckStatus::Fail));
        assert!(report.check("display mode").is_none());
    }

    #[test]
    fn test_push_key_readiness() {
        let manifest = WebAppManifest::from_json(GOOD_MANIFEST).expect("parse");
        let origin = url("https://app.example.com");

        let missing = report_for(&origin, &manifest, None);
        assert_eq!(missing.check("push key").map(|c| c.status), Some(CheckStatus::Warn));
        assert!(missing.is_installable(), "missing push key does not block install");

        let empty = report_for(&origin, &manifest, Some(""));
        assert_eq!(empty.check("push key").map(|c| c.status), Some(CheckStatus::Warn));

        let malformed = report_for(&origin, &manifest, Some("abc!def"));
        assert_eq!(malformed.check("push key").map(|c| c.status), Some(CheckStatus::Fail));
    }

    #[test]
    fn test_report_display_has_summary() {
        let manifest = WebAppManifest::from_json(GOOD_MANIFEST).expect("parse");
        let report = report_for(&url("https://app.example.com"), &manifest, None);
        let text = report.to_string();
        assert!(text.contains("[PASS] secure context"));
        assert!(text.ends_with("8 passed, 1 warnings, 0 failed"));
    }
}
