//! Runtime environment detection.
//!
//! Single source of truth for the runtime environment, read from the
//! `PWA_PUSH_ENV` environment variable.
//!
//! Set `PWA_PUSH_ENV` to one of:
//! - `test` - Test mode (config and data live under the repo's `tmp/`)
//! - `development` or `dev` - Development mode (plain-HTTP origins reported as warnings)
//! - (anything else or unset) - Production mode

use crate::constants::ENV_RUNTIME;

/// Runtime environment for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment (default).
    Production,
    /// Development environment.
    Development,
    /// Test environment.
    Test,
}

impl Environment {
    /// Detect current environment from `PWA_PUSH_ENV`.
    #[must_use]
    pub fn current() -> Self {
        Self::parse(std::env::var(ENV_RUNTIME).ok().as_deref())
    }

    /// Map a raw `PWA_PUSH_ENV` value onto an environment.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("test") => Self::Test,
            Some("development") | Some("dev") => Self::Development,
            _ => Self::Production,
        }
    }

    /// Returns `true` if this is the test environment.
    #[must_use]
    pub fn is_test(self) -> bool {
        self == Self::Test
    }

    /// Returns `true` if this is the development environment.
    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    /// Returns `true` if this is the production environment.
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Convenience check for test mode.
#[must_use]
pub fn is_test_mode() -> bool {
    Environment::current().is_test()
}
