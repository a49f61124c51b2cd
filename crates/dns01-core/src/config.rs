//! Configuration types for the DNS-01 hook
//!
//! Configuration comes from one of two sources:
//!
//! - A JSON file named by `RUC_CONFIG_FILE`
//! - Environment variables (`RUC_APPID`, `RUC_APPSECRET`, `RUC_USER`,
//!   `RUC_PASS`, plus optional tuning variables)
//!
//! Either way the result is validated before any network call is made.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Default DNS-master API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.nic.ru";

/// Environment variable naming a JSON configuration file
pub const CONFIG_FILE_ENV: &str = "RUC_CONFIG_FILE";

/// Main hook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Registrar credentials and endpoint
    pub registrar: RegistrarConfig,

    /// Propagation wait settings
    #[serde(default)]
    pub propagation: PropagationConfig,
}

impl HookConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config: HookConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment-style variables
    ///
    /// `lookup` resolves a variable name to its value; the binary passes
    /// `std::env::var`. If `RUC_CONFIG_FILE` is set the file wins.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CONFIG_FILE_ENV).filter(|p| !p.is_empty()) {
            return Self::from_file(path);
        }

        let registrar = RegistrarConfig {
            app_id: required(&lookup, "RUC_APPID")?,
            app_secret: required(&lookup, "RUC_APPSECRET")?,
            user: required(&lookup, "RUC_USER")?,
            password: required(&lookup, "RUC_PASS")?,
            api_base: lookup("RUC_API_BASE").unwrap_or_else(default_api_base),
            http_timeout_secs: parsed(&lookup, "RUC_HTTP_TIMEOUT_SECS")?
                .unwrap_or_else(default_http_timeout_secs),
        };

        let defaults = PropagationConfig::default();
        let propagation = PropagationConfig {
            enabled: parsed(&lookup, "RUC_PROPAGATION_WAIT")?.unwrap_or(defaults.enabled),
            max_rounds: parsed(&lookup, "RUC_PROPAGATION_ROUNDS")?.unwrap_or(defaults.max_rounds),
            poll_interval_secs: parsed(&lookup, "RUC_PROPAGATION_INTERVAL_SECS")?
                .unwrap_or(defaults.poll_interval_secs),
        };

        let config = Self {
            registrar,
            propagation,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.registrar.validate()?;
        self.propagation.validate()?;
        Ok(())
    }
}

/// Registrar credentials and endpoint
///
/// The credential fields also accept the historical upper-case keys
/// (`RUC_APPID`, ...) so older config files keep working.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// OAuth application id
    #[serde(alias = "RUC_APPID")]
    pub app_id: String,

    /// OAuth application secret
    /// ⚠️ NEVER log this value
    #[serde(alias = "RUC_APPSECRET")]
    pub app_secret: String,

    /// Account user name
    #[serde(alias = "RUC_USER")]
    pub user: String,

    /// Account password
    /// ⚠️ NEVER log this value
    #[serde(alias = "RUC_PASS")]
    pub password: String,

    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request HTTP timeout (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl RegistrarConfig {
    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("app_id", &self.app_id),
            ("app_secret", &self.app_secret),
            ("user", &self.user),
            ("password", &self.password),
        ] {
            if value.is_empty() {
                return Err(Error::config(format!("registrar {field} cannot be empty")));
            }
        }

        if !self.api_base.starts_with("https://") && !self.api_base.starts_with("http://") {
            return Err(Error::config(format!(
                "registrar api_base must use HTTP or HTTPS scheme. Got: {}",
                self.api_base
            )));
        }

        if self.http_timeout_secs == 0 {
            return Err(Error::config("registrar http_timeout_secs must be > 0"));
        }

        Ok(())
    }

    /// HTTP request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

// Custom Debug implementation that hides the secrets
impl std::fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrarConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<REDACTED>")
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

/// Propagation wait settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Whether to wait for authoritative servers after publishing
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of query rounds
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,

    /// Delay between rounds (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl PropagationConfig {
    /// Validate the propagation configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(Error::config("propagation max_rounds must be > 0"));
        }
        Ok(())
    }

    /// Delay between rounds
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_rounds: default_max_rounds(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::config(format!("{key} is required")))
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::config(format!("{key} has an invalid value: '{raw}'"))),
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

fn default_max_rounds() -> usize {
    20
}

fn default_poll_interval_secs() -> u64 {
    5
}
