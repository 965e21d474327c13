//! Dashboard configuration.
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults ([`DashboardConfig::default`])
//! 2. an optional TOML file (`--config`)
//! 3. environment variables prefixed with `LADBOT_DASHBOARD_`
//! 4. command line flags ([`Overrides`])
//!
//! ```toml
//! base_url = "https://ladbot.example.org"
//! session_cookie = "session=..."
//! timeout_secs = 10
//! stats_interval_secs = 15
//! analytics_interval_secs = 30
//! health_interval_secs = 60
//! max_retries = 3
//! toast_duration_ms = 5000
//! theme = "auto"
//! log_file = "/tmp/ladbot-dashboard.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_TIMEOUT;
use crate::data::health::DEFAULT_MAX_RETRIES;
use crate::manager::PollingConfig;
use crate::notify::DEFAULT_TOAST_DURATION;

const ENV_PREFIX: &str = "LADBOT_DASHBOARD";

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}

/// Color theme selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    /// Detect from the terminal background.
    #[default]
    Auto,
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Root URL of the bot's web server.
    pub base_url: String,
    /// Raw `Cookie` header value for authenticated endpoints.
    pub session_cookie: Option<String>,
    pub timeout_secs: u64,
    pub stats_interval_secs: u64,
    pub analytics_interval_secs: u64,
    pub health_interval_secs: u64,
    /// Consecutive failures before the connection is reported unhealthy.
    pub max_retries: u32,
    pub toast_duration_ms: u64,
    pub theme: ThemeChoice,
    /// Where to write logs. Logging is off when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let polling = PollingConfig::default();
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            session_cookie: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            stats_interval_secs: polling.stats_interval.as_secs(),
            analytics_interval_secs: polling.analytics_interval.as_secs(),
            health_interval_secs: polling.health_interval.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            toast_duration_ms: DEFAULT_TOAST_DURATION.as_millis() as u64,
            theme: ThemeChoice::Auto,
            log_file: None,
        }
    }
}

/// Values given on the command line. `None` leaves the layered value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub session_cookie: Option<String>,
    pub timeout_secs: Option<u64>,
    pub stats_interval_secs: Option<u64>,
    pub analytics_interval_secs: Option<u64>,
    pub health_interval_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub theme: Option<ThemeChoice>,
    pub log_file: Option<PathBuf>,
}

impl DashboardConfig {
    /// Load defaults, then `path` (if given), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, environment())
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(env)
            .build()
            .with_context(|| match path {
                Some(path) => format!("Failed to read config file {}", path.display()),
                None => "Failed to read configuration".to_string(),
            })?;

        settings
            .try_deserialize()
            .context("Invalid dashboard configuration")
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.base_url {
            self.base_url = url;
        }
        if overrides.session_cookie.is_some() {
            self.session_cookie = overrides.session_cookie;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(secs) = overrides.stats_interval_secs {
            self.stats_interval_secs = secs;
        }
        if let Some(secs) = overrides.analytics_interval_secs {
            self.analytics_interval_secs = secs;
        }
        if let Some(secs) = overrides.health_interval_secs {
            self.health_interval_secs = secs;
        }
        if let Some(max) = overrides.max_retries {
            self.max_retries = max;
        }
        if let Some(theme) = overrides.theme {
            self.theme = theme;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
        self
    }

    /// Reject values the dashboard cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must start with http:// or https://, got {:?}", self.base_url);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        for (name, secs) in [
            ("stats_interval_secs", self.stats_interval_secs),
            ("analytics_interval_secs", self.analytics_interval_secs),
            ("health_interval_secs", self.health_interval_secs),
        ] {
            if secs == 0 {
                bail!("{} must be at least 1", name);
            }
        }
        if self.max_retries == 0 {
            bail!("max_retries must be at least 1");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn polling(&self) -> PollingConfig {
        PollingConfig {
            stats_interval: Duration::from_secs(self.stats_interval_secs),
            analytics_interval: Duration::from_secs(self.analytics_interval_secs),
            health_interval: Duration::from_secs(self.health_interval_secs),
            max_retries: self.max_retries,
        }
    }
}
