use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregation::DEFAULT_REPORTING_OFFSET_MINUTES;
use crate::monitoring::prober::PROBE_TIMEOUT_SECONDS;
use crate::monitoring::scheduler::DEFAULT_CHECK_INTERVAL_SECONDS;
use crate::monitoring::tracker::DEFAULT_ALERT_THRESHOLD;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFailed(#[from] std::io::Error),
    #[error("failed to write default config file")]
    WriteFailed,
    #[error("failed to parse config file: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("no config path available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub database: Database,
    pub monitor: Monitor,
    pub alerts: Alerts,
    pub reporting: Reporting,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,

    /// Shared secret for the cycle-trigger and scheduler routes. Requests
    /// without it are rejected; leaving it unset disables those routes.
    pub cron_secret: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    pub check_interval_seconds: u64,
    pub probe_timeout_seconds: u64,

    /// Consecutive failures before a downtime alert fires.
    pub alert_threshold: u32,
    pub probe_concurrency: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Alerts {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Reporting {
    /// Fixed reporting-timezone offset in minutes east of UTC. Calendar-day
    /// boundaries for aggregation are defined in this timezone.
    pub utc_offset_minutes: i32,
}

impl Default for Server {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 8080, cron_secret: None }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self { path: "pulsewatch.db".into() }
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            check_interval_seconds: DEFAULT_CHECK_INTERVAL_SECONDS,
            probe_timeout_seconds: PROBE_TIMEOUT_SECONDS,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            probe_concurrency: 8,
        }
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Self { webhook_url: None }
    }
}

impl Default for Reporting {
    fn default() -> Self {
        Self { utc_offset_minutes: DEFAULT_REPORTING_OFFSET_MINUTES }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: Server::default(),
            database: Database::default(),
            monitor: Monitor::default(),
            alerts: Alerts::default(),
            reporting: Reporting::default(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current Internal Configuration State:")?;
        writeln!(f, "  Server")?;
        writeln!(f, "    Bind Address: {}", self.server.bind)?;
        writeln!(f, "    Port: {}", self.server.port)?;
        writeln!(f, "    Cron Secret: {}", if self.server.cron_secret.is_some() { "set" } else { "unset" })?;
        writeln!(f, "  Database")?;
        writeln!(f, "    Path: {}", self.database.path)?;
        writeln!(f, "  Monitor")?;
        writeln!(f, "    Check Interval: {}s", self.monitor.check_interval_seconds)?;
        writeln!(f, "    Probe Timeout: {}s", self.monitor.probe_timeout_seconds)?;
        writeln!(f, "    Alert Threshold: {} consecutive failures", self.monitor.alert_threshold)?;
        writeln!(f, "    Probe Concurrency: {}", self.monitor.probe_concurrency)?;
        writeln!(f, "  Alerts")?;
        writeln!(f, "    Webhook: {}", if self.alerts.webhook_url.is_some() { "configured" } else { "none" })?;
        writeln!(f, "  Reporting")?;
        writeln!(f, "    UTC Offset: {} minutes", self.reporting.utc_offset_minutes)?;
        Ok(())
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/pulsewatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("pulsewatch/config.toml"))
}

impl Config {
    /// Load the config from the given path, or the default XDG location.
    /// A default config file is written on first run.
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_to(&config_path)?;
            Ok(config)
        }
    }

    fn write_to(&self, config_path: &path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::WriteFailed)?;
        }
        let rendered = toml::to_string_pretty(self).map_err(|_| ConfigError::WriteFailed)?;
        fs::write(config_path, rendered).map_err(|_| ConfigError::WriteFailed)?;
        Ok(())
    }
}
