//! Command line and environment configuration. Flags are parsed once by clap,
//! validated, and frozen into a [`Config`] that is handed to the scheduler and
//! the pipeline.

mod duration;

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use thiserror::Error;

pub use duration::parse_duration;

pub const BIN_NAME: &str = "oui_textfile_collector";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_DATE: &str = env!("OUI_TEXTFILE_COLLECTOR_BUILD_DATE");

/// IEEE MA-L assignments, one row per OUI.
pub const IEEE_OUI_CSV_URL: &str = "https://standards-oui.ieee.org/oui/oui.csv";

pub const DEFAULT_REFRESH_INTERVAL: &str = "168h";
pub const DEFAULT_OUTPUT_FILE: &str = "/var/lib/node_exporter/textfile/oui.prom";
pub const DEFAULT_METRIC_NAME: &str = "mac_oui_info";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    #[error("refresh interval must be greater than zero, got {0:?}")]
    NonPositiveDuration(String),

    #[error("invalid metric name {0:?}")]
    InvalidMetricName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = BIN_NAME)]
#[command(about = "Publish the IEEE OUI registry as a node_exporter textfile metric")]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Log level: debug, info, warn, error
    #[arg(
        long,
        value_enum,
        default_value_t = LogLevel::Info,
        env = "OUI_TEXTFILE_COLLECTOR_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Interval at which to refresh the OUI database. Valid time units are "ns", "us", "ms", "s", "m", "h"
    #[arg(
        long,
        default_value = DEFAULT_REFRESH_INTERVAL,
        env = "OUI_TEXTFILE_COLLECTOR_REFRESH_INTERVAL"
    )]
    pub refresh_interval: String,

    /// Path to the file where metrics should be written
    #[arg(
        long,
        default_value = DEFAULT_OUTPUT_FILE,
        env = "OUI_TEXTFILE_COLLECTOR_OUTPUT_FILE"
    )]
    pub output_file: PathBuf,

    /// Prometheus metric name
    #[arg(
        long,
        default_value = DEFAULT_METRIC_NAME,
        env = "OUI_TEXTFILE_COLLECTOR_METRIC_NAME"
    )]
    pub metric_name: String,

    /// Location of the OUI registry CSV
    #[arg(
        long,
        default_value = IEEE_OUI_CSV_URL,
        env = "OUI_TEXTFILE_COLLECTOR_REGISTRY_URL"
    )]
    pub registry_url: String,

    /// Print version
    #[arg(long)]
    pub version: bool,
}

/// Validated runtime configuration shared by the scheduler and the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub refresh_interval: Duration,
    pub output_file: PathBuf,
    pub metric_name: String,
    pub registry_url: String,
    pub http_timeout: Duration,
    pub user_agent: String,
    /// Directory the registry CSV is downloaded into.
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(168 * 60 * 60),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            registry_url: IEEE_OUI_CSV_URL.to_string(),
            http_timeout: HTTP_TIMEOUT,
            user_agent: user_agent(),
            download_dir: std::env::temp_dir(),
        }
    }
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let refresh_interval = parse_duration(&cli.refresh_interval)?;
        if refresh_interval.is_zero() {
            return Err(ConfigError::NonPositiveDuration(
                cli.refresh_interval.clone(),
            ));
        }

        if !is_valid_metric_name(&cli.metric_name) {
            return Err(ConfigError::InvalidMetricName(cli.metric_name.clone()));
        }

        Ok(Self {
            refresh_interval,
            output_file: cli.output_file.clone(),
            metric_name: cli.metric_name.clone(),
            registry_url: cli.registry_url.clone(),
            ..Self::default()
        })
    }

    /// Sibling of the output file that metrics are staged in before the rename.
    pub fn temp_output_path(&self) -> PathBuf {
        let mut path = OsString::from(self.output_file.as_os_str());
        path.push(".tmp");
        PathBuf::from(path)
    }
}

pub fn version_line() -> String {
    format!("{} v{} built on {}", BIN_NAME, VERSION, BUILD_DATE)
}

pub fn user_agent() -> String {
    format!("{}/{}", BIN_NAME, VERSION)
}

/// Prometheus metric names: `[a-zA-Z_:][a-zA-Z0-9_:]*`
fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
