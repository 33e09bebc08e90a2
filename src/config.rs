//! Centralized configuration management for litfetch

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::target::DEFAULT_BASE_URI;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin and path prefix every target URI starts with
    pub base_uri: String,
    /// Tabular input file (`.csv` or `.xlsx`)
    pub input_path: PathBuf,
    /// Directory downloaded texts are written to
    pub output_dir: PathBuf,
    /// Where the error report is written when any row fails
    pub errors_path: PathBuf,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds; `None` waits indefinitely
    pub timeout_seconds: Option<u64>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            input_path: "in.csv".into(),
            output_dir: "out".into(),
            errors_path: "errors.json".into(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let http = HttpConfig {
            timeout_seconds: parse_env_var("LITFETCH_HTTP_TIMEOUT_SECONDS")?,
            user_agent: std::env::var("LITFETCH_USER_AGENT").unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            base_uri: std::env::var("LITFETCH_BASE_URI").unwrap_or(defaults.base_uri),
            input_path: env_path("LITFETCH_INPUT").unwrap_or(defaults.input_path),
            output_dir: env_path("LITFETCH_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            errors_path: env_path("LITFETCH_ERRORS_PATH").unwrap_or(defaults.errors_path),
            http,
        })
    }

    /// Validate configuration and prepare the output directory
    pub fn validate(&self) -> Result<()> {
        if self.base_uri.trim().is_empty() {
            return Err(anyhow::anyhow!("Base URI must not be empty"));
        }

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Cannot create output directory: {}", self.output_dir.display())
        })?;

        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("litfetch/{}", env!("CARGO_PKG_VERSION"))
}

fn env_path(var_name: &str) -> Option<PathBuf> {
    std::env::var_os(var_name).map(PathBuf::from)
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
