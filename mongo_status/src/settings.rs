use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::checks::dns::DEFAULT_SRV_SERVICE;
use crate::db::ConnectionConfig;
use crate::log_buffer::DEFAULT_CAPACITY;

/// Prefix for environment overrides, e.g. `MONGO_STATUS_TIMEOUT_MS=5000`
pub const ENV_PREFIX: &str = "MONGO_STATUS";

/// How much detail a report carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTier {
    /// Probe result only
    Basic,
    /// Adds the connection string summary and runtime facts
    Detailed,
    /// Adds DNS diagnostics, failure traces and the recent log
    #[default]
    Diagnostic,
}

impl ReportTier {
    pub fn includes_environment(&self) -> bool {
        !matches!(self, ReportTier::Basic)
    }

    pub fn includes_diagnostics(&self) -> bool {
        matches!(self, ReportTier::Diagnostic)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Listen address for the http server
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Environment variable holding the connection string
    #[serde(default = "default_uri_env")]
    pub uri_env: String,
    /// Timeout in milliseconds for server selection, connect and each operation
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// CA bundle for verifying the server certificate
    #[serde(default)]
    pub tls_ca_file: Option<PathBuf>,
    /// Application name sent in the driver handshake
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Dashboard auto refresh interval in seconds
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Run a probe cycle in the background at this interval (seconds)
    #[serde(default)]
    pub background_interval_secs: Option<u64>,
    #[serde(default)]
    pub tier: ReportTier,
    /// Number of probe events kept in memory
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Number of probe events included in a diagnostic report
    #[serde(default = "default_log_tail")]
    pub log_tail: usize,
    /// SRV service/protocol label queried for `mongodb+srv` hosts
    #[serde(default = "default_srv_service")]
    pub srv_service: String,
    /// Deployment platform variables shown (read only) in the report
    #[serde(default = "default_platform_env")]
    pub platform_env: Vec<String>,
    /// Dashboard page title
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_listen() -> String {
    "0.0.0.0:8050".to_string()
}

fn default_uri_env() -> String {
    "MONGODB_URI".to_string()
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_app_name() -> String {
    "mongo-status".to_string()
}

fn default_refresh_secs() -> u64 {
    10
}

fn default_log_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_log_tail() -> usize {
    50
}

fn default_srv_service() -> String {
    DEFAULT_SRV_SERVICE.to_string()
}

fn default_platform_env() -> Vec<String> {
    [
        "RENDER",
        "RENDER_SERVICE_NAME",
        "RENDER_INSTANCE_ID",
        "RENDER_GIT_COMMIT",
        "RENDER_REGION",
        "HOSTNAME",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_title() -> String {
    "MongoDB Atlas Connection Status".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            uri_env: default_uri_env(),
            timeout_ms: default_timeout_ms(),
            tls_ca_file: None,
            app_name: default_app_name(),
            refresh_secs: default_refresh_secs(),
            background_interval_secs: None,
            tier: ReportTier::default(),
            log_capacity: default_log_capacity(),
            log_tail: default_log_tail(),
            srv_service: default_srv_service(),
            platform_env: default_platform_env(),
            title: default_title(),
        }
    }
}

impl Settings {
    /// Load from an optional YAML file, then apply `MONGO_STATUS_*` overrides
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// [Settings::load] with overrides taken from `env` instead of the process
    /// environment when given
    fn load_from(path: &Path, env: Option<Map<String, String>>) -> Result<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("platform_env")
                    .source(env),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connection_config(&self, uri: Option<String>) -> ConnectionConfig {
        ConnectionConfig {
            uri,
            timeout: self.timeout(),
            tls_ca_file: self.tls_ca_file.clone(),
            app_name: self.app_name.clone(),
        }
    }
}
