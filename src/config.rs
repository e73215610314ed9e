use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tracing::trace;

use crate::util::{get_db_password, get_sensor_secret};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub sensor: SensorConfig,
    pub database: DatabaseConfig,
    pub interlibrary: InterlibraryConfig,
    pub files: FilesConfig,

    /// Outbound HTTP settings (optional - defaults apply)
    #[serde(default)]
    pub http: HttpConfig,
}

/// Door-traffic sensor API
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SensorConfig {
    /// Client-credentials token endpoint
    pub auth_url: String,
    /// Data query endpoint
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Name of the sensor whose inbound count is the door count
    #[serde(default = "default_entity")]
    pub entity: String,
}

/// Circulation database (PostgreSQL)
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Barcode prefix identifying patrons of the sub-branch
    #[serde(default = "default_barcode_prefix")]
    pub branch_barcode_prefix: String,
}

/// Interlibrary loan statistics page
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InterlibraryConfig {
    pub url: String,
    /// Library code used to find our row and column in the table
    pub code: String,
    /// Upper bound for each linear table scan
    #[serde(default = "default_max_scan")]
    pub max_scan: usize,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FilesConfig {
    pub ledger: PathBuf,
    pub backup: PathBuf,
    /// Append to the ledger; when false the record is only previewed
    #[serde(default)]
    pub write: bool,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the HTTP client shared by the web adapters
    pub fn client(&self) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .build()
            .context("failed to build HTTP client")
    }
}

fn default_entity() -> String {
    String::from("Main Entrance")
}

fn default_db_port() -> u16 {
    5432
}

fn default_barcode_prefix() -> String {
    String::from("25149")
}

fn default_max_scan() -> usize {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Replace secrets with values from the environment, when present
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(secret) = get_sensor_secret() {
            self.sensor.client_secret = secret;
        }
        if let Some(password) = get_db_password() {
            self.database.password = password;
        }
        self
    }
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    toml::from_str(content).context("invalid configuration file provided")
}

pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    parse_config(&file_content)
        .map(Config::with_env_overrides)
        .inspect(|config| trace!("loaded config for ledger {}", config.files.ledger.display()))
}
