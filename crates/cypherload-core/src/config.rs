use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection parameters for the target database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
}

/// Upload job behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Abort the job after this many consecutive failed batches; 0 keeps
    /// the fail-soft behavior of continuing through every batch.
    #[serde(default)]
    pub max_consecutive_batch_failures: u64,
    #[serde(default)]
    pub clear_before_upload: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_uri() -> String {
    "127.0.0.1:7687".into()
}
fn default_username() -> String {
    "neo4j".into()
}
fn default_database() -> String {
    "neo4j".into()
}
fn default_max_connections() -> usize {
    16
}
fn default_connect_timeout_secs() -> u64 {
    constants::CONNECT_TIMEOUT_SECS
}
fn default_probe_timeout_secs() -> u64 {
    constants::PROBE_TIMEOUT_SECS
}
fn default_health_check_interval_secs() -> u64 {
    constants::HEALTH_CHECK_INTERVAL_SECS
}
fn default_batch_size() -> usize {
    constants::DEFAULT_BATCH_SIZE
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            username: default_username(),
            password: String::new(),
            database: default_database(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            health_check_interval_secs: default_health_check_interval_secs(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_consecutive_batch_failures: 0,
            clear_before_upload: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration with layered precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Explicit config file (from `--config`)
    /// 3. Global config: `~/.cypherload/config.toml`
    /// 4. Built-in defaults (lowest priority)
    ///
    /// Only fields explicitly set in a higher-priority layer override
    /// lower layers.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_file(None)
    }

    /// Load configuration with an explicit config file path.
    pub fn load_with_file(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        // Start with an empty TOML value, then layer each config file on
        // top, so only explicitly-set fields override previous layers.
        let mut merged = toml::Value::Table(toml::map::Map::new());

        if let Some(home) = dirs::home_dir() {
            let global_path = home.join(constants::DEFAULT_CONFIG_DIR).join("config.toml");
            if global_path.exists() {
                let raw = load_toml_value(&global_path)?;
                merge_toml_values(&mut merged, &raw);
            }
        }

        if let Some(cf) = config_file {
            if !cf.exists() {
                return Err(ConfigError::NotFound {
                    path: cf.display().to_string(),
                });
            }
            let raw = load_toml_value(cf)?;
            merge_toml_values(&mut merged, &raw);
        }

        // Deserialize the merged value (remaining fields fill from defaults).
        let config_str =
            toml::to_string(&merged).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let mut config: Config =
            toml::from_str(&config_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Reject values no layer is allowed to produce. Runs as part of
    /// loading; callers that mutate the config afterwards (CLI overrides)
    /// should re-run it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.batch_size".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.neo4j.uri.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "neo4j.uri".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Load a TOML file as a raw `toml::Value` (preserving only explicitly-set
/// fields).
fn load_toml_value(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    content
        .parse::<toml::Value>()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Deep-merge `overlay` into `base`. Only keys present in `overlay` are
/// written.
fn merge_toml_values(base: &mut toml::Value, overlay: &toml::Value) {
    if let (toml::Value::Table(base_map), toml::Value::Table(overlay_map)) = (base, overlay) {
        for (key, overlay_val) in overlay_map {
            if let Some(base_val) = base_map.get_mut(key) {
                if base_val.is_table() && overlay_val.is_table() {
                    merge_toml_values(base_val, overlay_val);
                } else {
                    *base_val = overlay_val.clone();
                }
            } else {
                base_map.insert(key.clone(), overlay_val.clone());
            }
        }
    }
}

/// Apply environment variable overrides.
///
/// The conventional driver variables (`NEO4J_URI`, `NEO4J_USERNAME`,
/// `NEO4J_PASSWORD`, `NEO4J_DATABASE`) are read first; the
/// `CYPHERLOAD_<SECTION>_<KEY>` forms take precedence over them.
fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("NEO4J_URI") {
        config.neo4j.uri = v;
    }
    if let Some(v) = var("NEO4J_USERNAME") {
        config.neo4j.username = v;
    }
    if let Some(v) = var("NEO4J_PASSWORD") {
        config.neo4j.password = v;
    }
    if let Some(v) = var("NEO4J_DATABASE") {
        config.neo4j.database = v;
    }

    if let Some(v) = var("CYPHERLOAD_NEO4J_URI") {
        config.neo4j.uri = v;
    }
    if let Some(v) = var("CYPHERLOAD_NEO4J_USERNAME") {
        config.neo4j.username = v;
    }
    if let Some(v) = var("CYPHERLOAD_NEO4J_PASSWORD") {
        config.neo4j.password = v;
    }
    if let Some(v) = var("CYPHERLOAD_NEO4J_DATABASE") {
        config.neo4j.database = v;
    }
    if let Some(v) = var("CYPHERLOAD_NEO4J_MAX_CONNECTIONS")
        && let Ok(n) = v.parse()
    {
        config.neo4j.max_connections = n;
    }
    if let Some(v) = var("CYPHERLOAD_NEO4J_HEALTH_CHECK_INTERVAL_SECS")
        && let Ok(n) = v.parse()
    {
        config.neo4j.health_check_interval_secs = n;
    }
    if let Some(v) = var("CYPHERLOAD_UPLOAD_BATCH_SIZE")
        && let Ok(n) = v.parse()
    {
        config.upload.batch_size = n;
    }
    if let Some(v) = var("CYPHERLOAD_UPLOAD_MAX_CONSECUTIVE_BATCH_FAILURES")
        && let Ok(n) = v.parse()
    {
        config.upload.max_consecutive_batch_failures = n;
    }
    if let Some(v) = var("CYPHERLOAD_LOGGING_LEVEL") {
        config.logging.level = v;
    }
}
