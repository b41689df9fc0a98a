use crate::core::{Result, SeedError};
use crate::inspect::TableQuery;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default time a statement waits on a locked database
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern is valid"));

/// Returns `true` if `name` can be interpolated into SQL as a bare identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub inspect: InspectConfig,
}

/// Where the database lives and how connections are set up.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Database file path or SQLite URI
    #[serde(default)]
    pub database: String,
    /// Per-statement wait on a locked database, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Pragmas applied on every read-write connection, in name order
    #[serde(default, deserialize_with = "deserialize_pragmas")]
    pub pragmas: BTreeMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            database: String::new(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            pragmas: BTreeMap::new(),
        }
    }
}

impl ConnectionConfig {
    pub fn new(database: impl Into<String>) -> Self {
        ConnectionConfig {
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Seeding defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    /// Script used when none is given on the command line
    pub script: Option<PathBuf>,
}

/// Tables checked by `inspect`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectConfig {
    #[serde(default)]
    pub tables: Vec<TableQuery>,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Accepts strings, integers, floats and booleans as pragma values.
fn deserialize_pragmas<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, toml::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, value)| -> std::result::Result<(String, String), D::Error> {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(true) => "ON".to_string(),
                toml::Value::Boolean(false) => "OFF".to_string(),
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "pragma '{}' has unsupported value {}",
                        name, other
                    )))
                }
            };
            Ok((name, value))
        })
        .collect()
}

impl Config {
    /// Parses configuration from TOML text without validating it.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads configuration from an explicit path, or from the default
    /// location when `path` is `None`.
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => load_config(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => load_config(&path),
                _ => {
                    debug!("No configuration file found, using defaults");
                    Ok(Config::default())
                }
            },
        }
    }

    /// Checks every recognized option. Call after command-line overrides
    /// have been applied.
    pub fn validate(&self) -> Result<()> {
        if self.connection.database.trim().is_empty() {
            return Err(SeedError::Config(
                "no database configured; set connection.database or pass --database".to_string(),
            ));
        }
        for name in self.connection.pragmas.keys() {
            if !is_identifier(name) {
                return Err(SeedError::Config(format!("invalid pragma name '{}'", name)));
            }
        }
        for table in &self.inspect.tables {
            table.validate()?;
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file at the given path.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading configuration");
    let content = fs::read_to_string(path)
        .map_err(|e| SeedError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
    Config::from_toml(&content)
}

/// `<config_dir>/sqlseed/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqlseed").join("config.toml"))
}
