//! Application configuration structs
//!
//! Loads configuration from environment variables (and an optional `.env` file).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    pub listing: ListingConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Credentials and connection settings for the forum database
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Bounds applied to list pagination at the boundary
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_list_limit")]
    pub default_limit: u64,
    #[serde(default = "default_max_list_limit")]
    pub max_limit: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_list_limit(),
            max_limit: default_max_list_limit(),
        }
    }
}

impl ListingConfig {
    /// Clamp caller-supplied pagination: negative starts become 0, limits
    /// outside `1..=max_limit` become `max_limit`.
    #[must_use]
    pub fn clamp(&self, start: Option<i64>, limit: Option<i64>) -> (u64, u64) {
        let start = start.map_or(0, |s| s.max(0) as u64);
        let limit = match limit {
            None => self.default_limit,
            Some(l) if l < 1 || l as u64 > self.max_limit => self.max_limit,
            Some(l) => l as u64,
        };
        (start, limit)
    }
}

// Default value functions
fn default_app_name() -> String {
    "forum-data".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_list_limit() -> u64 {
    50
}

fn default_max_list_limit() -> u64 {
    1000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::MissingVar(key));

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: match lookup("APP_ENV") {
                    Some(s) => Environment::parse(&s)
                        .ok_or(ConfigError::InvalidValue("APP_ENV", s))?,
                    None => Environment::default(),
                },
            },
            database: DatabaseConfig {
                host: lookup("FORUM_DB_HOST").unwrap_or_else(default_db_host),
                port: parsed(&lookup, "FORUM_DB_PORT")?.unwrap_or_else(default_db_port),
                username: required("FORUM_DB_USER")?,
                password: lookup("FORUM_DB_PASSWORD").unwrap_or_default(),
                database: required("FORUM_DB_NAME")?,
                connect_timeout_secs: parsed(&lookup, "FORUM_DB_CONNECT_TIMEOUT_SECS")?
                    .unwrap_or_else(default_connect_timeout_secs),
            },
            listing: ListingConfig {
                default_limit: parsed(&lookup, "FORUM_LIST_DEFAULT_LIMIT")?
                    .unwrap_or_else(default_list_limit),
                max_limit: parsed(&lookup, "FORUM_LIST_MAX_LIMIT")?
                    .unwrap_or_else(default_max_list_limit),
            },
        })
    }
}

fn parsed<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    lookup(key)
        .map(|raw| raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key, raw)))
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
