//! Runtime configuration, environment-driven with serde defaults so a
//! config file can deserialize into the same shape.

use serde::{Deserialize, Serialize};

fn default_bind_addr() -> String {
    "127.0.0.1:3007".to_string()
}

fn default_database_url() -> String {
    "sqlite://data.db".to_string()
}

fn default_registry_path() -> String {
    "registry.json".to_string()
}

fn default_page_size() -> i64 {
    50
}

fn default_max_page_size() -> i64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Path to the schema registry JSON (the metadata dictionary)
    #[serde(default = "default_registry_path")]
    pub registry_path: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_url: default_database_url(),
            registry_path: default_registry_path(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            registry_path: std::env::var("REGISTRY_PATH").unwrap_or(defaults.registry_path),
            default_page_size: env_i64("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: env_i64("MAX_PAGE_SIZE", defaults.max_page_size),
        }
    }

    /// Clamp a requested page size into the configured bounds.
    pub fn clamp_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

fn env_i64(name: &str, fallback: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(fallback)
}
