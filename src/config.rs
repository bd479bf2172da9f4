//! Configuration for the NLP gateway
//!
//! Values resolve in three layers: built-in defaults, an optional TOML file,
//! then environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Interface to bind the HTTP server to
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared API key. When set, callers must send it and upstreams receive it.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upstream NLP services
    #[serde(default)]
    pub upstreams: UpstreamConfig,

    /// SQLite file backing the record store
    #[serde(default = "default_record_db")]
    pub record_db: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// RAKE keyword extraction service
    #[serde(default = "default_rake_endpoint")]
    pub rake_endpoint: String,

    /// Prose service (tokens, entities, sentences)
    #[serde(default = "default_prose_endpoint")]
    pub prose_endpoint: String,

    /// Language detection service
    #[serde(default = "default_lang_endpoint")]
    pub lang_endpoint: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            upstreams: UpstreamConfig::default(),
            record_db: default_record_db(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            rake_endpoint: default_rake_endpoint(),
            prose_endpoint: default_prose_endpoint(),
            lang_endpoint: default_lang_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.with_env()
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay environment variables on top of the current values
    pub fn with_env(mut self) -> Result<Self> {
        self.host = get_env("HOST", &self.host);
        self.port = parse_env("PORT", self.port)?;

        let api_key = get_env("API_KEY", self.api_key.as_deref().unwrap_or_default());
        self.api_key = (!api_key.is_empty()).then_some(api_key);

        let upstreams = &mut self.upstreams;
        upstreams.rake_endpoint = get_env("RAKE_ENDPOINT", &upstreams.rake_endpoint);
        upstreams.prose_endpoint = get_env("PROSE_ENDPOINT", &upstreams.prose_endpoint);
        upstreams.lang_endpoint = get_env("LANG_ENDPOINT", &upstreams.lang_endpoint);
        upstreams.timeout_secs = parse_env("UPSTREAM_TIMEOUT_SECS", upstreams.timeout_secs)?;

        self.record_db = PathBuf::from(get_env(
            "RECORD_DB_PATH",
            &self.record_db.to_string_lossy(),
        ));

        Ok(self)
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Value of the environment variable `key`, or `fallback` when it is not set
pub fn get_env(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn parse_env<T>(key: &str, fallback: T) -> Result<T>
where
    T: FromStr + ToString,
{
    let raw = get_env(key, &fallback.to_string());
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got {raw:?}")))
}

// Default value functions

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_rake_endpoint() -> String {
    "http://localhost:8081".to_string()
}

fn default_prose_endpoint() -> String {
    "http://localhost:8082".to_string()
}

fn default_lang_endpoint() -> String {
    "http://localhost:8083".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_record_db() -> PathBuf {
    PathBuf::from("records.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_env_set() {
        std::env::set_var("NLP_GATEWAY_TEST_KEY_SET", "foo");
        assert_eq!(get_env("NLP_GATEWAY_TEST_KEY_SET", "bar"), "foo");
    }

    #[test]
    fn test_get_env_not_set() {
        std::env::remove_var("NLP_GATEWAY_TEST_KEY_UNSET");
        assert_eq!(get_env("NLP_GATEWAY_TEST_KEY_UNSET", "bar"), "bar");
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("NLP_GATEWAY_TEST_PORT", "eighty");
        let err = parse_env::<u16>("NLP_GATEWAY_TEST_PORT", 8080).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upstreams.rake_endpoint, "http://localhost:8081");
        assert_eq!(config.upstreams.prose_endpoint, "http://localhost:8082");
        assert_eq!(config.upstreams.lang_endpoint, "http://localhost:8083");
        assert!(config.api_key.is_none());
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_from_file_partial() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            r#"
port = 9090

[upstreams]
lang_endpoint = "http://lang.internal:8000"
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.upstreams.lang_endpoint, "http://lang.internal:8000");
        // Unspecified keys fall back to defaults
        assert_eq!(config.upstreams.rake_endpoint, "http://localhost:8081");
        assert_eq!(config.upstreams.timeout_secs, 30);
    }

    #[test]
    fn test_load_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            r#"
port = 9090
api_key = "fromfile"
record_db = "data/records.db"
"#,
        )
        .unwrap();

        // Only this test reads PORT and API_KEY
        std::env::set_var("PORT", "7070");
        std::env::set_var("API_KEY", "");
        let config = Config::load(Some(path.as_path()));
        std::env::remove_var("PORT");
        std::env::remove_var("API_KEY");

        let config = config.unwrap();
        assert_eq!(config.port, 7070);
        // Empty key counts as unset
        assert!(config.api_key.is_none());
        // Keys without an env override keep the file value
        assert_eq!(config.record_db, PathBuf::from("data/records.db"));
    }
}
