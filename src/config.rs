use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

pub const ACCESS_TOKEN_ENV: &str = "LINE_ACCESS_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("could not deserialize config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Everything the service needs at startup, passed explicitly to whatever needs it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub database_path: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_notify_url")]
    pub notify_url: String,
    /// LINE Notify token. Without one, confirmations are not forwarded.
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_notify_url() -> String {
    "https://notify-api.line.me/api/notify".to_string()
}

impl Config {
    pub fn from_config(config: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(config)?)
    }

    /// Read the JSON config at `path`, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_config(&text)?;
        Ok(config.with_access_token(std::env::var(ACCESS_TOKEN_ENV).ok()))
    }

    /// Replace the configured token if `token` is set and not blank.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            self.access_token = Some(token);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_config(r#"{"database_path": "coffee.db"}"#).unwrap();
        assert_eq!(config.database_path, "coffee.db");
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.notify_url, "https://notify-api.line.me/api/notify");
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn full_config() {
        let config = Config::from_config(
            r#"{
                "database_path": "/var/lib/coffee.db",
                "bind_address": "0.0.0.0:9000",
                "notify_url": "http://localhost:1234/notify",
                "access_token": "secret"
            }"#,
        )
        .unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.notify_url, "http://localhost:1234/notify");
        assert_eq!(config.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn missing_database_path_is_an_error() {
        assert!(matches!(
            Config::from_config(r#"{"bind_address": "0.0.0.0:9000"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn token_override_ignores_blank_values() {
        let config = Config::from_config(r#"{"database_path": "a.db", "access_token": "file"}"#)
            .unwrap();
        assert_eq!(
            config.clone().with_access_token(Some("env".into())).access_token.as_deref(),
            Some("env")
        );
        assert_eq!(
            config.clone().with_access_token(Some("  ".into())).access_token.as_deref(),
            Some("file")
        );
        assert_eq!(config.with_access_token(None).access_token.as_deref(), Some("file"));
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = Config::load("/nonexistent/coffee-booking.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/coffee-booking.json"));
    }
}
