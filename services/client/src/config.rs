//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Command-line flags may override it.

use knowledge_hub_core::ControllerOptions;
use std::time::Duration;
use tracing::Level;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub log_level: Level,
    pub api_key: Option<String>,
    pub default_model: Option<String>,
    pub require_auth: bool,
    pub max_upload_bytes: u64,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend Location ---
        let backend_url = match lookup("BACKEND_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => normalize_backend_url(&url)?,
            None => DEFAULT_BACKEND_URL.to_string(),
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Session Settings ---
        let api_key = lookup("HUB_API_KEY").filter(|key| !key.trim().is_empty());
        let default_model = lookup("DEFAULT_MODEL").filter(|model| !model.trim().is_empty());

        let require_auth = match lookup("REQUIRE_AUTH") {
            None => true,
            Some(value) => parse_bool(&value).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "REQUIRE_AUTH".to_string(),
                    format!("'{}' is not a boolean", value),
                )
            })?,
        };

        let max_upload_mb = parse_number(&lookup, "MAX_UPLOAD_MB", 10)?;
        let max_upload_bytes = max_upload_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            ConfigError::InvalidValue(
                "MAX_UPLOAD_MB".to_string(),
                format!("'{}' is too large", max_upload_mb),
            )
        })?;
        let timeout_secs = parse_number(&lookup, "REQUEST_TIMEOUT_SECS", 120)?;

        Ok(Self {
            backend_url,
            log_level,
            api_key,
            default_model,
            require_auth,
            max_upload_bytes,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Points the client at another backend, applying the same checks as
    /// `BACKEND_URL`.
    pub fn set_backend_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.backend_url = normalize_backend_url(url)?;
        Ok(())
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            require_auth: self.require_auth,
            max_upload_bytes: self.max_upload_bytes,
            default_model: self.default_model.clone(),
            ..ControllerOptions::default()
        }
    }
}

/// Trims whitespace and trailing slashes and insists on an http(s) scheme.
pub fn normalize_backend_url(url: &str) -> Result<String, ConfigError> {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(ConfigError::InvalidValue(
            "BACKEND_URL".to_string(),
            format!("'{}' is not an http(s) URL", url),
        ))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_number<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidValue(
                name.to_string(),
                format!("'{}' is not a positive integer", value),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_target_local_backend() {
        let config = load(&[]).unwrap();
        assert_eq!(config.backend_url, "http://127.0.0.1:8000");
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.require_auth);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("BACKEND_URL", "https://hub.example.com/"),
            ("RUST_LOG", "debug"),
            ("REQUIRE_AUTH", "false"),
            ("MAX_UPLOAD_MB", "25"),
            ("DEFAULT_MODEL", "gemini-2.5-flash"),
        ])
        .unwrap();
        assert_eq!(config.backend_url, "https://hub.example.com");
        assert_eq!(config.log_level, Level::DEBUG);
        assert!(!config.require_auth);
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);

        let options = config.controller_options();
        assert!(!options.require_auth);
        assert_eq!(options.default_model.as_deref(), Some("gemini-2.5-flash"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("BACKEND_URL", "localhost:8000")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "BACKEND_URL"
        ));
        assert!(matches!(
            load(&[("REQUIRE_AUTH", "maybe")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "REQUIRE_AUTH"
        ));
        assert!(matches!(
            load(&[("MAX_UPLOAD_MB", "0")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "MAX_UPLOAD_MB"
        ));
        assert!(matches!(
            load(&[("MAX_UPLOAD_MB", "99999999999999")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "MAX_UPLOAD_MB"
        ));
    }

    #[test]
    fn backend_override_is_checked_like_the_environment() {
        let mut config = load(&[]).unwrap();

        config.set_backend_url(" https://hub.example.com/ ").unwrap();
        assert_eq!(config.backend_url, "https://hub.example.com");

        assert!(matches!(
            config.set_backend_url("localhost:8000"),
            Err(ConfigError::InvalidValue(name, _)) if name == "BACKEND_URL"
        ));
        assert_eq!(config.backend_url, "https://hub.example.com");
    }
}
