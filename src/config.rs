//! Application configuration.
//!
//! Loaded from an optional TOML file (`default_config_path()`, following
//! the teacher's `dirs-next`-based convention) and overridden by a small
//! set of environment variables for secrets and deployment-specific
//! values, matching spec §6's "Environment variables consumed."

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host for the single Axum server (REST + OCPP WebSocket).
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight connections to drain on shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            shutdown_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./ocpp.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub public_base_url: String,
    /// Flat price in HUF per kWh used to recalculate session cost; `None`
    /// leaves cost unset when no rate is configured.
    pub price_huf_per_kwh: Option<f64>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: String::new(),
            stripe_webhook_secret: String::new(),
            public_base_url: "http://localhost:9000".to_string(),
            price_huf_per_kwh: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `"plain"` or `"json"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub payment: PaymentConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads the TOML file at `path` if it exists, falling back to
    /// defaults otherwise, then applies environment-variable overrides.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match path.or_else(default_config_path) {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| ConfigError::Read(path.clone(), e))?;
                toml::from_str(&text).map_err(|e| ConfigError::Parse(path, e))?
            }
            _ => AppConfig::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(key) = std::env::var("STRIPE_SECRET_KEY") {
            self.payment.stripe_secret_key = key;
        }
        if let Ok(secret) = std::env::var("STRIPE_WEBHOOK_SECRET") {
            self.payment.stripe_webhook_secret = secret;
        }
        if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
            self.payment.public_base_url = url;
        }
        if let Ok(price) = std::env::var("OCPP_PRICE_HUF_PER_KWH") {
            if let Ok(price) = price.parse::<f64>() {
                self.payment.price_huf_per_kwh = Some(price);
            }
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `$XDG_CONFIG_HOME/ocpp-csms/config.toml` (or platform equivalent via
/// `dirs-next`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join("ocpp-csms").join("config.toml"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server_address(), "0.0.0.0:9000");
        assert!(config.payment.price_huf_per_kwh.is_none());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Some(PathBuf::from("/nonexistent/path/config.toml")))
            .expect("load should not fail on a missing file");
        assert_eq!(config.database.url, DatabaseConfig::default().url);
    }

    #[test]
    fn parses_toml_tables() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [payment]
            price_huf_per_kwh = 120.5
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.payment.price_huf_per_kwh, Some(120.5));
        // Unspecified tables/fields keep their defaults.
        assert_eq!(config.database.max_connections, 5);
    }
}
