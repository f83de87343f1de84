//! Configuration management for the token signal service
//!
//! Loads defaults, optional TOML files and environment variables via .env

mod types;

pub use types::*;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Environment name that turns off verbose errors and switches to JSON logs
pub const PRODUCTION: &str = "production";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment name (e.g. "production", "staging")
    pub environment: String,
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the JSON artifact bundle
    pub artifact_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Allow any origin, method and header
    pub cors_permissive: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        Self::from_sources(
            std::env::var("PORT").ok(),
            std::env::var("RAILWAY_ENVIRONMENT").ok(),
        )
    }

    /// Build the configuration with explicit values for the legacy
    /// `PORT` / `RAILWAY_ENVIRONMENT` variables
    pub fn from_sources(port: Option<String>, environment: Option<String>) -> Result<Self> {
        let port = port
            .map(|p| p.trim().parse::<u16>())
            .transpose()
            .context("PORT must be a valid port number")?;

        let config = Config::builder()
            .set_default("environment", "unknown")?
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            // Model defaults
            .set_default("model.artifact_path", "models/token_model.json")?
            // API defaults
            .set_default("api.cors_permissive", true)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (TOKEN_SIGNAL__*)
            .add_source(
                Environment::with_prefix("TOKEN_SIGNAL")
                    .prefix_separator("__")
                    .separator("__"),
            )
            // Platform-provided variables win
            .set_override_option("server.port", port.map(i64::from))?
            .set_override_option("environment", environment)?
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION
    }

    /// Full error chains in responses outside production
    pub fn verbose_errors(&self) -> bool {
        !self.is_production()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "env={} bind={} artifact={} verbose_errors={} cors_permissive={}",
            self.environment,
            self.bind_address(),
            self.model.artifact_path,
            self.verbose_errors(),
            self.api.cors_permissive
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_sources(None, None).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.model.artifact_path, "models/token_model.json");
        assert_eq!(config.environment, "unknown");
        assert!(config.verbose_errors());
    }

    #[test]
    fn test_legacy_overrides() {
        let config =
            AppConfig::from_sources(Some("8080".to_string()), Some("production".to_string()))
                .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.is_production());
        assert!(!config.verbose_errors());
        assert!(config.digest().contains(":8080"));
    }

    #[test]
    fn test_invalid_port() {
        assert!(AppConfig::from_sources(Some("not-a-port".to_string()), None).is_err());
    }
}
