//! Configuration management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub ingestion: IngestionConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose the OpenAPI document. Should be false in hardened production.
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer.
    /// A scan fans out to the remote repository, so this is generous.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only). Empty vector -> no external origins.
    pub allowed_origins: Vec<String>,
}

/// Remote repository (GitHub contents API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub api_base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Fixed delay before the single retry of a file download
    pub retry_delay_ms: u64,
    /// Cap on in-flight file downloads per run. `None` means one task per file with no cap.
    pub max_concurrent_fetches: Option<usize>,
    /// Suffix a listing entry must carry to be fetched
    pub file_suffix: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Drop and recreate the scan table at startup
    pub reset_on_startup: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl IngestionConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_docs: true,
                request_timeout_seconds: 120,
                allowed_origins: vec!["*".to_string()],
            },
            github: GitHubConfig {
                api_base_url: "https://api.github.com".to_string(),
                token: None,
                timeout_seconds: 30,
                user_agent: format!("scan-ingest/{}", env!("CARGO_PKG_VERSION")),
            },
            ingestion: IngestionConfig {
                retry_delay_ms: 5000,
                max_concurrent_fetches: Some(8),
                file_suffix: ".json".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://scans.db".to_string(),
                max_connections: 5,
                reset_on_startup: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Config::default())?;

        let mut builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // Override with environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder
            .add_source(config::Environment::with_prefix("SCAN_INGEST").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_retry_delay_and_suffix() {
        let config = Config::default();
        assert_eq!(config.ingestion.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.ingestion.file_suffix, ".json");
        assert_eq!(config.server.port, 8080);
        assert!(config.database.reset_on_startup);
    }

    #[test]
    fn default_config_round_trips_through_config_crate() {
        let source = config::Config::try_from(&Config::default()).unwrap();
        let loaded: Config = source.try_deserialize().unwrap();
        assert_eq!(loaded.github.api_base_url, "https://api.github.com");
        assert_eq!(loaded.ingestion.max_concurrent_fetches, Some(8));
    }
}
