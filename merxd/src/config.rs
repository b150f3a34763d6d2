//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{ServiceError, ServiceResult};
use merx_store::PaginationConfig;
use std::env;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Pagination bounds applied to all list endpoints
    pub pagination: PaginationConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; required when serving from PostgreSQL
    pub url: Option<String>,
    /// Connection pool size
    pub max_connections: u32,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (in-memory store, ephemeral ports)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> ServiceResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let api = Self::load_api_config()?;
        let database = Self::load_database_config()?;
        let pagination = Self::load_pagination_config()?;

        Ok(Self {
            api,
            database,
            pagination,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: DatabaseConfig {
                url: Some("postgres://localhost/merx_test".to_string()),
                max_connections: 2,
            },
            pagination: PaginationConfig::default(),
            environment: Environment::Test,
        }
    }

    fn load_environment() -> ServiceResult<Environment> {
        let env_str = env::var("MERX_ENV").unwrap_or_else(|_| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ServiceError::Config(format!(
                "Invalid MERX_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config() -> ServiceResult<ApiConfig> {
        let host = env::var("MERX_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_str = env::var("MERX_API_PORT").unwrap_or_else(|_| "8080".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| ServiceError::Config(format!("Invalid MERX_API_PORT: {}", port_str)))?;

        Ok(ApiConfig { host, port })
    }

    fn load_database_config() -> ServiceResult<DatabaseConfig> {
        let url = env::var("DATABASE_URL").ok();
        let max_connections = Self::load_u32_env("MERX_DB_MAX_CONNECTIONS", 10)?;

        Ok(DatabaseConfig {
            url,
            max_connections,
        })
    }

    fn load_pagination_config() -> ServiceResult<PaginationConfig> {
        let default_page_size = Self::load_i32_env("MERX_PAGE_SIZE_DEFAULT", 20)?;
        let max_page_size = Self::load_i32_env("MERX_PAGE_SIZE_MAX", 100)?;

        if default_page_size <= 0 || max_page_size <= 0 || default_page_size > max_page_size {
            return Err(ServiceError::Config(format!(
                "Invalid pagination bounds: default={}, max={}",
                default_page_size, max_page_size
            )));
        }

        Ok(PaginationConfig {
            default_page_size,
            max_page_size,
        })
    }

    fn load_u32_env(key: &str, default: u32) -> ServiceResult<u32> {
        match env::var(key) {
            Ok(val) => val
                .parse::<u32>()
                .map_err(|_| ServiceError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(default),
        }
    }

    fn load_i32_env(key: &str, default: i32) -> ServiceResult<i32> {
        match env::var(key) {
            Ok(val) => val
                .parse::<i32>()
                .map_err(|_| ServiceError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(default),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_config() {
        let config = Config::test();

        assert_eq!(config.api.port, 0);
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.pagination.max_page_size, 100);
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
