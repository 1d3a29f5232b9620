//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Redis configuration for the Redis-backed OTP store
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection
//! - `logging` - Tracing subscriber settings
//! - `otp` - Passcode lifetime, resend cooldown, attempts and notifier settings

pub mod cache;
pub mod database;
pub mod environment;
pub mod logging;
pub mod otp;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::Environment;
pub use logging::{LogFormat, LoggingConfig};
pub use otp::{CleanupConfig, NotifierConfig, NotifierProvider, OtpConfig, VerifiedRecordPolicy};

/// Which store backs the OTP records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map, suitable for development and single-instance deployments
    Memory,
    /// MySQL table with a unique `(email, purpose)` key
    Mysql,
    /// Redis hashes updated through Lua scripts
    Redis,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Memory
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "mysql" => Ok(StoreBackend::Mysql),
            "redis" => Ok(StoreBackend::Redis),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Store backend selection
    #[serde(default)]
    pub store: StoreBackend,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Redis configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// OTP lifecycle configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            store: StoreBackend::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            otp: OtpConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreBackend::Memory,
            database: DatabaseConfig::new("mysql://localhost:3306/otpgate_dev"),
            cache: CacheConfig::default(),
            otp: OtpConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            store: StoreBackend::Mysql,
            database: DatabaseConfig::new("mysql://prod-db:3306/otpgate").with_max_connections(50),
            cache: CacheConfig::default(),
            otp: OtpConfig {
                notifier: NotifierConfig {
                    provider: NotifierProvider::Http,
                    ..Default::default()
                },
                ..Default::default()
            },
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Baseline configuration for an environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::development();
                config.environment = Environment::Staging;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }

    /// Load configuration from environment
    pub fn from_env() -> Self {
        Self::for_environment(Environment::from_env())
    }
}
