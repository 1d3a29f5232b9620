//! # Infrastructure Layer
//!
//! This crate provides the concrete adapters behind the passcode core:
//!
//! - **Database**: MySQL store using SQLx
//! - **Cache**: Redis store driven by Lua scripts
//! - **Notifier**: email delivery (log-only for development, HTTP email API)
//! - **Config**: layered configuration loading
//! - **Telemetry**: tracing subscriber setup
//!
//! ## Features
//!
//! - `mysql`: Enable the MySQL store (default)
//! - `redis-store`: Enable the Redis store (default)

use std::sync::Arc;

use otp_core::{
    InMemoryOtpRepository, Notifier, OtpCleanupService, OtpError, OtpRepository, OtpService,
    OtpServiceConfig,
};
use otp_shared::config::{AppConfig, StoreBackend};

// Re-export core types for convenience
pub use otp_core::errors::*;

/// Database module - MySQL store using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis store
#[cfg(feature = "redis-store")]
pub mod cache;

/// Notifier module - email delivery
pub mod notifier;

/// Configuration loading
pub mod config;

/// Tracing subscriber setup
pub mod telemetry;

/// Store selected at runtime
pub type DynOtpRepository = Box<dyn OtpRepository>;

/// Notifier selected at runtime
pub type DynNotifier = Box<dyn Notifier>;

/// Passcode service wired from configuration
pub type AppOtpService = OtpService<DynOtpRepository, DynNotifier>;

/// Infrastructure service container
pub struct InfrastructureServices {
    /// Passcode service
    pub otp_service: Arc<AppOtpService>,
    /// Background sweeper, not yet started
    pub cleanup: Arc<OtpCleanupService<DynOtpRepository, DynNotifier>>,
}

/// Initialize infrastructure services
///
/// This function:
/// - Loads configuration from `.env`, config files and the environment
/// - Connects the configured store
/// - Creates the configured notifier
///
/// Tracing is not initialized here; call `telemetry::init_tracing` first.
pub async fn initialize() -> Result<InfrastructureServices, InfrastructureError> {
    let config = config::load_config()?;
    build_services(&config).await
}

/// Build the services for an already loaded configuration
pub async fn build_services(
    config: &AppConfig,
) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!(
        environment = %config.environment,
        store = ?config.store,
        "Initializing infrastructure services"
    );

    let repository = create_repository(config).await?;
    let notifier = notifier::create_notifier(&config.otp)?;

    let otp_service = Arc::new(OtpService::new(
        Arc::new(repository),
        Arc::new(notifier),
        OtpServiceConfig::from(&config.otp),
    ));
    let cleanup = Arc::new(OtpCleanupService::new(
        otp_service.clone(),
        config.otp.cleanup.clone(),
    ));

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices {
        otp_service,
        cleanup,
    })
}

/// Connect the store selected by `config.store`
pub async fn create_repository(
    config: &AppConfig,
) -> Result<DynOtpRepository, InfrastructureError> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory passcode store; records are lost on restart");
            Ok(Box::new(InMemoryOtpRepository::new()))
        }
        #[cfg(feature = "mysql")]
        StoreBackend::Mysql => {
            let pool = database::DatabasePool::new(config.database.clone()).await?;
            if config.database.migrate_on_start {
                pool.run_migrations().await?;
            }
            Ok(Box::new(database::MySqlOtpRepository::new(
                pool.get_pool().clone(),
            )))
        }
        #[cfg(feature = "redis-store")]
        StoreBackend::Redis => {
            let client = cache::RedisClient::new(config.cache.clone()).await?;
            Ok(Box::new(cache::RedisOtpRepository::new(
                client,
                config.cache.clone(),
            )))
        }
        #[allow(unreachable_patterns)]
        other => Err(InfrastructureError::Config(format!(
            "Store backend {:?} is not compiled in",
            other
        ))),
    }
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Email delivery error
    #[error("Notifier error: {0}")]
    Notifier(String),
}

impl From<InfrastructureError> for OtpError {
    fn from(error: InfrastructureError) -> Self {
        OtpError::store(error)
    }
}
