//! MySQL pool for the passcode store
//!
//! Builds the SQLx pool from [`DatabaseConfig`], logs slow statements and owns
//! the `otp_records` schema.

use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    ConnectOptions, Executor, MySqlPool,
};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, log::LevelFilter};

use otp_shared::config::DatabaseConfig;

use crate::InfrastructureError;

/// Schema of the passcode table
pub const CREATE_OTP_RECORDS_SQL: &str =
    include_str!("../../migrations/001_create_otp_records.sql");

/// SQLx pool together with the settings it was built from
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
    config: DatabaseConfig,
}

impl DatabasePool {
    /// Connect a pool sized and timed by `config`
    pub async fn new(config: DatabaseConfig) -> Result<Self, InfrastructureError> {
        let connect_options = connect_options(&config)?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting MySQL passcode store"
        );

        let pool = pool_options(&config)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to connect MySQL pool");
                InfrastructureError::Database(e)
            })?;

        Ok(Self { pool, config })
    }

    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Round-trip a `SELECT 1`
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let value: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        debug!(stats = %self.get_statistics(), "MySQL health check passed");
        Ok(value == 1)
    }

    pub fn get_statistics(&self) -> PoolStatistics {
        PoolStatistics {
            connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_connections: self.config.max_connections,
        }
    }

    pub async fn close(&self) {
        info!("Closing MySQL pool");
        self.pool.close().await;
    }

    /// Create the passcode table if it does not exist
    pub async fn run_migrations(&self) -> Result<(), InfrastructureError> {
        self.pool.execute(CREATE_OTP_RECORDS_SQL).await?;
        info!("otp_records schema is up to date");
        Ok(())
    }
}

/// URL schemes the MySQL driver is given
const MYSQL_SCHEMES: [&str; 2] = ["mysql://", "mariadb://"];

fn connect_options(config: &DatabaseConfig) -> Result<MySqlConnectOptions, InfrastructureError> {
    let url = config.url.trim();
    if !MYSQL_SCHEMES
        .iter()
        .any(|scheme| url.get(..scheme.len()).is_some_and(|p| p.eq_ignore_ascii_case(scheme)))
    {
        return Err(InfrastructureError::Config(format!(
            "Invalid database URL: expected mysql:// or mariadb://, got '{}'",
            url.split("://").next().unwrap_or_default()
        )));
    }

    let options = MySqlConnectOptions::from_str(url)
        .map_err(|e| InfrastructureError::Config(format!("Invalid database URL: {}", e)))?;

    Ok(options.log_statements(LevelFilter::Debug).log_slow_statements(
        LevelFilter::Warn,
        Duration::from_millis(config.slow_query_threshold),
    ))
}

fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .max_lifetime(Duration::from_secs(config.max_lifetime))
        .test_before_acquire(true)
}

/// Point-in-time pool usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatistics {
    pub connections: u32,
    pub idle_connections: usize,
    pub max_connections: u32,
}

impl fmt::Display for PoolStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} connections ({} idle)",
            self.connections, self.max_connections, self.idle_connections
        )
    }
}
