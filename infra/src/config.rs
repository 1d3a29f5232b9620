//! Configuration loading
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults for the detected environment
//! 2. `config/otp.{environment}.toml` (optional)
//! 3. `config/otp.toml` (optional)
//! 4. `OTP__*` environment variables, e.g. `OTP__STORE=redis` or
//!    `OTP__OTP__NOTIFIER__API_KEY=...`
//!
//! `.env.{environment}` and `.env` are read into the process environment first.

use ::config::{Config, Environment as EnvSource, File};
use otp_shared::config::{AppConfig, Environment, NotifierProvider};

use crate::InfrastructureError;

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "OTP";

/// Base configuration file, relative to the working directory
pub const BASE_CONFIG_FILE: &str = "config/otp";

/// Load configuration for the environment named by `ENVIRONMENT`
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok();
    let environment = Environment::from_env();
    dotenvy::from_filename(environment.env_file()).ok();

    load_config_for(environment)
}

/// Load configuration for an explicit environment
pub fn load_config_for(environment: Environment) -> Result<AppConfig, InfrastructureError> {
    let defaults = Config::try_from(&AppConfig::for_environment(environment))?;

    let config: AppConfig = Config::builder()
        .add_source(defaults)
        .add_source(File::with_name(&environment.config_file()).required(false))
        .add_source(File::with_name(BASE_CONFIG_FILE).required(false))
        .add_source(
            EnvSource::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    validate(&config)?;

    tracing::debug!(
        environment = %config.environment,
        store = ?config.store,
        "Configuration loaded"
    );

    Ok(config)
}

/// Reject configurations the services cannot run with
pub fn validate(config: &AppConfig) -> Result<(), InfrastructureError> {
    let otp = &config.otp;

    if otp.code_ttl_seconds <= 0 {
        return Err(InfrastructureError::Config(
            "otp.code_ttl_seconds must be positive".to_string(),
        ));
    }
    if otp.resend_cooldown_seconds < 0 {
        return Err(InfrastructureError::Config(
            "otp.resend_cooldown_seconds must not be negative".to_string(),
        ));
    }
    if otp.max_attempts == 0 {
        return Err(InfrastructureError::Config(
            "otp.max_attempts must be at least 1".to_string(),
        ));
    }
    if otp.notifier.provider == NotifierProvider::Http && otp.notifier.endpoint.is_empty() {
        return Err(InfrastructureError::Config(
            "otp.notifier.endpoint is required for the http notifier".to_string(),
        ));
    }

    Ok(())
}
