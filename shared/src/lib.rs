//! Shared utilities and common types for the OTP verification services
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Error and response structures
//! - Utility functions (email normalization, masking)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, CleanupConfig, DatabaseConfig, Environment, LogFormat,
    LoggingConfig, NotifierConfig, NotifierProvider, OtpConfig, StoreBackend,
    VerifiedRecordPolicy,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
pub use types::OtpResponse;
pub use utils::email;
