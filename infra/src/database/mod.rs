//! Database module - MySQL store using SQLx
//!
//! This module provides:
//! - Connection pool management
//! - The passcode table migration
//! - The MySQL `OtpRepository` implementation

pub mod connection;
pub mod mysql;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::MySqlOtpRepository;
