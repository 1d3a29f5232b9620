//! Email passcode service module
//!
//! This module provides the complete passcode workflow:
//! - Code generation from the OS random source
//! - Issuance with resend cooldown and delivery compensation
//! - Verification with expiry and bounded attempts
//! - The verification gate queried by downstream actions
//! - Sweeping of expired records, on demand or on a background interval

mod cleanup;
mod clock;
mod config;
mod gate;
mod generator;
mod issuance;
mod service;
mod sweeper;
mod traits;
mod types;
mod verification;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, OtpCleanupService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OtpServiceConfig;
pub use generator::generate_secure_code;
pub use service::OtpService;
pub use traits::Notifier;
pub use types::{issue_response, verify_response, IssuedOtp, OtpStatus, VerifiedOtp};
