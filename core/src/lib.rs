//! # OTP Core
//!
//! Core business logic for email one-time passcodes.
//! This crate contains the passcode record entity, the store interface with an
//! in-memory implementation, the issuance/verification services and the error
//! types that form the foundation of the verification workflow.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    OtpRecord, CODE_LENGTH, CODE_MAX, CODE_MIN, DEFAULT_EXPIRATION_MINUTES, MAX_ATTEMPTS,
    RESEND_COOLDOWN_SECONDS,
};
pub use domain::value_objects::{OtpKey, OtpPurpose};
pub use errors::{OtpError, OtpResult};
pub use repositories::{AttemptOutcome, InMemoryOtpRepository, OtpRepository, ReplaceOutcome};
pub use services::{
    generate_secure_code, issue_response, verify_response, CleanupResult, Clock, IssuedOtp,
    ManualClock, Notifier, OtpCleanupService, OtpService, OtpServiceConfig, OtpStatus,
    SystemClock, VerifiedOtp,
};
