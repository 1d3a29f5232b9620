//! Store interfaces and implementations owned by the domain layer.

pub mod otp;

pub use otp::{AttemptOutcome, InMemoryOtpRepository, OtpRepository, ReplaceOutcome};
