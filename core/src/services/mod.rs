//! Business services containing domain logic and use cases.

pub mod otp;

// Re-export commonly used types
pub use otp::{
    generate_secure_code, issue_response, verify_response, CleanupResult, Clock, IssuedOtp,
    ManualClock, Notifier, OtpCleanupService, OtpService, OtpServiceConfig, OtpStatus,
    SystemClock, VerifiedOtp,
};
