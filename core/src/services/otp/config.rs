//! Configuration for the passcode service

use chrono::Duration;
use otp_shared::config::{OtpConfig, VerifiedRecordPolicy};

use crate::domain::entities::otp_record::{
    DEFAULT_EXPIRATION_MINUTES, MAX_ATTEMPTS, RESEND_COOLDOWN_SECONDS,
};

/// Configuration for the passcode service
#[derive(Debug, Clone)]
pub struct OtpServiceConfig {
    /// Number of seconds before a passcode expires
    pub code_expiration_seconds: i64,
    /// Minimum seconds between two issuances for the same key
    pub resend_cooldown_seconds: i64,
    /// Maximum number of verification attempts allowed
    pub max_attempts: u32,
    /// Lifetime of verified records
    pub verified_policy: VerifiedRecordPolicy,
}

impl OtpServiceConfig {
    pub fn code_ttl(&self) -> Duration {
        Duration::seconds(self.code_expiration_seconds)
    }

    pub fn resend_cooldown(&self) -> Duration {
        Duration::seconds(self.resend_cooldown_seconds)
    }
}

impl Default for OtpServiceConfig {
    fn default() -> Self {
        Self {
            code_expiration_seconds: DEFAULT_EXPIRATION_MINUTES * 60,
            resend_cooldown_seconds: RESEND_COOLDOWN_SECONDS,
            max_attempts: MAX_ATTEMPTS,
            verified_policy: VerifiedRecordPolicy::default(),
        }
    }
}

impl From<&OtpConfig> for OtpServiceConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            code_expiration_seconds: config.code_ttl_seconds,
            resend_cooldown_seconds: config.resend_cooldown_seconds,
            max_attempts: config.max_attempts,
            verified_policy: config.verified_policy,
        }
    }
}
