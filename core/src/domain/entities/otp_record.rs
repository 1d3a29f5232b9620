//! Passcode record entity for email verification.

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{OtpKey, OtpPurpose};

/// Maximum number of verification attempts allowed
pub const MAX_ATTEMPTS: u32 = 3;

/// Length of the passcode
pub const CODE_LENGTH: usize = 6;

/// Smallest passcode value (keeps every code at six digits without padding)
pub const CODE_MIN: u32 = 100_000;

/// Largest passcode value
pub const CODE_MAX: u32 = 999_999;

/// Default expiration time for passcodes (10 minutes)
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 10;

/// Minimum delay between two issuances for the same key (2 minutes)
pub const RESEND_COOLDOWN_SECONDS: i64 = 120;

/// Passcode record, one per `(email, purpose)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Unique identifier for the record
    pub id: Uuid,

    /// Normalized (lowercased) email the code was sent to
    pub email: String,

    /// Workflow this code authorizes
    pub purpose: OtpPurpose,

    /// The 6-digit passcode
    pub code: String,

    /// Timestamp when the code was issued
    pub created_at: DateTime<Utc>,

    /// Timestamp when the code expires
    pub expires_at: DateTime<Utc>,

    /// Number of verification attempts made
    pub attempts: u32,

    /// Attempts allowed before the record is discarded
    pub max_attempts: u32,

    /// Whether the code has been successfully verified
    pub verified: bool,
}

impl OtpRecord {
    /// Creates a fresh, unverified record for `key`
    ///
    /// # Arguments
    ///
    /// * `key` - The `(email, purpose)` key
    /// * `code` - The generated passcode
    /// * `issued_at` - Issuance time, taken from the service clock
    /// * `ttl` - Lifetime of the code
    /// * `max_attempts` - Attempts allowed
    pub fn new(
        key: &OtpKey,
        code: String,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: key.email().to_string(),
            purpose: key.purpose().clone(),
            code,
            created_at: issued_at,
            expires_at: issued_at + ttl,
            attempts: 0,
            max_attempts,
            verified: false,
        }
    }

    /// The store key of this record
    pub fn key(&self) -> OtpKey {
        OtpKey::new(&self.email, self.purpose.clone())
    }

    /// Verification rejects the code once `now` is past `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Sweeper predicate: eligible for deletion from `expires_at` on, verified or not
    pub fn is_sweepable_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Gate predicate
    pub fn is_verified_at(&self, now: DateTime<Utc>) -> bool {
        self.verified && self.expires_at > now
    }

    /// Whether all attempts have been used
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Gets the number of remaining verification attempts (0 if exhausted)
    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    /// Whether a new issuance for this key is still blocked at `now`
    pub fn is_within_cooldown(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        now - self.created_at < cooldown
    }

    /// Time left before a new issuance is allowed, zero once the cooldown passed
    pub fn cooldown_remaining(&self, now: DateTime<Utc>, cooldown: Duration) -> Duration {
        let elapsed = now - self.created_at;
        if elapsed < cooldown {
            cooldown - elapsed
        } else {
            Duration::zero()
        }
    }

    /// Time left until expiration, zero once expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }

    /// Compares a submitted code against the stored one in constant time
    pub fn matches_code(&self, submitted: &str) -> bool {
        if submitted.len() != self.code.len() {
            return false;
        }
        constant_time_eq(self.code.as_bytes(), submitted.as_bytes())
    }
}
