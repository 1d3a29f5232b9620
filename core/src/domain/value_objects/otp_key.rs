//! The `(email, purpose)` key a passcode record is stored under.

use otp_shared::utils::email::normalize_email;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::purpose::OtpPurpose;

/// Store key for a passcode record
///
/// The email is normalized on construction, so two keys built from
/// `Alice@X.com` and `alice@x.com` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OtpKey {
    email: String,
    purpose: OtpPurpose,
}

impl OtpKey {
    pub fn new(email: &str, purpose: OtpPurpose) -> Self {
        Self {
            email: normalize_email(email),
            purpose,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn purpose(&self) -> &OtpPurpose {
        &self.purpose
    }
}

impl fmt::Display for OtpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.purpose, self.email)
    }
}
