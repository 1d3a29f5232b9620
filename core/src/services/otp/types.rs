//! Types for passcode service results

use chrono::{DateTime, Utc};
use otp_shared::types::OtpResponse;
use uuid::Uuid;

use crate::domain::value_objects::OtpPurpose;
use crate::errors::{OtpError, OtpResult};

/// Result of issuing a passcode
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    /// Identifier of the stored record
    pub record_id: Uuid,
    /// Normalized email the code was sent to
    pub email: String,
    /// Workflow the code authorizes
    pub purpose: OtpPurpose,
    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,
    /// When the user can request another code
    pub next_resend_at: DateTime<Utc>,
    /// The message ID from the delivery provider
    pub message_id: String,
}

impl IssuedOtp {
    pub fn message(&self) -> String {
        "Verification code sent. Please check your email".to_string()
    }
}

/// Result of a successful verification
#[derive(Debug, Clone)]
pub struct VerifiedOtp {
    /// Identifier of the verified record
    pub record_id: Uuid,
    /// Attempts used, including the successful one
    pub attempts: u32,
    /// Always true; kept for callers that forward the flag as-is
    pub verified: bool,
}

impl VerifiedOtp {
    pub fn message(&self) -> String {
        "Email verified successfully".to_string()
    }
}

/// Read-only view of the current record for a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpStatus {
    pub record_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub remaining_attempts: u32,
    pub verified: bool,
    pub expired: bool,
}

/// Flatten an issuance result into the handler-facing response
pub fn issue_response(result: &OtpResult<IssuedOtp>) -> OtpResponse {
    match result {
        Ok(issued) => OtpResponse::issued(issued.record_id, issued.message()),
        Err(error) => failure_response(error),
    }
}

/// Flatten a verification result into the handler-facing response
pub fn verify_response(result: &OtpResult<VerifiedOtp>) -> OtpResponse {
    match result {
        Ok(verified) => OtpResponse::verified(verified.message()),
        Err(error) => failure_response(error).with_verified(false),
    }
}

fn failure_response(error: &OtpError) -> OtpResponse {
    OtpResponse::failure(error.error_code(), error.user_message())
}
