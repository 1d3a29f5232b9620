//! Response envelope for passcode operations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flat result of an OTP operation, as returned to request handlers
///
/// `record_id` is only present on successful issuance, `verified` only on
/// verification calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl OtpResponse {
    /// Successful issuance
    pub fn issued(record_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            record_id: Some(record_id),
            verified: None,
            error_code: None,
        }
    }

    /// Successful verification
    pub fn verified(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            record_id: None,
            verified: Some(true),
            error_code: None,
        }
    }

    /// Failed operation
    pub fn failure(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            record_id: None,
            verified: None,
            error_code: Some(error_code.into()),
        }
    }

    /// Mark a failure as coming from a verification call
    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = Some(verified);
        self
    }
}
