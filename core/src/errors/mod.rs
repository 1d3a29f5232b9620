//! Domain error types for the passcode workflow.

use otp_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Errors returned by issuance, verification and the store
///
/// Every variant except `Store` is recoverable by the caller, usually by
/// requesting a fresh code. The `Display` text is safe to show to end users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("A verification code was sent recently. Please wait {retry_after_seconds} seconds before requesting a new one")]
    RateLimited { retry_after_seconds: i64 },

    #[error("Failed to send the verification code. Please check the email address and try again")]
    DeliveryFailed { reason: String },

    #[error("No verification code found. Please request a new code")]
    NotFound,

    #[error("Verification code has expired. Please request a new code")]
    Expired,

    #[error("Maximum verification attempts exceeded. Please request a new code")]
    AttemptsExceeded,

    #[error("Invalid verification code. {remaining} attempt(s) remaining")]
    InvalidCode { remaining: u32 },

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Internal store error: {message}")]
    Store { message: String },
}

impl OtpError {
    /// Build a store error from any displayable cause
    pub fn store(cause: impl std::fmt::Display) -> Self {
        OtpError::Store {
            message: cause.to_string(),
        }
    }

    /// Whether the caller can recover (wait, fix input or request a new code)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, OtpError::Store { .. })
    }

    /// Stable error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            OtpError::RateLimited { .. } => error_codes::RATE_LIMIT_EXCEEDED,
            OtpError::DeliveryFailed { .. } => error_codes::DELIVERY_FAILED,
            OtpError::NotFound => error_codes::CODE_NOT_FOUND,
            OtpError::Expired => error_codes::CODE_EXPIRED,
            OtpError::AttemptsExceeded => error_codes::ATTEMPTS_EXCEEDED,
            OtpError::InvalidCode { .. } => error_codes::CODE_INVALID,
            OtpError::InvalidEmail => error_codes::EMAIL_INVALID,
            OtpError::Store { .. } => error_codes::STORE_ERROR,
        }
    }

    /// Message shown to users; store internals are not leaked
    pub fn user_message(&self) -> String {
        match self {
            OtpError::Store { .. } => {
                "Verification is temporarily unavailable. Please try again later".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoErrorResponse for OtpError {
    fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.error_code(), self.user_message());
        match self {
            OtpError::RateLimited { retry_after_seconds } => {
                response.add_detail("retry_after_seconds", retry_after_seconds)
            }
            OtpError::InvalidCode { remaining } => response.add_detail("remaining_attempts", remaining),
            _ => response,
        }
    }
}

pub type OtpResult<T> = Result<T, OtpError>;
