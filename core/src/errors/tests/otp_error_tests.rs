//! Unit tests for passcode error types

use otp_shared::errors::IntoErrorResponse;

use crate::errors::OtpError;

#[test]
fn test_invalid_code_reports_remaining_attempts() {
    let error = OtpError::InvalidCode { remaining: 2 };
    assert_eq!(error.to_string(), "Invalid verification code. 2 attempt(s) remaining");
}

#[test]
fn test_rate_limited_message_asks_to_wait() {
    let error = OtpError::RateLimited {
        retry_after_seconds: 30,
    };
    assert!(error.to_string().contains("wait 30 seconds"));
}

#[test]
fn test_delivery_failed_hides_provider_reason() {
    let error = OtpError::DeliveryFailed {
        reason: "smtp 550 mailbox unavailable".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("check the email address"));
    assert!(!message.contains("550"));
}

#[test]
fn test_recoverability() {
    assert!(OtpError::RateLimited { retry_after_seconds: 1 }.is_recoverable());
    assert!(OtpError::DeliveryFailed { reason: String::new() }.is_recoverable());
    assert!(OtpError::NotFound.is_recoverable());
    assert!(OtpError::Expired.is_recoverable());
    assert!(OtpError::AttemptsExceeded.is_recoverable());
    assert!(OtpError::InvalidCode { remaining: 1 }.is_recoverable());
    assert!(OtpError::InvalidEmail.is_recoverable());
    assert!(!OtpError::store("connection reset").is_recoverable());
}

#[test]
fn test_error_codes() {
    assert_eq!(OtpError::NotFound.error_code(), "VERIFICATION_CODE_NOT_FOUND");
    assert_eq!(OtpError::Expired.error_code(), "VERIFICATION_CODE_EXPIRED");
    assert_eq!(OtpError::AttemptsExceeded.error_code(), "VERIFICATION_ATTEMPTS_EXCEEDED");
    assert_eq!(OtpError::store("x").error_code(), "STORE_ERROR");
}

#[test]
fn test_store_error_user_message_is_generic() {
    let error = OtpError::store("deadlock found when trying to get lock");
    assert!(error.to_string().contains("deadlock"));
    assert!(!error.user_message().contains("deadlock"));
}

#[test]
fn test_error_response_details() {
    let response = OtpError::InvalidCode { remaining: 1 }.to_error_response();
    assert_eq!(response.error, "VERIFICATION_CODE_INVALID");
    let details = response.details.expect("details should be present");
    assert_eq!(details["remaining_attempts"], serde_json::json!(1));

    let response = OtpError::RateLimited { retry_after_seconds: 45 }.to_error_response();
    let details = response.details.expect("details should be present");
    assert_eq!(details["retry_after_seconds"], serde_json::json!(45));

    let response = OtpError::Expired.to_error_response();
    assert!(response.details.is_none());
}
