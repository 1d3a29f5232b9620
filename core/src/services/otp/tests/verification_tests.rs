//! Unit tests for passcode verification

use chrono::Duration;
use std::sync::Arc;

use otp_shared::errors::error_codes;

use crate::domain::entities::{OtpRecord, MAX_ATTEMPTS};
use crate::domain::value_objects::{OtpKey, OtpPurpose};
use crate::errors::OtpError;
use crate::repositories::OtpRepository;
use crate::services::otp::{verify_response, OtpService, OtpServiceConfig};

use super::mocks::{build_service, start_time, wrong_code, FailingRepository, MockNotifier};

const EMAIL: &str = "jane@example.com";

fn key() -> OtpKey {
    OtpKey::new(EMAIL, OtpPurpose::ApplicationSubmission)
}

#[tokio::test]
async fn test_verify_code_success() {
    let (service, repository, notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    let issued = service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();

    let verified = service
        .verify(EMAIL, &code, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();

    assert!(verified.verified);
    assert_eq!(verified.record_id, issued.record_id);
    // The successful attempt is counted too
    assert_eq!(verified.attempts, 1);

    // Record is kept so the gate can answer
    let record = repository.find_active(&key()).await.unwrap().unwrap();
    assert!(record.verified);
    assert_eq!(record.attempts, 1);
}

#[tokio::test]
async fn test_verify_without_record() {
    let (service, _repository, _notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    let result = service
        .verify(EMAIL, "123456", OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(result.unwrap_err(), OtpError::NotFound);
}

#[tokio::test]
async fn test_verify_wrong_purpose() {
    let (service, _repository, notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();

    let result = service.verify(EMAIL, &code, OtpPurpose::PasswordReset).await;
    assert_eq!(result.unwrap_err(), OtpError::NotFound);
}

#[tokio::test]
async fn test_verify_normalizes_email() {
    let (service, _repository, notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();

    let result = service
        .verify(" JANE@example.com", &code, OtpPurpose::ApplicationSubmission)
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_max_attempts_exceeded() {
    let (service, repository, notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();
    let wrong = wrong_code(&code);

    let first = service
        .verify(EMAIL, wrong, OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(first.unwrap_err(), OtpError::InvalidCode { remaining: 2 });

    let second = service
        .verify(EMAIL, wrong, OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(second.unwrap_err(), OtpError::InvalidCode { remaining: 1 });

    // The last allowed mismatch discards the record
    let third = service
        .verify(EMAIL, wrong, OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(third.unwrap_err(), OtpError::AttemptsExceeded);
    assert!(repository.is_empty().await);

    // Even the right code is useless now
    let fourth = service
        .verify(EMAIL, &code, OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(fourth.unwrap_err(), OtpError::NotFound);
}

#[tokio::test]
async fn test_correct_code_on_last_attempt() {
    let (service, repository, notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();

    for _ in 0..2 {
        let _ = service
            .verify(EMAIL, wrong_code(&code), OtpPurpose::ApplicationSubmission)
            .await;
    }

    let verified = service
        .verify(EMAIL, &code, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    assert_eq!(verified.attempts, MAX_ATTEMPTS);

    let record = repository.find_active(&key()).await.unwrap().unwrap();
    assert!(record.verified);
}

#[tokio::test]
async fn test_malformed_code_counts_as_attempt() {
    let (service, repository, _notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();

    for malformed in ["", "12ab56"] {
        let result = service
            .verify(EMAIL, malformed, OtpPurpose::ApplicationSubmission)
            .await;
        assert!(matches!(result, Err(OtpError::InvalidCode { .. })));
    }

    let record = repository.find_active(&key()).await.unwrap().unwrap();
    assert_eq!(record.attempts, 2);
}

#[tokio::test]
async fn test_verify_expired_code() {
    let (service, repository, notifier, clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();

    clock.advance(Duration::minutes(10) + Duration::seconds(1));

    let result = service
        .verify(EMAIL, &code, OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(result.unwrap_err(), OtpError::Expired);
    assert!(repository.is_empty().await);

    let again = service
        .verify(EMAIL, &code, OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(again.unwrap_err(), OtpError::NotFound);
}

#[tokio::test]
async fn test_verify_at_exact_expiry_is_accepted() {
    let (service, _repository, notifier, clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();

    clock.advance(Duration::minutes(10));

    let result = service
        .verify(EMAIL, &code, OtpPurpose::ApplicationSubmission)
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_expiry_checked_before_attempts() {
    let (service, repository, _notifier, clock) =
        build_service(false, OtpServiceConfig::default());

    let mut record = OtpRecord::new(
        &key(),
        "123456".to_string(),
        start_time(),
        Duration::minutes(10),
        MAX_ATTEMPTS,
    );
    record.attempts = MAX_ATTEMPTS;
    repository.insert(record).await.unwrap();

    clock.advance(Duration::minutes(11));

    let result = service
        .verify(EMAIL, "123456", OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(result.unwrap_err(), OtpError::Expired);
    assert!(repository.is_empty().await);
}

#[tokio::test]
async fn test_exhausted_record_is_discarded() {
    let (service, repository, _notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    let mut record = OtpRecord::new(
        &key(),
        "123456".to_string(),
        start_time(),
        Duration::minutes(10),
        MAX_ATTEMPTS,
    );
    record.attempts = MAX_ATTEMPTS;
    repository.insert(record).await.unwrap();

    let result = service
        .verify(EMAIL, "123456", OtpPurpose::ApplicationSubmission)
        .await;
    assert_eq!(result.unwrap_err(), OtpError::AttemptsExceeded);
    assert!(repository.is_empty().await);
}

#[tokio::test]
async fn test_old_code_rejected_after_reissue() {
    let (service, _repository, notifier, clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let old_code = notifier.get_sent_code(EMAIL).unwrap();

    clock.advance(Duration::minutes(2));
    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let new_code = notifier.get_sent_code(EMAIL).unwrap();

    if old_code != new_code {
        let result = service
            .verify(EMAIL, &old_code, OtpPurpose::ApplicationSubmission)
            .await;
        assert_eq!(result.unwrap_err(), OtpError::InvalidCode { remaining: 2 });
    }

    assert!(service
        .verify(EMAIL, &new_code, OtpPurpose::ApplicationSubmission)
        .await
        .is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_wrong_guesses_share_attempt_limit() {
    let (service, repository, notifier, _clock) =
        build_service(false, OtpServiceConfig::default());
    let service = Arc::new(service);

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();
    let wrong = wrong_code(&code);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .verify(EMAIL, wrong, OtpPurpose::ApplicationSubmission)
                .await
        }));
    }

    let mut invalid = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Err(OtpError::InvalidCode { .. }) => invalid += 1,
            Err(OtpError::AttemptsExceeded) | Err(OtpError::NotFound) => {}
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    // Only max_attempts - 1 guesses can ever be told "try again"
    assert_eq!(invalid, 2);
    assert!(repository.is_empty().await);
}

#[tokio::test]
async fn test_verify_store_failure() {
    let service = OtpService::new(
        Arc::new(FailingRepository),
        Arc::new(MockNotifier::new(false)),
        OtpServiceConfig::default(),
    );

    let result = service
        .verify(EMAIL, "123456", OtpPurpose::ApplicationSubmission)
        .await;
    assert!(matches!(result, Err(OtpError::Store { .. })));
}

#[tokio::test]
async fn test_verify_response_mapping() {
    let (service, _repository, notifier, _clock) =
        build_service(false, OtpServiceConfig::default());

    service
        .issue(EMAIL, OtpPurpose::ApplicationSubmission)
        .await
        .unwrap();
    let code = notifier.get_sent_code(EMAIL).unwrap();

    let failed = service
        .verify(EMAIL, wrong_code(&code), OtpPurpose::ApplicationSubmission)
        .await;
    let response = verify_response(&failed);
    assert!(!response.success);
    assert_eq!(response.verified, Some(false));
    assert_eq!(response.error_code.as_deref(), Some(error_codes::CODE_INVALID));
    assert!(response.message.contains("2 attempt(s) remaining"));

    let ok = service
        .verify(EMAIL, &code, OtpPurpose::ApplicationSubmission)
        .await;
    let response = verify_response(&ok);
    assert!(response.success);
    assert_eq!(response.verified, Some(true));
}
