//! Integration tests for wiring the passcode service from configuration

use anyhow::Result;
use tokio_test::{assert_err, assert_ok};

use otp_core::domain::value_objects::OtpPurpose;
use otp_core::OtpError;
use otp_infra::{build_services, config, notifier::create_notifier};
use otp_shared::config::{AppConfig, NotifierProvider, StoreBackend};

fn dev_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.store = StoreBackend::Memory;
    config.otp.notifier.provider = NotifierProvider::Log;
    config
}

#[tokio::test]
async fn test_memory_store_with_log_notifier() -> Result<()> {
    let services = build_services(&dev_config()).await?;
    let service = &services.otp_service;

    let issued = service
        .issue("Jane@Example.com", OtpPurpose::ApplicationSubmission)
        .await?;
    assert_eq!(issued.email, "jane@example.com");
    assert!(issued.message_id.starts_with("log-"));

    // Second request inside the cooldown
    let again = service
        .issue("jane@example.com", OtpPurpose::ApplicationSubmission)
        .await;
    assert!(matches!(again, Err(OtpError::RateLimited { .. })));

    // Six digits never contain a letter
    let wrong = service
        .verify("jane@example.com", "abcdef", OtpPurpose::ApplicationSubmission)
        .await;
    assert!(matches!(wrong, Err(OtpError::InvalidCode { remaining: 2 })));

    assert!(!service
        .is_verified("jane@example.com", OtpPurpose::ApplicationSubmission)
        .await?);

    let status = service
        .status("jane@example.com", OtpPurpose::ApplicationSubmission)
        .await?
        .expect("record should exist");
    assert_eq!(status.remaining_attempts, 2);
    assert!(!status.verified);

    Ok(())
}

#[tokio::test]
async fn test_cleanup_runs_against_configured_store() -> Result<()> {
    let services = build_services(&dev_config()).await?;

    services
        .otp_service
        .issue("jane@example.com", OtpPurpose::PasswordReset)
        .await?;

    // Nothing has expired yet
    let result = services.cleanup.run_cleanup().await?;
    assert!(result.is_success());
    assert_eq!(result.expired_records_deleted, 0);

    Ok(())
}

#[tokio::test]
async fn test_http_notifier_without_endpoint_is_rejected() {
    let mut app_config = dev_config();
    app_config.otp.notifier.provider = NotifierProvider::Http;

    assert!(create_notifier(&app_config.otp).is_err());
    assert_err!(config::validate(&app_config));
    assert!(build_services(&app_config).await.is_err());
}

#[tokio::test]
async fn test_http_notifier_with_endpoint_is_built() {
    let mut app_config = dev_config();
    app_config.otp.notifier.provider = NotifierProvider::Http;
    app_config.otp.notifier.endpoint = "https://mail.example.com/v1/send".to_string();

    assert_ok!(config::validate(&app_config));
    assert_ok!(build_services(&app_config).await);
}
