//! HTTP email API notifier
//!
//! POSTs the verification email as JSON to a transactional email endpoint
//! with a bearer token. A single request is made per delivery; the request
//! timeout bounds how long issuance waits on the provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use otp_core::domain::value_objects::OtpPurpose;
use otp_core::Notifier;
use otp_shared::config::NotifierConfig;
use otp_shared::utils::email::mask_email;

use super::message::{EmailMessage, EmailTemplate};
use crate::InfrastructureError;

/// Longest provider error body carried into the failure reason
const MAX_ERROR_BODY: usize = 200;

/// Accepted-message response; providers differ on the id field name
#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    id: Option<String>,
    message_id: Option<String>,
}

/// Notifier backed by an HTTP email API
pub struct HttpEmailNotifier {
    client: Client,
    endpoint: String,
    api_key: String,
    template: EmailTemplate,
}

impl HttpEmailNotifier {
    pub fn new(config: &NotifierConfig, template: EmailTemplate) -> Result<Self, InfrastructureError> {
        if config.endpoint.trim().is_empty() {
            return Err(InfrastructureError::Config(
                "Email API endpoint is required for the http notifier".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;

        info!(
            endpoint = %config.endpoint,
            sender = %template.sender(),
            "HTTP email notifier initialized"
        );

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            template,
        })
    }

    async fn post(&self, message: &EmailMessage) -> Result<String, InfrastructureError> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(InfrastructureError::Notifier(format!(
                "Email API returned {}: {}",
                status,
                truncate(&body, MAX_ERROR_BODY)
            )));
        }

        Ok(message_id_from_body(&body))
    }
}

/// Provider message id from a success body, or a generated one
fn message_id_from_body(body: &str) -> String {
    let parsed: SendResponse = serde_json::from_str(body).unwrap_or_default();
    parsed
        .id
        .or(parsed.message_id)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("http-{}", Uuid::new_v4()))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[async_trait]
impl Notifier for HttpEmailNotifier {
    async fn send(&self, email: &str, code: &str, purpose: &OtpPurpose) -> Result<String, String> {
        let masked = mask_email(email);
        let message = self.template.render(email, code, purpose);

        debug!(email = %masked, purpose = %purpose, "Sending verification email");

        match self.post(&message).await {
            Ok(message_id) => {
                info!(
                    target: "otp_notifier",
                    provider = "http",
                    email = %masked,
                    message_id = %message_id,
                    "Verification email accepted"
                );
                Ok(message_id)
            }
            Err(e) => {
                error!(
                    target: "otp_notifier",
                    provider = "http",
                    email = %masked,
                    error = %e,
                    "Verification email rejected"
                );
                Err(e.to_string())
            }
        }
    }
}
