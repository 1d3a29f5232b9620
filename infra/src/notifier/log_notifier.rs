//! Log-only notifier for development
//!
//! Writes the verification email to stdout instead of sending it, so a
//! developer can read the code off the console.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use otp_core::domain::value_objects::OtpPurpose;
use otp_core::Notifier;
use otp_shared::utils::email::mask_email;

use super::message::EmailTemplate;

/// Notifier that logs deliveries instead of sending them
#[derive(Clone)]
pub struct LogNotifier {
    template: EmailTemplate,
    /// Number of messages accepted so far
    message_count: Arc<AtomicU64>,
    /// Reject every delivery (for testing)
    simulate_failure: bool,
    /// Print the full message to stdout
    console_output: bool,
}

impl LogNotifier {
    pub fn new(template: EmailTemplate) -> Self {
        Self::with_options(template, true, false)
    }

    pub fn with_options(template: EmailTemplate, console_output: bool, simulate_failure: bool) -> Self {
        Self {
            template,
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure,
            console_output,
        }
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    pub fn set_simulate_failure(&mut self, simulate: bool) {
        self.simulate_failure = simulate;
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: &str, code: &str, purpose: &OtpPurpose) -> Result<String, String> {
        let masked = mask_email(email);

        if self.simulate_failure {
            warn!(email = %masked, "Log notifier simulating delivery failure");
            return Err("Simulated delivery failure".to_string());
        }

        let message = self.template.render(email, code, purpose);
        let message_id = format!("log-{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;

        if self.console_output {
            println!("\n{}", "=".repeat(60));
            println!("LOG NOTIFIER - MESSAGE #{}", count);
            println!("{}", "=".repeat(60));
            println!("From: {}", message.from);
            println!("To: {}", message.to);
            println!("Subject: {}", message.subject);
            println!("Message ID: {}", message_id);
            println!("\n{}", message.text);
            println!("{}\n", "=".repeat(60));
        }

        info!(
            target: "otp_notifier",
            provider = "log",
            email = %masked,
            purpose = %purpose,
            message_id = %message_id,
            count = count,
            "Verification email logged"
        );

        Ok(message_id)
    }
}
