//! Email content for passcode delivery

use serde::Serialize;

use otp_core::domain::value_objects::OtpPurpose;
use otp_shared::config::OtpConfig;

/// Outgoing verification email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Renders verification emails with the configured sender and limits
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    sender: String,
    validity_minutes: i64,
    max_attempts: u32,
}

impl EmailTemplate {
    pub fn new(sender: impl Into<String>, validity_minutes: i64, max_attempts: u32) -> Self {
        Self {
            sender: sender.into(),
            validity_minutes,
            max_attempts,
        }
    }

    pub fn from_config(config: &OtpConfig) -> Self {
        // Round up so a 90s code is not advertised as 1 minute
        let minutes = (config.code_ttl_seconds + 59) / 60;
        Self::new(
            config.notifier.sender.clone(),
            minutes.max(1),
            config.max_attempts,
        )
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Build the verification email carrying `code`
    pub fn render(&self, to: &str, code: &str, purpose: &OtpPurpose) -> EmailMessage {
        let action = match purpose {
            OtpPurpose::ApplicationSubmission => "submit your application".to_string(),
            OtpPurpose::PasswordReset => "reset your password".to_string(),
            OtpPurpose::Custom(tag) => format!("continue ({})", tag.replace('_', " ")),
        };
        let tries = if self.max_attempts == 1 {
            "once".to_string()
        } else {
            format!("{} times", self.max_attempts)
        };

        EmailMessage {
            from: self.sender.clone(),
            to: to.to_string(),
            subject: format!("Your verification code is {}", code),
            text: format!(
                "Use the code {} to {}.\n\nThe code expires in {} minutes and can be tried {}. \
                 If you did not request it, you can ignore this email.",
                code, action, self.validity_minutes, tries
            ),
        }
    }
}
