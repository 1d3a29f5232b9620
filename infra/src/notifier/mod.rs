//! Email delivery of passcodes
//!
//! - **Log notifier**: prints the email for development
//! - **HTTP notifier**: POSTs to a transactional email API
//!
//! Both render the same message from [`EmailTemplate`].

pub mod http_email;
pub mod log_notifier;
pub mod message;

pub use http_email::HttpEmailNotifier;
pub use log_notifier::LogNotifier;
pub use message::{EmailMessage, EmailTemplate};

use otp_shared::config::{NotifierProvider, OtpConfig};

use crate::{DynNotifier, InfrastructureError};

/// Create the notifier selected by `config.notifier.provider`
pub fn create_notifier(config: &OtpConfig) -> Result<DynNotifier, InfrastructureError> {
    let template = EmailTemplate::from_config(config);

    match config.notifier.provider {
        NotifierProvider::Log => {
            tracing::warn!("Using log notifier; verification emails are printed, not sent");
            Ok(Box::new(LogNotifier::new(template)))
        }
        NotifierProvider::Http => Ok(Box::new(HttpEmailNotifier::new(&config.notifier, template)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_log_notifier_by_default() {
        assert!(create_notifier(&OtpConfig::default()).is_ok());
    }

    #[test]
    fn test_http_notifier_needs_endpoint() {
        let mut config = OtpConfig::default();
        config.notifier.provider = NotifierProvider::Http;
        assert!(create_notifier(&config).is_err());

        config.notifier.endpoint = "https://mail.example.com/v1/send".to_string();
        assert!(create_notifier(&config).is_ok());
    }
}
