//! Traits for delivery integration

use async_trait::async_trait;

use crate::domain::value_objects::OtpPurpose;

/// Delivers a passcode to its owner
///
/// Delivery is all-or-nothing: `Ok` means the provider accepted the message,
/// `Err` carries the provider's reason. Implementations apply their own
/// timeouts; the service does not retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `code` to `email` for `purpose`, returning the provider message id
    async fn send(&self, email: &str, code: &str, purpose: &OtpPurpose) -> Result<String, String>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Box<T> {
    async fn send(&self, email: &str, code: &str, purpose: &OtpPurpose) -> Result<String, String> {
        (**self).send(email, code, purpose).await
    }
}
