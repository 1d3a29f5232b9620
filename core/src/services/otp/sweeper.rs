//! Expired record sweeping

use tracing::{debug, info};

use crate::errors::OtpResult;
use crate::repositories::OtpRepository;

use super::service::OtpService;
use super::traits::Notifier;

impl<R: OtpRepository, N: Notifier> OtpService<R, N> {
    /// Delete every record whose `expires_at` is at or before now
    ///
    /// Verified records are included. Running it twice in a row deletes
    /// nothing the second time.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of records deleted
    pub async fn sweep_expired(&self) -> OtpResult<u64> {
        let now = self.clock.now();
        let deleted = self.repository.delete_expired(now).await?;

        if deleted > 0 {
            info!(
                deleted = deleted,
                event = "otp_swept",
                "Deleted expired passcodes"
            );
        } else {
            debug!(event = "otp_swept", "No expired passcodes to delete");
        }

        Ok(deleted)
    }
}
