//! Verification gate and status queries

use otp_shared::config::VerifiedRecordPolicy;
use otp_shared::utils::email::mask_email;
use tracing::info;

use crate::domain::value_objects::{OtpKey, OtpPurpose};
use crate::errors::OtpResult;
use crate::repositories::OtpRepository;

use super::service::OtpService;
use super::traits::Notifier;
use super::types::OtpStatus;

impl<R: OtpRepository, N: Notifier> OtpService<R, N> {
    /// Whether `email` is currently verified for `purpose`
    ///
    /// True iff a record exists, is verified and has not reached `expires_at`.
    /// Never writes.
    pub async fn is_verified(&self, email: &str, purpose: OtpPurpose) -> OtpResult<bool> {
        let key = OtpKey::new(email, purpose);
        let now = self.clock.now();

        Ok(self
            .repository
            .find_active(&key)
            .await?
            .map(|record| record.is_verified_at(now))
            .unwrap_or(false))
    }

    /// Gate check for the downstream action
    ///
    /// Under `ConsumeOnUse` a verified record is deleted, so one verification
    /// authorizes one action. Under `RetainUntilExpiry` this is `is_verified`.
    pub async fn consume_verification(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> OtpResult<bool> {
        let key = OtpKey::new(email, purpose);
        let now = self.clock.now();

        let record = match self.repository.find_active(&key).await? {
            Some(record) if record.is_verified_at(now) => record,
            _ => return Ok(false),
        };

        if self.config.verified_policy == VerifiedRecordPolicy::ConsumeOnUse {
            // Losing a race with another consumer means this one is not authorized
            if !self.repository.delete_by_id(record.id).await? {
                return Ok(false);
            }
            info!(
                email = %mask_email(key.email()),
                record_id = %record.id,
                event = "otp_consumed",
                "Verification consumed"
            );
        }

        Ok(true)
    }

    /// Snapshot of the record for `(email, purpose)`, if any
    pub async fn status(&self, email: &str, purpose: OtpPurpose) -> OtpResult<Option<OtpStatus>> {
        let key = OtpKey::new(email, purpose);
        let now = self.clock.now();

        Ok(self
            .repository
            .find_active(&key)
            .await?
            .map(|record| OtpStatus {
                record_id: record.id,
                expires_at: record.expires_at,
                remaining_attempts: record.remaining_attempts(),
                verified: record.is_verified_at(now),
                expired: record.is_expired_at(now),
            }))
    }
}
