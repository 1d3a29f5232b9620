//! Passcode verification

use otp_shared::utils::email::mask_email;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::value_objects::{OtpKey, OtpPurpose};
use crate::errors::{OtpError, OtpResult};
use crate::repositories::{AttemptOutcome, OtpRepository};

use super::service::OtpService;
use super::traits::Notifier;
use super::types::VerifiedOtp;

impl<R: OtpRepository, N: Notifier> OtpService<R, N> {
    /// Verify a passcode submitted for an email address
    ///
    /// This method:
    /// 1. Looks up the record for `(email, purpose)`
    /// 2. Discards it if expired or out of attempts
    /// 3. Records the attempt before comparing, so a correct first guess leaves `attempts = 1`
    /// 4. Compares the code in constant time
    /// 5. Flags the record as verified on a match, keeping it until expiry
    ///
    /// The mismatch that uses the last attempt deletes the record and returns
    /// `AttemptsExceeded` rather than `InvalidCode { remaining: 0 }`.
    ///
    /// # Returns
    ///
    /// * `Ok(VerifiedOtp)` - The code matched
    /// * `Err(OtpError)` - `NotFound`, `Expired`, `AttemptsExceeded`, `InvalidCode` or `Store`
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> OtpResult<VerifiedOtp> {
        let key = OtpKey::new(email, purpose);
        let masked = mask_email(key.email());
        let now = self.clock.now();

        let record = match self.repository.find_active(&key).await? {
            Some(record) => record,
            None => {
                debug!(
                    email = %masked,
                    purpose = %key.purpose(),
                    event = "otp_not_found",
                    "No passcode on record"
                );
                return Err(OtpError::NotFound);
            }
        };

        if record.is_expired_at(now) {
            self.discard(record.id, &masked, "otp_expired").await?;
            return Err(OtpError::Expired);
        }

        if record.is_exhausted() {
            self.discard(record.id, &masked, "otp_attempts_exceeded")
                .await?;
            return Err(OtpError::AttemptsExceeded);
        }

        let attempts = match self.repository.increment_attempts(record.id).await? {
            AttemptOutcome::Recorded(attempts) => attempts,
            AttemptOutcome::Exhausted => {
                // A concurrent verification used the last attempt first
                self.discard(record.id, &masked, "otp_attempts_exceeded")
                    .await?;
                return Err(OtpError::AttemptsExceeded);
            }
            AttemptOutcome::Missing => return Err(OtpError::NotFound),
        };

        if !record.matches_code(code) {
            let remaining = record.max_attempts.saturating_sub(attempts);
            if remaining == 0 {
                self.discard(record.id, &masked, "otp_attempts_exceeded")
                    .await?;
                return Err(OtpError::AttemptsExceeded);
            }

            warn!(
                email = %masked,
                record_id = %record.id,
                attempts = attempts,
                remaining_attempts = remaining,
                event = "otp_invalid_code",
                "Invalid passcode submitted"
            );
            return Err(OtpError::InvalidCode { remaining });
        }

        if !self.repository.mark_verified(record.id).await? {
            // Replaced or swept between the increment and here
            return Err(OtpError::NotFound);
        }

        info!(
            email = %masked,
            purpose = %record.purpose,
            record_id = %record.id,
            attempts = attempts,
            event = "otp_verified",
            "Passcode verified"
        );

        Ok(VerifiedOtp {
            record_id: record.id,
            attempts,
            verified: true,
        })
    }

    /// Delete a record that can no longer be verified
    async fn discard(&self, id: Uuid, masked_email: &str, reason: &'static str) -> OtpResult<()> {
        warn!(
            email = %masked_email,
            record_id = %id,
            event = reason,
            "Discarding passcode"
        );
        self.repository.delete_by_id(id).await.map_err(|e| {
            error!(
                record_id = %id,
                error = %e,
                event = "otp_delete_failed",
                "Failed to delete passcode"
            );
            e
        })?;
        Ok(())
    }
}
