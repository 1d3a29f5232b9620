//! Passcode issuance

use chrono::Duration;
use otp_shared::utils::email::{is_valid_email, mask_email};
use tracing::{error, info, warn};

use crate::domain::entities::OtpRecord;
use crate::domain::value_objects::{OtpKey, OtpPurpose};
use crate::errors::{OtpError, OtpResult};
use crate::repositories::{OtpRepository, ReplaceOutcome};

use super::generator::generate_secure_code;
use super::service::OtpService;
use super::traits::Notifier;
use super::types::IssuedOtp;

impl<R: OtpRepository, N: Notifier> OtpService<R, N> {
    /// Issue a passcode to an email address
    ///
    /// This method:
    /// 1. Rejects the request if a code for the same key was issued within the cooldown
    /// 2. Generates a new code
    /// 3. Replaces any previous record for the key, re-checking the cooldown
    ///    in the same store operation
    /// 4. Sends the code through the notifier
    /// 5. Deletes the new record again if delivery fails
    ///
    /// No lock is held while the notifier runs.
    ///
    /// # Arguments
    ///
    /// * `email` - Address to verify (normalized before use)
    /// * `purpose` - Workflow the code authorizes
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedOtp)` - The code was stored and delivered
    /// * `Err(OtpError)` - `InvalidEmail`, `RateLimited`, `DeliveryFailed` or `Store`
    pub async fn issue(&self, email: &str, purpose: OtpPurpose) -> OtpResult<IssuedOtp> {
        if !is_valid_email(email) {
            warn!(
                email = %mask_email(email),
                event = "invalid_email",
                "Rejected passcode request for malformed email"
            );
            return Err(OtpError::InvalidEmail);
        }

        let key = OtpKey::new(email, purpose);
        let masked = mask_email(key.email());
        let now = self.clock.now();
        let cooldown = self.config.resend_cooldown();

        // Early exit only; the replace below re-checks atomically
        if let Some(existing) = self.repository.find_active(&key).await? {
            if existing.is_within_cooldown(now, cooldown) {
                let remaining = existing.cooldown_remaining(now, cooldown);
                return Err(self.rate_limited(&masked, &key, remaining));
            }
        }

        let record = OtpRecord::new(
            &key,
            generate_secure_code(),
            now,
            self.config.code_ttl(),
            self.config.max_attempts,
        );

        let outcome = self
            .repository
            .replace_unless_recent(record, now - cooldown)
            .await
            .map_err(|e| {
                error!(
                    email = %masked,
                    error = %e,
                    event = "otp_storage_failed",
                    "Failed to store passcode"
                );
                e
            })?;

        // A concurrent request for the same key stored its code first
        let record = match outcome {
            ReplaceOutcome::Stored(record) => record,
            ReplaceOutcome::CoolingDown { created_at } => {
                let remaining = (created_at + cooldown - now).max(Duration::zero());
                return Err(self.rate_limited(&masked, &key, remaining));
            }
        };

        info!(
            email = %masked,
            purpose = %record.purpose,
            record_id = %record.id,
            event = "otp_generated",
            "Generated new passcode"
        );

        match self
            .notifier
            .send(&record.email, &record.code, &record.purpose)
            .await
        {
            Ok(message_id) => {
                info!(
                    email = %masked,
                    record_id = %record.id,
                    message_id = %message_id,
                    event = "otp_sent",
                    "Passcode delivered"
                );
                Ok(IssuedOtp {
                    record_id: record.id,
                    email: record.email,
                    purpose: record.purpose,
                    expires_at: record.expires_at,
                    next_resend_at: record.created_at + cooldown,
                    message_id,
                })
            }
            Err(reason) => {
                error!(
                    email = %masked,
                    record_id = %record.id,
                    error = %reason,
                    event = "otp_delivery_failed",
                    "Passcode delivery failed, removing record"
                );
                // Left in place, the record would be unverifiable and would
                // block re-issuance until the cooldown ends
                if let Err(e) = self.repository.delete_by_id(record.id).await {
                    error!(
                        record_id = %record.id,
                        error = %e,
                        event = "otp_compensation_failed",
                        "Failed to remove undelivered passcode"
                    );
                }
                Err(OtpError::DeliveryFailed { reason })
            }
        }
    }

    fn rate_limited(&self, masked: &str, key: &OtpKey, remaining: Duration) -> OtpError {
        // Round up so callers never retry a second too early
        let retry_after_seconds = (remaining.num_milliseconds() + 999) / 1000;
        warn!(
            email = %masked,
            purpose = %key.purpose(),
            retry_after_seconds = retry_after_seconds,
            event = "rate_limit_exceeded",
            "Passcode request rate limit exceeded"
        );
        OtpError::RateLimited {
            retry_after_seconds,
        }
    }
}
