//! Background cleanup of expired passcodes
//!
//! Wraps `OtpService::sweep_expired` in a periodic tokio task. The sweep itself
//! is idempotent, so overlapping or missed ticks are harmless.

use std::sync::Arc;

use otp_shared::config::CleanupConfig;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::OtpError;
use crate::repositories::OtpRepository;

use super::service::OtpService;
use super::traits::Notifier;

/// Service for sweeping expired passcode records on a schedule
pub struct OtpCleanupService<R: OtpRepository + 'static, N: Notifier + 'static> {
    service: Arc<OtpService<R, N>>,
    config: CleanupConfig,
}

impl<R: OtpRepository, N: Notifier> OtpCleanupService<R, N> {
    /// Create a new cleanup service
    pub fn new(service: Arc<OtpService<R, N>>, config: CleanupConfig) -> Self {
        Self { service, config }
    }

    /// Run a single cleanup cycle
    ///
    /// # Returns
    /// * `Ok(CleanupResult)` - Summary of the cycle; store failures are
    ///   collected in `errors` instead of aborting
    /// * `Err(OtpError)` - Reserved for failures outside the sweep itself
    pub async fn run_cleanup(&self) -> Result<CleanupResult, OtpError> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let mut result = CleanupResult::default();

        match self.service.sweep_expired().await {
            Ok(count) => {
                result.expired_records_deleted = count;
            }
            Err(e) => {
                error!(error = %e, event = "otp_cleanup_failed", "Failed to sweep expired passcodes");
                result.errors.push(format!("Expired passcode cleanup error: {}", e));
            }
        }

        Ok(result)
    }

    /// Start the cleanup service as a background task
    ///
    /// Returns `None` when cleanup is disabled. The first sweep runs
    /// immediately, then every `interval_seconds`.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Passcode cleanup service is disabled");
            return None;
        }

        // tokio::time::interval panics on a zero period
        let period = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = period.as_secs(),
                event = "otp_cleanup_started",
                "Passcode cleanup service started"
            );

            let mut interval_timer = tokio::time::interval(period);

            loop {
                interval_timer.tick().await;

                match self.run_cleanup().await {
                    Ok(result) => {
                        if !result.is_success() {
                            warn!("Cleanup completed with errors: {:?}", result.errors);
                        }
                    }
                    Err(e) => {
                        error!("Passcode cleanup cycle failed: {}", e);
                    }
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of expired passcode records deleted
    pub expired_records_deleted: u64,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
