//! Passcode service: shared state for issuance, verification, gate and sweeping
//!
//! The operations themselves live in sibling modules (`issuance`,
//! `verification`, `gate`, `sweeper`), each adding an `impl` block here.

use std::sync::Arc;

use crate::repositories::OtpRepository;

use super::clock::{Clock, SystemClock};
use super::config::OtpServiceConfig;
use super::traits::Notifier;

/// Passcode service for email verification
pub struct OtpService<R: OtpRepository, N: Notifier> {
    /// Record store
    pub(super) repository: Arc<R>,
    /// Delivery channel for issued codes
    pub(super) notifier: Arc<N>,
    /// Time source for expiry and cooldown decisions
    pub(super) clock: Arc<dyn Clock>,
    /// Service configuration
    pub(super) config: OtpServiceConfig,
}

impl<R: OtpRepository, N: Notifier> OtpService<R, N> {
    /// Create a new passcode service on the system clock
    ///
    /// # Arguments
    ///
    /// * `repository` - Record store implementation
    /// * `notifier` - Delivery implementation
    /// * `config` - Service configuration
    pub fn new(repository: Arc<R>, notifier: Arc<N>, config: OtpServiceConfig) -> Self {
        Self::with_clock(repository, notifier, config, Arc::new(SystemClock))
    }

    /// Create a new passcode service with an explicit clock
    pub fn with_clock(
        repository: Arc<R>,
        notifier: Arc<N>,
        config: OtpServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            notifier,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &OtpServiceConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }
}
