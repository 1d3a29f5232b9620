//! OTP lifecycle configuration module

use serde::{Deserialize, Serialize};

/// What happens to a verified record once it has been checked by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifiedRecordPolicy {
    /// Keep the verified record until it expires; the gate answers `true` until then
    RetainUntilExpiry,
    /// Delete the verified record when the downstream action consumes it
    ConsumeOnUse,
}

impl Default for VerifiedRecordPolicy {
    fn default() -> Self {
        VerifiedRecordPolicy::RetainUntilExpiry
    }
}

/// OTP issuance and verification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Seconds a passcode stays valid after issuance
    #[serde(default = "default_code_ttl")]
    pub code_ttl_seconds: i64,

    /// Minimum seconds between two issuances for the same email and purpose
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_seconds: i64,

    /// Maximum verification attempts per passcode
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lifetime of verified records
    #[serde(default)]
    pub verified_policy: VerifiedRecordPolicy,

    /// Expired record sweeping
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Passcode delivery
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_ttl_seconds: default_code_ttl(),
            resend_cooldown_seconds: default_resend_cooldown(),
            max_attempts: default_max_attempts(),
            verified_policy: VerifiedRecordPolicy::default(),
            cleanup: CleanupConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

/// Background sweeping of expired records
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Whether the background sweeper runs
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,

    /// How often to run the sweep (in seconds)
    #[serde(default = "default_cleanup_interval")]
    pub interval_seconds: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_cleanup_enabled(),
            interval_seconds: default_cleanup_interval(),
        }
    }
}

/// Notifier provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierProvider {
    /// Log the delivery instead of sending (development)
    Log,
    /// POST to a transactional email HTTP API
    Http,
}

impl Default for NotifierProvider {
    fn default() -> Self {
        NotifierProvider::Log
    }
}

/// Notifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    /// Delivery provider
    #[serde(default)]
    pub provider: NotifierProvider,

    /// Endpoint of the email API (http provider)
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token for the email API (http provider)
    #[serde(default)]
    pub api_key: String,

    /// Sender address placed on outgoing messages
    #[serde(default = "default_sender")]
    pub sender: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            provider: NotifierProvider::default(),
            endpoint: String::new(),
            api_key: String::new(),
            sender: default_sender(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_code_ttl() -> i64 {
    600 // 10 minutes
}

fn default_resend_cooldown() -> i64 {
    120 // 2 minutes
}

fn default_max_attempts() -> u32 {
    3
}

fn default_cleanup_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}

fn default_sender() -> String {
    String::from("no-reply@localhost")
}

fn default_request_timeout() -> u64 {
    10
}
