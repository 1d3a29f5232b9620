//! Redis configuration module

use serde::{Deserialize, Serialize};

/// Redis configuration used by the Redis-backed OTP store
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout in seconds
    pub connection_timeout: u64,

    /// Key prefix applied to every OTP key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Seconds a record survives in Redis past its expiry before Redis evicts it
    ///
    /// Keeps expired records visible long enough for verification to report
    /// them as expired rather than missing.
    #[serde(default = "default_expiry_grace")]
    pub expiry_grace_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://localhost:6379"),
            connection_timeout: 5,
            key_prefix: default_key_prefix(),
            expiry_grace_seconds: default_expiry_grace(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix for all cache keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Generate a cache key with prefix
    ///
    /// The prefix is written as a hash tag (`{otp}:key`), so all keys built
    /// from one config map to the same Redis Cluster slot.
    pub fn make_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{{{}}}:{}", self.key_prefix, key)
        }
    }
}

fn default_key_prefix() -> String {
    String::from("otp")
}

fn default_expiry_grace() -> u64 {
    3600 // 1 hour
}
