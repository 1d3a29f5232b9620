//! Cache module - Redis-backed passcode store
//!
//! This module provides the Redis client with connection retry and the
//! `OtpRepository` implementation built on Lua scripts.

pub mod otp_store;
pub mod redis_client;

pub use otp_store::RedisOtpRepository;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use otp_shared::config::CacheConfig;
