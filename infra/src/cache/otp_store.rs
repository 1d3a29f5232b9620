//! Redis implementation of the OtpRepository trait
//!
//! Layout, all under the configured key prefix:
//! - `record:{purpose}:{email}` - hash holding one record
//! - `id:{uuid}` - string pointing at the record key, for id-based operations
//! - `expiry` - sorted set of record ids scored by `expires_at` (ms)
//!
//! The prefix is wrapped in braces (`{otp}:record:...`) so it acts as a Redis
//! Cluster hash tag: every key lands in one slot, which the scripts need since
//! they follow the id index to record keys not listed in `KEYS`. With an
//! empty prefix the keys are untagged and only a single node is supported.
//!
//! Every mutation is a Lua script, so each one is atomic on the server.
//! The insert script refuses to overwrite a record created after the given
//! cutoff. Id-based scripts check the hash's `id` field before touching it,
//! which keeps them from acting on a record that replaced the one the caller
//! read.
//! Keys carry a Redis TTL of `expires_at + expiry_grace_seconds` as a backstop
//! for missed sweeps.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::{AsyncCommands, Script};
use std::collections::HashMap;
use tracing::{debug, error, info};
use uuid::Uuid;

use otp_core::domain::entities::OtpRecord;
use otp_core::domain::value_objects::{OtpKey, OtpPurpose};
use otp_core::errors::OtpError;
use otp_core::repositories::{AttemptOutcome, OtpRepository, ReplaceOutcome};
use otp_shared::config::CacheConfig;
use otp_shared::utils::email::mask_email;

use super::redis_client::RedisClient;

const INSERT_SCRIPT: &str = r#"
local created = redis.call('HGET', KEYS[1], 'created_at')
if created and tonumber(created) > tonumber(ARGV[12]) then
    return tonumber(created)
end
local old = redis.call('HGET', KEYS[1], 'id')
if old then
    redis.call('DEL', ARGV[1] .. old)
    redis.call('ZREM', KEYS[2], old)
end
redis.call('DEL', KEYS[1])
redis.call('HSET', KEYS[1],
    'id', ARGV[2], 'email', ARGV[3], 'purpose', ARGV[4], 'code', ARGV[5],
    'created_at', ARGV[6], 'expires_at', ARGV[7], 'attempts', ARGV[8],
    'max_attempts', ARGV[9], 'verified', ARGV[10])
redis.call('PEXPIREAT', KEYS[1], ARGV[11])
redis.call('SET', ARGV[1] .. ARGV[2], KEYS[1])
redis.call('PEXPIREAT', ARGV[1] .. ARGV[2], ARGV[11])
redis.call('ZADD', KEYS[2], ARGV[7], ARGV[2])
return -1
"#;

const DELETE_BY_KEY_SCRIPT: &str = r#"
local id = redis.call('HGET', KEYS[1], 'id')
if not id then
    return 0
end
redis.call('DEL', KEYS[1], ARGV[1] .. id)
redis.call('ZREM', KEYS[2], id)
return 1
"#;

const DELETE_BY_ID_SCRIPT: &str = r#"
local key = redis.call('GET', KEYS[1])
redis.call('DEL', KEYS[1])
redis.call('ZREM', KEYS[2], ARGV[1])
if key and redis.call('HGET', key, 'id') == ARGV[1] then
    redis.call('DEL', key)
    return 1
end
return 0
"#;

const INCREMENT_ATTEMPTS_SCRIPT: &str = r#"
local key = redis.call('GET', KEYS[1])
if not key or redis.call('HGET', key, 'id') ~= ARGV[1] then
    return -1
end
local attempts = tonumber(redis.call('HGET', key, 'attempts'))
local max_attempts = tonumber(redis.call('HGET', key, 'max_attempts'))
if attempts >= max_attempts then
    return -2
end
return redis.call('HINCRBY', key, 'attempts', 1)
"#;

const MARK_VERIFIED_SCRIPT: &str = r#"
local key = redis.call('GET', KEYS[1])
if not key or redis.call('HGET', key, 'id') ~= ARGV[1] then
    return 0
end
redis.call('HSET', key, 'verified', '1')
return 1
"#;

const DELETE_EXPIRED_SCRIPT: &str = r#"
local ids = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
local deleted = 0
for _, id in ipairs(ids) do
    local id_key = ARGV[2] .. id
    local key = redis.call('GET', id_key)
    if key and redis.call('HGET', key, 'id') == id then
        redis.call('DEL', key)
        deleted = deleted + 1
    end
    redis.call('DEL', id_key)
    redis.call('ZREM', KEYS[1], id)
end
return deleted
"#;

const MISSING: i64 = -1;
const EXHAUSTED: i64 = -2;
const STORED: i64 = -1;

/// Redis implementation of OtpRepository
pub struct RedisOtpRepository {
    client: RedisClient,
    config: CacheConfig,
}

impl RedisOtpRepository {
    pub fn new(client: RedisClient, config: CacheConfig) -> Self {
        Self { client, config }
    }

    /// Hash key of the record stored under `key`
    pub fn record_key(&self, key: &OtpKey) -> String {
        record_key(&self.config, key)
    }

    pub fn id_key_prefix(&self) -> String {
        id_key_prefix(&self.config)
    }

    pub fn id_key(&self, id: Uuid) -> String {
        format!("{}{}", self.id_key_prefix(), id)
    }

    pub fn expiry_key(&self) -> String {
        expiry_key(&self.config)
    }

    /// When Redis may evict the keys of `record` on its own
    fn eviction_at_ms(&self, record: &OtpRecord) -> i64 {
        record.expires_at.timestamp_millis() + self.config.expiry_grace_seconds as i64 * 1000
    }

    /// Run the insert script; records created after `cutoff_ms` are kept
    async fn store(&self, record: &OtpRecord, cutoff_ms: i64) -> Result<i64, OtpError> {
        let mut conn = self.client.connection();

        Script::new(INSERT_SCRIPT)
            .key(self.record_key(&record.key()))
            .key(self.expiry_key())
            .arg(self.id_key_prefix())
            .arg(record.id.to_string())
            .arg(&record.email)
            .arg(record.purpose.as_str())
            .arg(&record.code)
            .arg(record.created_at.timestamp_millis())
            .arg(record.expires_at.timestamp_millis())
            .arg(record.attempts)
            .arg(record.max_attempts)
            .arg(if record.verified { "1" } else { "0" })
            .arg(self.eviction_at_ms(record))
            .arg(cutoff_ms)
            .invoke_async::<_, i64>(&mut conn)
            .await
            .map_err(|e| redis_error("Failed to store passcode", e))
    }
}

/// Hash key of the record stored under `key`
pub fn record_key(config: &CacheConfig, key: &OtpKey) -> String {
    config.make_key(&format!("record:{}:{}", key.purpose(), key.email()))
}

/// Prefix of the id index keys; the id is appended
pub fn id_key_prefix(config: &CacheConfig) -> String {
    config.make_key("id:")
}

/// Sorted set of record ids by expiry
pub fn expiry_key(config: &CacheConfig) -> String {
    config.make_key("expiry")
}

fn redis_error(context: &str, e: redis::RedisError) -> OtpError {
    error!(error = %e, "{}", context);
    OtpError::store(format!("{}: {}", context, e))
}

fn field<'a>(hash: &'a HashMap<String, String>, name: &str) -> Result<&'a str, OtpError> {
    hash.get(name)
        .map(String::as_str)
        .ok_or_else(|| OtpError::store(format!("Missing field '{}' in stored passcode", name)))
}

fn parse_field<T: std::str::FromStr>(hash: &HashMap<String, String>, name: &str) -> Result<T, OtpError> {
    field(hash, name)?
        .parse()
        .map_err(|_| OtpError::store(format!("Invalid field '{}' in stored passcode", name)))
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, OtpError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| OtpError::store(format!("Invalid timestamp {} in stored passcode", millis)))
}

fn parse_millis(hash: &HashMap<String, String>, name: &str) -> Result<DateTime<Utc>, OtpError> {
    millis_to_datetime(parse_field(hash, name)?)
}

/// Rebuild a record from its hash fields; an empty hash means no record
pub fn record_from_hash(hash: &HashMap<String, String>) -> Result<Option<OtpRecord>, OtpError> {
    if hash.is_empty() {
        return Ok(None);
    }

    let id = Uuid::parse_str(field(hash, "id")?)
        .map_err(|e| OtpError::store(format!("Invalid record UUID: {}", e)))?;
    let purpose = field(hash, "purpose")?
        .parse::<OtpPurpose>()
        .map_err(|e| OtpError::store(format!("Invalid purpose: {}", e)))?;

    Ok(Some(OtpRecord {
        id,
        email: field(hash, "email")?.to_string(),
        purpose,
        code: field(hash, "code")?.to_string(),
        created_at: parse_millis(hash, "created_at")?,
        expires_at: parse_millis(hash, "expires_at")?,
        attempts: parse_field(hash, "attempts")?,
        max_attempts: parse_field(hash, "max_attempts")?,
        verified: field(hash, "verified")? == "1",
    }))
}

/// Map the increment script's reply to an outcome
pub fn attempt_outcome(reply: i64) -> AttemptOutcome {
    match reply {
        MISSING => AttemptOutcome::Missing,
        EXHAUSTED => AttemptOutcome::Exhausted,
        n => AttemptOutcome::Recorded(n as u32),
    }
}

#[async_trait]
impl OtpRepository for RedisOtpRepository {
    async fn insert(&self, record: OtpRecord) -> Result<OtpRecord, OtpError> {
        self.store(&record, i64::MAX).await?;

        debug!(
            email = %mask_email(&record.email),
            record_id = %record.id,
            "Stored passcode record"
        );

        Ok(record)
    }

    async fn replace_unless_recent(
        &self,
        record: OtpRecord,
        cutoff: DateTime<Utc>,
    ) -> Result<ReplaceOutcome, OtpError> {
        let reply = self.store(&record, cutoff.timestamp_millis()).await?;
        if reply != STORED {
            return Ok(ReplaceOutcome::CoolingDown {
                created_at: millis_to_datetime(reply)?,
            });
        }

        debug!(
            email = %mask_email(&record.email),
            record_id = %record.id,
            "Stored passcode record"
        );

        Ok(ReplaceOutcome::Stored(record))
    }

    async fn find_active(&self, key: &OtpKey) -> Result<Option<OtpRecord>, OtpError> {
        let mut conn = self.client.connection();

        let hash: HashMap<String, String> = conn
            .hgetall(self.record_key(key))
            .await
            .map_err(|e| redis_error("Failed to find passcode", e))?;

        record_from_hash(&hash)
    }

    async fn delete_by_key(&self, key: &OtpKey) -> Result<u64, OtpError> {
        let mut conn = self.client.connection();

        let deleted: i64 = Script::new(DELETE_BY_KEY_SCRIPT)
            .key(self.record_key(key))
            .key(self.expiry_key())
            .arg(self.id_key_prefix())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("Failed to delete passcode", e))?;

        Ok(deleted as u64)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, OtpError> {
        let mut conn = self.client.connection();

        let deleted: i64 = Script::new(DELETE_BY_ID_SCRIPT)
            .key(self.id_key(id))
            .key(self.expiry_key())
            .arg(id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("Failed to delete passcode", e))?;

        Ok(deleted == 1)
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<AttemptOutcome, OtpError> {
        let mut conn = self.client.connection();

        let reply: i64 = Script::new(INCREMENT_ATTEMPTS_SCRIPT)
            .key(self.id_key(id))
            .arg(id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("Failed to increment attempts", e))?;

        Ok(attempt_outcome(reply))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<bool, OtpError> {
        let mut conn = self.client.connection();

        let marked: i64 = Script::new(MARK_VERIFIED_SCRIPT)
            .key(self.id_key(id))
            .arg(id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("Failed to mark passcode verified", e))?;

        Ok(marked == 1)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, OtpError> {
        let mut conn = self.client.connection();

        let deleted: i64 = Script::new(DELETE_EXPIRED_SCRIPT)
            .key(self.expiry_key())
            .arg(now.timestamp_millis())
            .arg(self.id_key_prefix())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("Failed to delete expired passcodes", e))?;

        if deleted > 0 {
            info!(deleted_count = deleted, "Deleted expired passcodes from Redis");
        }

        Ok(deleted as u64)
    }
}
