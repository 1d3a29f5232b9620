//! Store trait defining the interface for passcode record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::OtpRecord;
use crate::domain::value_objects::OtpKey;
use crate::errors::OtpError;

/// Result of an attempt increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempt was recorded; carries the post-increment count
    Recorded(u32),
    /// The record had already used all its attempts; nothing was written
    Exhausted,
    /// No record with that id exists (replaced, expired or deleted)
    Missing,
}

/// Result of a cooldown-guarded replace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The record was stored, replacing any older record under its key
    Stored(OtpRecord),
    /// A record created after the cutoff holds the key; nothing was written
    CoolingDown {
        /// Creation time of the record that blocked the write
        created_at: DateTime<Utc>,
    },
}

/// Store trait for passcode records, keyed by `(email, purpose)`
///
/// # Concurrency contract
/// - `insert` replaces any record stored under the same key in one atomic
///   step, so at most one record per key exists at any time.
/// - `replace_unless_recent` checks the stored record's `created_at` and
///   writes in the same atomic step, so concurrent issuers for one key cannot
///   both pass the resend cooldown.
/// - `increment_attempts` is a compare-and-swap: it only increments while
///   `attempts < max_attempts` and returns the value it wrote. Concurrent
///   verifications of the same record therefore never both observe the same
///   count.
/// - Id-based operations never touch a newer record that replaced the one the
///   caller read.
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Insert a record, replacing any record stored under its key
    ///
    /// # Returns
    /// * `Ok(OtpRecord)` - The stored record
    /// * `Err(OtpError::Store)` - The store rejected the write
    async fn insert(&self, record: OtpRecord) -> Result<OtpRecord, OtpError>;

    /// Insert a record unless the key holds one created after `cutoff`
    ///
    /// An older record under the key is replaced, as with `insert`.
    ///
    /// # Returns
    /// * `Ok(ReplaceOutcome::Stored)` - The record was written
    /// * `Ok(ReplaceOutcome::CoolingDown)` - A newer record blocked the write
    async fn replace_unless_recent(
        &self,
        record: OtpRecord,
        cutoff: DateTime<Utc>,
    ) -> Result<ReplaceOutcome, OtpError>;

    /// Find the record stored under `key`
    ///
    /// Expired records are still returned until deleted, so the caller can
    /// tell "expired" apart from "never issued".
    ///
    /// # Returns
    /// * `Ok(Some(OtpRecord))` - Record found
    /// * `Ok(None)` - No record for this key
    async fn find_active(&self, key: &OtpKey) -> Result<Option<OtpRecord>, OtpError>;

    /// Delete the record stored under `key` (idempotent)
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of records deleted (0 or 1)
    async fn delete_by_key(&self, key: &OtpKey) -> Result<u64, OtpError>;

    /// Delete the record with `id` (idempotent)
    ///
    /// # Returns
    /// * `Ok(true)` - The record existed and was deleted
    /// * `Ok(false)` - No record with that id
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, OtpError>;

    /// Record one verification attempt on the record with `id`
    async fn increment_attempts(&self, id: Uuid) -> Result<AttemptOutcome, OtpError>;

    /// Flag the record with `id` as verified
    ///
    /// # Returns
    /// * `Ok(true)` - The record was found and flagged
    /// * `Ok(false)` - No record with that id
    async fn mark_verified(&self, id: Uuid) -> Result<bool, OtpError>;

    /// Delete every record with `expires_at <= now`, verified or not
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of records deleted
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, OtpError>;
}

#[async_trait]
impl<T: OtpRepository + ?Sized> OtpRepository for Box<T> {
    async fn insert(&self, record: OtpRecord) -> Result<OtpRecord, OtpError> {
        (**self).insert(record).await
    }

    async fn replace_unless_recent(
        &self,
        record: OtpRecord,
        cutoff: DateTime<Utc>,
    ) -> Result<ReplaceOutcome, OtpError> {
        (**self).replace_unless_recent(record, cutoff).await
    }

    async fn find_active(&self, key: &OtpKey) -> Result<Option<OtpRecord>, OtpError> {
        (**self).find_active(key).await
    }

    async fn delete_by_key(&self, key: &OtpKey) -> Result<u64, OtpError> {
        (**self).delete_by_key(key).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, OtpError> {
        (**self).delete_by_id(id).await
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<AttemptOutcome, OtpError> {
        (**self).increment_attempts(id).await
    }

    async fn mark_verified(&self, id: Uuid) -> Result<bool, OtpError> {
        (**self).mark_verified(id).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, OtpError> {
        (**self).delete_expired(now).await
    }
}
