//! In-memory implementation of OtpRepository
//!
//! Every operation runs under a single write lock, which gives the atomic
//! replace and compare-and-swap guarantees the trait requires for a single
//! process. Multi-instance deployments use the MySQL or Redis stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::OtpRecord;
use crate::domain::value_objects::OtpKey;
use crate::errors::OtpError;

use super::r#trait::{AttemptOutcome, OtpRepository, ReplaceOutcome};

/// Process-local passcode store
#[derive(Clone, Default)]
pub struct InMemoryOtpRepository {
    records: Arc<RwLock<HashMap<OtpKey, OtpRecord>>>,
}

impl InMemoryOtpRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired ones included
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn key_of(records: &HashMap<OtpKey, OtpRecord>, id: Uuid) -> Option<OtpKey> {
        records
            .iter()
            .find(|(_, record)| record.id == id)
            .map(|(key, _)| key.clone())
    }
}

#[async_trait]
impl OtpRepository for InMemoryOtpRepository {
    async fn insert(&self, record: OtpRecord) -> Result<OtpRecord, OtpError> {
        let mut records = self.records.write().await;
        records.insert(record.key(), record.clone());
        Ok(record)
    }

    async fn replace_unless_recent(
        &self,
        record: OtpRecord,
        cutoff: DateTime<Utc>,
    ) -> Result<ReplaceOutcome, OtpError> {
        let mut records = self.records.write().await;
        let key = record.key();

        if let Some(existing) = records.get(&key) {
            if existing.created_at > cutoff {
                return Ok(ReplaceOutcome::CoolingDown {
                    created_at: existing.created_at,
                });
            }
        }

        records.insert(key, record.clone());
        Ok(ReplaceOutcome::Stored(record))
    }

    async fn find_active(&self, key: &OtpKey) -> Result<Option<OtpRecord>, OtpError> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn delete_by_key(&self, key: &OtpKey) -> Result<u64, OtpError> {
        let mut records = self.records.write().await;
        Ok(records.remove(key).map_or(0, |_| 1))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, OtpError> {
        let mut records = self.records.write().await;
        match Self::key_of(&records, id) {
            Some(key) => Ok(records.remove(&key).is_some()),
            None => Ok(false),
        }
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<AttemptOutcome, OtpError> {
        let mut records = self.records.write().await;
        let record = match records.values_mut().find(|record| record.id == id) {
            Some(record) => record,
            None => return Ok(AttemptOutcome::Missing),
        };

        if record.is_exhausted() {
            return Ok(AttemptOutcome::Exhausted);
        }

        record.attempts += 1;
        Ok(AttemptOutcome::Recorded(record.attempts))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<bool, OtpError> {
        let mut records = self.records.write().await;
        match records.values_mut().find(|record| record.id == id) {
            Some(record) => {
                record.verified = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, OtpError> {
        let mut records = self.records.write().await;
        let initial_count = records.len();

        records.retain(|_, record| !record.is_sweepable_at(now));

        Ok((initial_count - records.len()) as u64)
    }
}
