//! MySQL implementation of the OtpRepository trait.
//!
//! One row per `(email, purpose)`, enforced by a unique key. Replacement is a
//! single `INSERT ... ON DUPLICATE KEY UPDATE`; the cooldown-guarded variant
//! makes every assignment conditional on the stored `created_at`. Attempt
//! counting locks the row inside a transaction so concurrent verifications
//! serialize on it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{mysql::MySqlRow, MySqlPool, Row};
use tracing::{debug, error, info};
use uuid::Uuid;

use otp_core::domain::entities::OtpRecord;
use otp_core::domain::value_objects::{OtpKey, OtpPurpose};
use otp_core::errors::OtpError;
use otp_core::repositories::{AttemptOutcome, OtpRepository, ReplaceOutcome};
use otp_shared::utils::email::mask_email;

const SELECT_COLUMNS: &str =
    "id, email, purpose, code, created_at, expires_at, attempts, max_attempts, verified";

/// MySQL implementation of OtpRepository
pub struct MySqlOtpRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlOtpRepository {
    /// Create a new MySQL passcode repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to OtpRecord entity
    fn row_to_record(row: &MySqlRow) -> Result<OtpRecord, OtpError> {
        let id: String = row.try_get("id").map_err(|e| column_error("id", e))?;
        let purpose: String = row
            .try_get("purpose")
            .map_err(|e| column_error("purpose", e))?;

        Ok(OtpRecord {
            id: Uuid::parse_str(&id)
                .map_err(|e| OtpError::store(format!("Invalid record UUID: {}", e)))?,
            email: row.try_get("email").map_err(|e| column_error("email", e))?,
            purpose: purpose
                .parse::<OtpPurpose>()
                .map_err(|e| OtpError::store(format!("Invalid purpose: {}", e)))?,
            code: row.try_get("code").map_err(|e| column_error("code", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| column_error("created_at", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| column_error("expires_at", e))?,
            attempts: row
                .try_get("attempts")
                .map_err(|e| column_error("attempts", e))?,
            max_attempts: row
                .try_get("max_attempts")
                .map_err(|e| column_error("max_attempts", e))?,
            verified: row
                .try_get("verified")
                .map_err(|e| column_error("verified", e))?,
        })
    }
}

fn column_error(column: &str, e: sqlx::Error) -> OtpError {
    OtpError::store(format!("Failed to get {}: {}", column, e))
}

fn query_error(context: &str, e: sqlx::Error) -> OtpError {
    error!(error = %e, "{}", context);
    OtpError::store(format!("{}: {}", context, e))
}

#[async_trait]
impl OtpRepository for MySqlOtpRepository {
    async fn insert(&self, record: OtpRecord) -> Result<OtpRecord, OtpError> {
        let query = r#"
            INSERT INTO otp_records (
                id, email, purpose, code, created_at, expires_at,
                attempts, max_attempts, verified
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                id = VALUES(id),
                code = VALUES(code),
                created_at = VALUES(created_at),
                expires_at = VALUES(expires_at),
                attempts = VALUES(attempts),
                max_attempts = VALUES(max_attempts),
                verified = VALUES(verified)
        "#;

        sqlx::query(query)
            .bind(record.id.to_string())
            .bind(&record.email)
            .bind(record.purpose.as_str())
            .bind(&record.code)
            .bind(record.created_at)
            .bind(record.expires_at)
            .bind(record.attempts)
            .bind(record.max_attempts)
            .bind(record.verified)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("Failed to store passcode", e))?;

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
        // Assignments run left to right: created_at goes last so every
        // earlier IF still compares against the stored value
        let query = r#"
            INSERT INTO otp_records (
                id, email, purpose, code, created_at, expires_at,
                attempts, max_attempts, verified
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                id = IF(created_at <= ?, VALUES(id), id),
                code = IF(created_at <= ?, VALUES(code), code),
                expires_at = IF(created_at <= ?, VALUES(expires_at), expires_at),
                attempts = IF(created_at <= ?, VALUES(attempts), attempts),
                max_attempts = IF(created_at <= ?, VALUES(max_attempts), max_attempts),
                verified = IF(created_at <= ?, VALUES(verified), verified),
                created_at = IF(created_at <= ?, VALUES(created_at), created_at)
        "#;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_error("Failed to begin transaction", e))?;

        let mut upsert = sqlx::query(query)
            .bind(record.id.to_string())
            .bind(&record.email)
            .bind(record.purpose.as_str())
            .bind(&record.code)
            .bind(record.created_at)
            .bind(record.expires_at)
            .bind(record.attempts)
            .bind(record.max_attempts)
            .bind(record.verified);
        for _ in 0..7 {
            upsert = upsert.bind(cutoff);
        }
        upsert
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to store passcode", e))?;

        // The upsert holds the row lock, so this reads its own outcome
        let row = sqlx::query(
            "SELECT id, created_at FROM otp_records WHERE email = ? AND purpose = ?",
        )
        .bind(&record.email)
        .bind(record.purpose.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| query_error("Failed to read stored passcode", e))?;

        tx.commit()
            .await
            .map_err(|e| query_error("Failed to commit passcode", e))?;

        let stored_id: String = row.try_get("id").map_err(|e| column_error("id", e))?;
        if stored_id != record.id.to_string() {
            let created_at: DateTime<Utc> = row
                .try_get("created_at")
                .map_err(|e| column_error("created_at", e))?;
            debug!(
                email = %mask_email(&record.email),
                "Kept passcode still inside its cooldown"
            );
            return Ok(ReplaceOutcome::CoolingDown { created_at });
        }

        debug!(
            email = %mask_email(&record.email),
            record_id = %record.id,
            "Stored passcode record"
        );

        Ok(ReplaceOutcome::Stored(record))
    }

    async fn find_active(&self, key: &OtpKey) -> Result<Option<OtpRecord>, OtpError> {
        let query = format!(
            "SELECT {} FROM otp_records WHERE email = ? AND purpose = ? LIMIT 1",
            SELECT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(key.email())
            .bind(key.purpose().as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to find passcode", e))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn delete_by_key(&self, key: &OtpKey) -> Result<u64, OtpError> {
        let result = sqlx::query("DELETE FROM otp_records WHERE email = ? AND purpose = ?")
            .bind(key.email())
            .bind(key.purpose().as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("Failed to delete passcode", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, OtpError> {
        let result = sqlx::query("DELETE FROM otp_records WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("Failed to delete passcode", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<AttemptOutcome, OtpError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_error("Failed to begin transaction", e))?;

        let row = sqlx::query("SELECT attempts, max_attempts FROM otp_records WHERE id = ? FOR UPDATE")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to lock passcode", e))?;

        let (attempts, max_attempts): (u32, u32) = match row {
            Some(row) => (
                row.try_get("attempts")
                    .map_err(|e| column_error("attempts", e))?,
                row.try_get("max_attempts")
                    .map_err(|e| column_error("max_attempts", e))?,
            ),
            None => return Ok(AttemptOutcome::Missing),
        };

        if attempts >= max_attempts {
            return Ok(AttemptOutcome::Exhausted);
        }

        sqlx::query("UPDATE otp_records SET attempts = attempts + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to increment attempts", e))?;

        tx.commit()
            .await
            .map_err(|e| query_error("Failed to commit attempt", e))?;

        Ok(AttemptOutcome::Recorded(attempts + 1))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<bool, OtpError> {
        // An already verified row is not updated, so existence is checked separately
        let result = sqlx::query(
            "UPDATE otp_records SET verified = TRUE WHERE id = ? AND verified = FALSE",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| query_error("Failed to mark passcode verified", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM otp_records WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to check passcode", e))?;

        Ok(exists.is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, OtpError> {
        let result = sqlx::query("DELETE FROM otp_records WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("Failed to delete expired passcodes", e))?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(deleted_count = deleted, "Deleted expired passcodes from database");
        }

        Ok(deleted)
    }
}
