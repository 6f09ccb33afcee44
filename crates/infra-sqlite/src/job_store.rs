// SQLite JobStore Implementation

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use ytflow_core::domain::{format_timestamp, DomainError, JobRecord, JobState, JOB_KEY_PREFIX};
use ytflow_core::error::{AppError, Result};
use ytflow_core::port::{JobStore, TimeProvider};

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "5" => AppError::Persistence(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Persistence(format!("Database full: {}", db_err.message())),
                    "8" => AppError::Persistence(format!(
                        "Database is read-only: {}",
                        db_err.message()
                    )),
                    _ => AppError::Persistence(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Persistence(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::PoolTimedOut => {
            AppError::Persistence("Timed out waiting for a database connection".to_string())
        }
        _ => AppError::Persistence(err.to_string()),
    }
}

/// Job store on a single `kv_state` table
///
/// Each `set` is one `INSERT ... ON CONFLICT DO UPDATE` statement carrying
/// the complete serialized record, so readers see either the old value or
/// the new one.
pub struct SqliteJobStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn set(&self, key: &str, record: &JobRecord) -> Result<()> {
        let value = serde_json::to_string(record)
            .map_err(|e| AppError::Persistence(format!("cannot serialize {}: {}", key, e)))?;

        sqlx::query(
            r#"
            INSERT INTO kv_state (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&value)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<JobRecord>> {
        let row = sqlx::query_as::<_, KvRow>("SELECT key, value FROM kv_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(KvRow::into_record).transpose()
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM kv_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(found.is_some())
    }

    async fn find_by_state(&self, state: JobState) -> Result<Vec<JobRecord>> {
        let pattern = format!("{}%", JOB_KEY_PREFIX);

        let rows = sqlx::query_as::<_, KvRow>(
            r#"
            SELECT key, value FROM kv_state
            WHERE key LIKE ? AND json_extract(value, '$.state') = ?
            ORDER BY json_extract(value, '$.createdAt') ASC, key ASC
            "#,
        )
        .bind(&pattern)
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(KvRow::into_record).collect()
    }

    async fn find_by_state_since(
        &self,
        state: JobState,
        since_millis: i64,
    ) -> Result<Vec<JobRecord>> {
        let pattern = format!("{}%", JOB_KEY_PREFIX);

        // createdAt is fixed-width UTC ISO-8601, so text order is time order
        let rows = sqlx::query_as::<_, KvRow>(
            r#"
            SELECT key, value FROM kv_state
            WHERE json_extract(value, '$.createdAt') >= ?
              AND key LIKE ?
              AND json_extract(value, '$.state') = ?
            ORDER BY json_extract(value, '$.createdAt') ASC, key ASC
            "#,
        )
        .bind(format_timestamp(since_millis))
        .bind(&pattern)
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(KvRow::into_record).collect()
    }
}

/// SQLite row representation
#[derive(sqlx::FromRow)]
struct KvRow {
    key: String,
    value: String,
}

impl KvRow {
    fn into_record(self) -> Result<JobRecord> {
        serde_json::from_str(&self.value).map_err(|e| {
            DomainError::MalformedRecord {
                key: self.key,
                reason: e.to_string(),
            }
            .into()
        })
    }
}
