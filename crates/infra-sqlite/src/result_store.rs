// SQLite ResultStore Implementation
// One row per job uid; INSERT OR REPLACE gives last-finalization-wins.

use crate::job_queue::map_sqlx_error;
use async_trait::async_trait;
use dirsync_core::domain::{JobResult, JobStatus, JobUid};
use dirsync_core::error::Result;
use dirsync_core::port::{ResultStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteResultStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteResultStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn finalize(&self, uid: &JobUid, result: &JobResult, retention_ms: i64) -> Result<()> {
        let messages = serde_json::to_string(&result.messages)?;
        let expires_at = result.finalized_at + retention_ms;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO job_results (
                uid, status, messages, error, finalized_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uid)
        .bind(result.status.to_string())
        .bind(messages)
        .bind(&result.error)
        .bind(result.finalized_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get(&self, uid: &JobUid) -> Result<Option<JobResult>> {
        let now = self.time_provider.now_millis();

        let row = sqlx::query_as::<_, ResultRow>(
            "SELECT * FROM job_results WHERE uid = ? AND expires_at > ?",
        )
        .bind(uid)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_result()))
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query("DELETE FROM job_results WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ResultRow {
    #[allow(dead_code)]
    uid: String,
    status: String,
    messages: String,
    error: Option<String>,
    finalized_at: i64,
    #[allow(dead_code)]
    expires_at: i64,
}

impl ResultRow {
    fn into_result(self) -> JobResult {
        let status = match self.status.as_str() {
            "SUCCESSFUL" => JobStatus::Successful,
            "ERROR" => JobStatus::Error,
            _ => JobStatus::Unknown, // Default fallback
        };

        let messages: Vec<String> = serde_json::from_str(&self.messages).unwrap_or_default();

        JobResult {
            status,
            messages,
            error: self.error,
            finalized_at: self.finalized_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use dirsync_core::port::time_provider::mocks::FixedTimeProvider;

    const RETENTION_MS: i64 = 2 * 60 * 60 * 1000;

    async fn setup_store(now: i64) -> (SqliteResultStore, Arc<FixedTimeProvider>) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let clock = Arc::new(FixedTimeProvider::new(now));
        (SqliteResultStore::new(pool, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_finalize_and_get() {
        let (store, _) = setup_store(1000).await;

        let result = JobResult::new(
            JobStatus::Successful,
            vec!["Synced 5 objects.".to_string()],
            1000,
        );
        store
            .finalize(&"corp-UserSynchronizer".to_string(), &result, RETENTION_MS)
            .await
            .unwrap();

        let loaded = store
            .get(&"corp-UserSynchronizer".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.status, JobStatus::Successful);
        assert_eq!(loaded.messages, vec!["Synced 5 objects.".to_string()]);
    }

    #[tokio::test]
    async fn test_absent_uid_is_none() {
        let (store, _) = setup_store(1000).await;
        assert!(store
            .get(&"never-finalized".to_string())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_result_expires_after_retention() {
        let (store, clock) = setup_store(1000).await;

        let uid = "corp-GroupSynchronizer".to_string();
        let result = JobResult::new(JobStatus::Successful, vec![], 1000);
        store.finalize(&uid, &result, RETENTION_MS).await.unwrap();

        clock.advance(RETENTION_MS - 1);
        assert!(store.get(&uid).await.unwrap().is_some());

        clock.advance(2);
        assert!(store.get(&uid).await.unwrap().is_none());

        // Purge reclaims the row
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_later_finalization_overwrites() {
        let (store, _) = setup_store(1000).await;

        let uid = "corp-UserSynchronizer".to_string();
        let first = JobResult::new(JobStatus::Error, vec![], 1000).with_error("bind failed");
        store.finalize(&uid, &first, RETENTION_MS).await.unwrap();

        let second = JobResult::new(
            JobStatus::Successful,
            vec!["Synced 9 objects.".to_string()],
            2000,
        );
        store.finalize(&uid, &second, RETENTION_MS).await.unwrap();

        let loaded = store.get(&uid).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Successful);
        assert_eq!(loaded.finalized_at, 2000);
        assert!(loaded.error.is_none());
    }
}
