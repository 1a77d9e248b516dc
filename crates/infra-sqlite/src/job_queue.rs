// SQLite JobQueue Implementation

use async_trait::async_trait;
use dirsync_core::domain::{JobId, JobState, JobType, SyncJob, SyncJobPayload};
use dirsync_core::error::{AppError, Result};
use dirsync_core::port::{JobQueue, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Database(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteJobQueue {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteJobQueue {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(&self, job: &SyncJob) -> Result<()> {
        let payload = serde_json::to_string(&job.payload)?;

        sqlx::query(
            r#"
            INSERT INTO sync_jobs (
                id, job_type, payload, state,
                created_at, started_at, finished_at, failure_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(job.job_type.as_str())
        .bind(payload)
        .bind(job.state.to_string())
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.finished_at)
        .bind(&job.failure_reason)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn pop_next(&self) -> Result<Option<SyncJob>> {
        // Atomic claim: the UPDATE both selects and transitions the row, so
        // concurrent workers never claim the same job. FIFO by submission
        // order (created_at, then insertion order for same-millisecond
        // batches from the fan-out).
        let now = self.time_provider.now_millis();

        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE sync_jobs
            SET state = ?, started_at = ?
            WHERE id = (
                SELECT id FROM sync_jobs
                WHERE state = ?
                ORDER BY created_at ASC, rowid ASC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(JobState::Running.to_string())
        .bind(now)
        .bind(JobState::Queued.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_job()))
    }

    async fn mark_done(&self, id: &JobId, finished_at: i64) -> Result<()> {
        self.finish(id, JobState::Done, finished_at, None).await
    }

    async fn mark_failed(&self, id: &JobId, finished_at: i64, reason: &str) -> Result<()> {
        self.finish(id, JobState::Failed, finished_at, Some(reason))
            .await
    }

    async fn requeue(&self, id: &JobId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sync_jobs
            SET state = ?, started_at = NULL
            WHERE id = ? AND state = ?
            "#,
        )
        .bind(JobState::Queued.to_string())
        .bind(id)
        .bind(JobState::Running.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidState(format!(
                "Job {} is not running, cannot requeue",
                id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<SyncJob>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM sync_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_job()))
    }

    async fn find_by_state(&self, state: JobState) -> Result<Vec<SyncJob>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT * FROM sync_jobs
            WHERE state = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(state.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|row| row.into_job()).collect())
    }

    async fn count_by_state(&self, state: JobState) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_jobs WHERE state = ?")
            .bind(state.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn gc_finished(&self, finished_before: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sync_jobs
            WHERE state IN (?, ?)
            AND finished_at IS NOT NULL
            AND finished_at < ?
            "#,
        )
        .bind(JobState::Done.to_string())
        .bind(JobState::Failed.to_string())
        .bind(finished_before)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

impl SqliteJobQueue {
    async fn finish(
        &self,
        id: &JobId,
        state: JobState,
        finished_at: i64,
        reason: Option<&str>,
    ) -> Result<()> {
        // Conditional update: only a Running job can finish, which protects
        // against late bookkeeping racing a requeue.
        let result = sqlx::query(
            r#"
            UPDATE sync_jobs
            SET state = ?, finished_at = ?, failure_reason = ?
            WHERE id = ? AND state = ?
            "#,
        )
        .bind(state.to_string())
        .bind(finished_at)
        .bind(reason)
        .bind(id)
        .bind(JobState::Running.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            let exists: Option<String> =
                sqlx::query_scalar("SELECT state FROM sync_jobs WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

            return match exists {
                None => Err(AppError::NotFound(format!("Job {} not found", id))),
                Some(current_state) => Err(AppError::InvalidState(format!(
                    "Cannot finish job {} from state {}",
                    id, current_state
                ))),
            };
        }
        Ok(())
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    job_type: String,
    payload: String,
    state: String,
    created_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    failure_reason: Option<String>,
}

impl JobRow {
    fn into_job(self) -> SyncJob {
        let state = match self.state.as_str() {
            "QUEUED" => JobState::Queued,
            "RUNNING" => JobState::Running,
            "DONE" => JobState::Done,
            _ => JobState::Failed, // Default fallback
        };

        // A payload that no longer parses drains as a no-op at execution
        // time (empty source id never resolves).
        let payload: SyncJobPayload =
            serde_json::from_str(&self.payload).unwrap_or(SyncJobPayload {
                source_id: String::new(),
                phase: None,
            });

        SyncJob {
            id: self.id,
            job_type: JobType::new(self.job_type),
            payload,
            state,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            failure_reason: self.failure_reason,
        }
    }
}
