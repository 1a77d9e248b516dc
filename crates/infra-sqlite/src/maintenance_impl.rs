// SQLite Maintenance Implementation
use async_trait::async_trait;
use dirsync_core::domain::JobState;
use dirsync_core::error::{AppError, Result};
use dirsync_core::port::{Maintenance, MaintenanceStats, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Get DB size in bytes via page accounting
    async fn get_db_size_bytes(&self) -> Result<i64> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page count: {}", e)))?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page size: {}", e)))?;

        Ok(page_count * page_size)
    }
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn vacuum(&self) -> Result<f64> {
        info!("Running VACUUM to optimize database...");

        let size_before = self.get_db_size_bytes().await? as f64 / (1024.0 * 1024.0);

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("VACUUM failed: {}", e)))?;

        let size_after = self.get_db_size_bytes().await? as f64 / (1024.0 * 1024.0);
        let reclaimed = (size_before - size_after).max(0.0);

        info!(
            size_before_mb = size_before,
            size_after_mb = size_after,
            reclaimed_mb = reclaimed,
            "VACUUM completed"
        );

        Ok(reclaimed)
    }

    async fn gc_finished_jobs(&self, retention_days: i64) -> Result<i64> {
        let now = self.time_provider.now_millis();
        let retention_ms = retention_days * 24 * 60 * 60 * 1000;
        let cutoff_time = now - retention_ms;

        info!(
            retention_days = retention_days,
            cutoff_time = cutoff_time,
            "Running finished job GC"
        );

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
        .bind(cutoff_time)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Job GC failed: {}", e)))?;

        let deleted = result.rows_affected() as i64;

        info!(deleted_jobs = deleted, "Finished job GC completed");

        Ok(deleted)
    }

    async fn purge_expired_results(&self) -> Result<u64> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query("DELETE FROM job_results WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Result purge failed: {}", e)))?;

        let purged = result.rows_affected();
        info!(purged_results = purged, "Expired result purge completed");

        Ok(purged)
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let db_size_bytes = self.get_db_size_bytes().await?;

        let freelist_count: i64 = sqlx::query_scalar("PRAGMA freelist_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get freelist count: {}", e)))?;

        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page count: {}", e)))?;

        let job_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_jobs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count jobs: {}", e)))?;

        let finished_job_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sync_jobs WHERE state IN (?, ?)",
        )
        .bind(JobState::Done.to_string())
        .bind(JobState::Failed.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to count finished jobs: {}", e)))?;

        let result_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_results")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count results: {}", e)))?;

        let fragmentation_percent = if page_count > 0 {
            (freelist_count as f64 / page_count as f64) * 100.0
        } else {
            0.0
        };

        Ok(MaintenanceStats {
            db_size_mb: db_size_bytes as f64 / (1024.0 * 1024.0),
            db_size_bytes,
            job_count,
            finished_job_count,
            result_count,
            fragmentation_percent,
        })
    }
}
