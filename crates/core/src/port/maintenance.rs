// DB maintenance port
use crate::error::Result;
use async_trait::async_trait;

/// Database maintenance statistics
#[derive(Debug, Clone)]
pub struct MaintenanceStats {
    pub db_size_mb: f64,
    pub db_size_bytes: i64,
    pub job_count: i64,
    pub finished_job_count: i64,
    pub result_count: i64,
    pub fragmentation_percent: f64,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Retention period for finished queue jobs (days)
    pub finished_job_retention_days: i64,

    /// Maximum DB size before forcing VACUUM (MB)
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            finished_job_retention_days: 7,
            max_db_size_mb: 1000.0,
        }
    }
}

/// Database maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Run VACUUM to reclaim space
    ///
    /// # Returns
    /// Space reclaimed in MB
    async fn vacuum(&self) -> Result<f64>;

    /// Delete finished queue jobs older than the retention period
    ///
    /// # Returns
    /// Number of jobs deleted
    async fn gc_finished_jobs(&self, retention_days: i64) -> Result<i64>;

    /// Delete job results past their retention window
    ///
    /// Results are already invisible to readers once expired; this reclaims
    /// the rows.
    async fn purge_expired_results(&self) -> Result<u64>;

    /// Get maintenance statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;

    /// Run full maintenance (GC + VACUUM when the DB is large)
    async fn run_full_maintenance(&self, config: &MaintenanceConfig) -> Result<MaintenanceStats> {
        let stats_before = self.get_stats().await?;

        let deleted_jobs = self
            .gc_finished_jobs(config.finished_job_retention_days)
            .await?;

        let purged_results = self.purge_expired_results().await?;

        let reclaimed_mb = if stats_before.db_size_mb > config.max_db_size_mb {
            self.vacuum().await?
        } else {
            0.0
        };

        let stats_after = self.get_stats().await?;

        tracing::info!(
            deleted_jobs = deleted_jobs,
            purged_results = purged_results,
            reclaimed_mb = reclaimed_mb,
            db_size_mb = stats_after.db_size_mb,
            "Maintenance completed"
        );

        Ok(stats_after)
    }
}
