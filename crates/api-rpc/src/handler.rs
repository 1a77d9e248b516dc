//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::rate_limiter::RateLimiter;
use crate::types::{
    AddSourceRequest, AddSourceResponse, DeleteSourceRequest, DeleteSourceResponse,
    ListSourcesRequest, ListSourcesResponse, MaintenanceRequest, MaintenanceResponse, PhaseStatus,
    SetEnabledRequest, SetEnabledResponse, SourceInfo, StatsRequest, StatsResponse, StatusRequest,
    StatusResponse, TriggerRequest, TriggerResponse,
};
use dirsync_core::application::sync_all;
use dirsync_core::domain::{job_uid, JobState, JobStatus, Source, SyncPhase};
use dirsync_core::error::AppError;
use dirsync_core::port::{
    IdProvider, JobQueue, Maintenance, ResultStore, SourceAdmin, SourceRepository, TimeProvider,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    source_repo: Arc<dyn SourceRepository>,
    source_admin: Arc<dyn SourceAdmin>,
    queue: Arc<dyn JobQueue>,
    results: Arc<dyn ResultStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    maintenance: Arc<dyn Maintenance>,
    rate_limiter: Arc<RateLimiter>,
    start_time: std::time::Instant,
}

impl RpcHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_repo: Arc<dyn SourceRepository>,
        source_admin: Arc<dyn SourceAdmin>,
        queue: Arc<dyn JobQueue>,
        results: Arc<dyn ResultStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        maintenance: Arc<dyn Maintenance>,
    ) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("DIRSYNC_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("DIRSYNC_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            source_repo,
            source_admin,
            queue,
            results,
            id_provider,
            time_provider,
            maintenance,
            rate_limiter: Arc::new(RateLimiter::new(max_burst, rate_per_sec)),
            start_time: std::time::Instant::now(),
        }
    }

    async fn throttled(&self) -> Result<(), ErrorObjectOwned> {
        if !self.rate_limiter.check().await {
            return Err(ErrorObjectOwned::owned(
                crate::error::code::THROTTLED,
                "Rate limit exceeded. Please slow down.",
                None::<()>,
            ));
        }
        Ok(())
    }

    /// sync.trigger.v1
    pub async fn trigger(
        &self,
        _params: TriggerRequest,
    ) -> Result<TriggerResponse, ErrorObjectOwned> {
        self.throttled().await?;

        let job_ids = sync_all::enqueue_sync_all(
            self.source_repo.as_ref(),
            self.queue.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
        )
        .await
        .map_err(to_rpc_error)?;

        Ok(TriggerResponse {
            jobs_enqueued: job_ids.len(),
        })
    }

    /// sync.status.v1
    pub async fn status(&self, params: StatusRequest) -> Result<StatusResponse, ErrorObjectOwned> {
        self.throttled().await?;

        let source = self
            .source_repo
            .find_by_id(&params.source_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "Source {} not found",
                    params.source_id
                )))
            })?;

        let mut phases = Vec::with_capacity(SyncPhase::ORDERED.len());
        for phase in SyncPhase::ORDERED {
            let uid = job_uid(&source, phase);
            let result = self.results.get(&uid).await.map_err(to_rpc_error)?;

            phases.push(match result {
                Some(result) => PhaseStatus {
                    phase: phase.to_string(),
                    uid,
                    status: result.status.to_string(),
                    messages: result.messages,
                    error: result.error,
                    finalized_at: Some(result.finalized_at),
                },
                None => PhaseStatus {
                    phase: phase.to_string(),
                    uid,
                    // Absence is itself diagnostic: source gone at run time,
                    // legacy payload, or a hard-cap termination.
                    status: JobStatus::Unknown.to_string(),
                    messages: Vec::new(),
                    error: None,
                    finalized_at: None,
                },
            });
        }

        Ok(StatusResponse {
            source_id: source.id,
            source_name: source.name,
            phases,
        })
    }

    /// source.list.v1
    pub async fn list_sources(
        &self,
        _params: ListSourcesRequest,
    ) -> Result<ListSourcesResponse, ErrorObjectOwned> {
        self.throttled().await?;

        let sources = self.source_admin.list_all().await.map_err(to_rpc_error)?;

        Ok(ListSourcesResponse {
            sources: sources
                .into_iter()
                .map(|s| SourceInfo {
                    slug: s.slug(),
                    id: s.id,
                    name: s.name,
                    enabled: s.enabled,
                })
                .collect(),
        })
    }

    /// source.add.v1
    pub async fn add_source(
        &self,
        params: AddSourceRequest,
    ) -> Result<AddSourceResponse, ErrorObjectOwned> {
        self.throttled().await?;

        if params.name.trim().is_empty() {
            return Err(to_rpc_error(AppError::Validation(
                "Source name must not be empty".to_string(),
            )));
        }

        let source = Source::new(self.id_provider.generate_id(), params.name, params.enabled)
            .with_settings(params.settings);
        self.source_admin
            .insert(&source)
            .await
            .map_err(to_rpc_error)?;

        Ok(AddSourceResponse {
            id: source.id,
            name: source.name,
            enabled: source.enabled,
        })
    }

    /// source.set-enabled.v1
    pub async fn set_enabled(
        &self,
        params: SetEnabledRequest,
    ) -> Result<SetEnabledResponse, ErrorObjectOwned> {
        self.throttled().await?;

        self.source_admin
            .set_enabled(&params.source_id, params.enabled)
            .await
            .map_err(to_rpc_error)?;

        Ok(SetEnabledResponse {
            source_id: params.source_id,
            enabled: params.enabled,
        })
    }

    /// source.delete.v1
    pub async fn delete_source(
        &self,
        params: DeleteSourceRequest,
    ) -> Result<DeleteSourceResponse, ErrorObjectOwned> {
        self.throttled().await?;

        self.source_admin
            .delete(&params.source_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(DeleteSourceResponse {
            source_id: params.source_id,
            deleted: true,
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        let queued = self
            .queue
            .count_by_state(JobState::Queued)
            .await
            .map_err(to_rpc_error)?;

        let running = self
            .queue
            .count_by_state(JobState::Running)
            .await
            .map_err(to_rpc_error)?;

        let done = self
            .queue
            .count_by_state(JobState::Done)
            .await
            .map_err(to_rpc_error)?;

        let failed = self
            .queue
            .count_by_state(JobState::Failed)
            .await
            .map_err(to_rpc_error)?;

        let stats = self.maintenance.get_stats().await.map_err(to_rpc_error)?;

        Ok(StatsResponse {
            total_jobs: stats.job_count,
            queued_jobs: queued,
            running_jobs: running,
            done_jobs: done,
            failed_jobs: failed,
            stored_results: stats.result_count,
            db_size_bytes: stats.db_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }

    /// admin.maintenance.v1
    pub async fn maintenance(
        &self,
        params: MaintenanceRequest,
    ) -> Result<MaintenanceResponse, ErrorObjectOwned> {
        let stats_before = self.maintenance.get_stats().await.map_err(to_rpc_error)?;

        let vacuum_run = if params.force_vacuum || stats_before.fragmentation_percent > 10.0 {
            self.maintenance.vacuum().await.map_err(to_rpc_error)?;
            true
        } else {
            false
        };

        let jobs_deleted = self
            .maintenance
            .gc_finished_jobs(30) // 30 days
            .await
            .map_err(to_rpc_error)?;

        let results_purged = self
            .maintenance
            .purge_expired_results()
            .await
            .map_err(to_rpc_error)?;

        let stats_after = self.maintenance.get_stats().await.map_err(to_rpc_error)?;

        Ok(MaintenanceResponse {
            vacuum_run,
            jobs_deleted,
            results_purged,
            db_size_before: stats_before.db_size_bytes,
            db_size_after: stats_after.db_size_bytes,
        })
    }
}
