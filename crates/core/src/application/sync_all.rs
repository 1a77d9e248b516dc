// Fan-out Use Case
// One trigger -> one job per (enabled source, phase), phases in fixed order.

use crate::domain::{JobId, SyncJob, SyncJobPayload, SyncPhase};
use crate::error::Result;
use crate::port::{IdProvider, JobQueue, SourceRepository, TimeProvider};
use tracing::{debug, info};

/// Enumerate enabled sources and submit the ordered phase jobs for each.
///
/// Fire-and-forget from the caller's perspective; the returned job ids are
/// opaque handles. Disabled or absent sources produce no jobs.
pub async fn enqueue_sync_all(
    sources: &dyn SourceRepository,
    queue: &dyn JobQueue,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
) -> Result<Vec<JobId>> {
    let enabled = sources.find_enabled().await?;
    let mut job_ids = Vec::with_capacity(enabled.len() * SyncPhase::ORDERED.len());

    for source in &enabled {
        for phase in SyncPhase::ORDERED {
            let job = SyncJob::new(
                id_provider.generate_id(),
                time_provider.now_millis(),
                SyncJobPayload::new(source.id.clone(), phase),
            );
            queue.enqueue(&job).await?;
            debug!(
                source = %source.name,
                phase = %phase,
                job_id = %job.id,
                "Sync job submitted"
            );
            job_ids.push(job.id);
        }
    }

    info!(
        sources = enabled.len(),
        jobs = job_ids.len(),
        "Sync fan-out completed"
    );

    Ok(job_ids)
}
