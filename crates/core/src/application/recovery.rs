// Crash recovery logic
use crate::domain::JobState;
use crate::error::Result;
use crate::port::{JobQueue, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::worker::constants::DEFAULT_RECOVERY_WINDOW_MS;

/// Crash recovery service
///
/// On daemon startup, requeues jobs that were Running when the daemon died.
/// This is the substrate's at-least-once behavior across crashes: the job
/// runs again under the same uid and its finalization overwrites any earlier
/// one.
pub struct RecoveryService {
    queue: Arc<dyn JobQueue>,
    time_provider: Arc<dyn TimeProvider>,
    recovery_window_ms: i64,
}

impl RecoveryService {
    /// # Arguments
    /// * `queue` - Job queue substrate
    /// * `time_provider` - Time provider
    /// * `recovery_window_ms` - Optional custom recovery window (default: 5 minutes)
    pub fn new(
        queue: Arc<dyn JobQueue>,
        time_provider: Arc<dyn TimeProvider>,
        recovery_window_ms: Option<i64>,
    ) -> Self {
        Self {
            queue,
            time_provider,
            recovery_window_ms: recovery_window_ms.unwrap_or(DEFAULT_RECOVERY_WINDOW_MS),
        }
    }

    /// Requeue orphaned Running jobs
    ///
    /// A Running job whose `started_at` is older than the recovery window
    /// has no live worker behind it (single-daemon deployment assumption).
    ///
    /// # Returns
    /// Number of jobs requeued
    pub async fn recover_orphaned_jobs(&self) -> Result<usize> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.recovery_window_ms;

        info!(
            cutoff_time = %cutoff,
            recovery_window_ms = %self.recovery_window_ms,
            "Starting orphaned job recovery"
        );

        let running_jobs = self.queue.find_by_state(JobState::Running).await?;
        let mut recovered_count = 0;

        for job in running_jobs {
            match job.started_at {
                Some(started_at) if started_at < cutoff => {
                    info!(
                        job_id = %job.id,
                        started_at = %started_at,
                        "Requeuing orphaned job"
                    );
                    self.queue.requeue(&job.id).await?;
                    recovered_count += 1;
                }
                Some(_) => {}
                None => {
                    // Running without started_at is inconsistent; requeue it
                    // rather than leave it stuck.
                    warn!(job_id = %job.id, "Running job without started_at, requeuing");
                    self.queue.requeue(&job.id).await?;
                    recovered_count += 1;
                }
            }
        }

        info!(recovered = recovered_count, "Orphaned job recovery finished");
        Ok(recovered_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SyncJob, SyncJobPayload, SyncPhase};
    use crate::port::job_queue::mocks::InMemoryJobQueue;
    use crate::port::time_provider::mocks::FixedTimeProvider;

    #[tokio::test]
    async fn test_requeues_stale_running_jobs() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let time_provider = Arc::new(FixedTimeProvider::new(10 * 60 * 1000));

        let job = SyncJob::new_test(SyncJobPayload::new("src-1", SyncPhase::Users));
        queue.enqueue(&job).await.unwrap();
        // Claim it so it is Running with a started_at far in the past
        queue.pop_next().await.unwrap();

        let recovery = RecoveryService::new(queue.clone(), time_provider, Some(60 * 1000));
        let recovered = recovery.recover_orphaned_jobs().await.unwrap();

        assert_eq!(recovered, 1);
        let restored = queue.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(restored.state, JobState::Queued);
    }

    #[tokio::test]
    async fn test_nothing_to_recover() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let time_provider = Arc::new(FixedTimeProvider::new(1000));
        let recovery = RecoveryService::new(queue, time_provider, None);
        assert_eq!(recovery.recover_orphaned_jobs().await.unwrap(), 0);
    }
}
