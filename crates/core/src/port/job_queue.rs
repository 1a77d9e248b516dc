// Job Queue Port (Interface)
// Contract with the queue substrate: at-least-once delivery, FIFO by
// submission order, no execution-order or exclusivity guarantees.

use crate::domain::{JobId, JobState, SyncJob};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit a job (fire-and-forget; the job id is the opaque handle)
    async fn enqueue(&self, job: &SyncJob) -> Result<()>;

    /// Atomically claim the next queued job, marking it Running
    async fn pop_next(&self) -> Result<Option<SyncJob>>;

    /// Record successful completion at the substrate level
    async fn mark_done(&self, id: &JobId, finished_at: i64) -> Result<()>;

    /// Record an infrastructure-level failure (fatal error, panic, hard
    /// timeout) - distinct from the JobResult model
    async fn mark_failed(&self, id: &JobId, finished_at: i64, reason: &str) -> Result<()>;

    /// Put a Running job back to Queued (crash recovery)
    async fn requeue(&self, id: &JobId) -> Result<()>;

    /// Find job by ID
    async fn find_by_id(&self, id: &JobId) -> Result<Option<SyncJob>>;

    /// Find all jobs by state
    async fn find_by_state(&self, state: JobState) -> Result<Vec<SyncJob>>;

    /// Count jobs by state
    async fn count_by_state(&self, state: JobState) -> Result<i64>;

    /// Delete finished jobs older than the cutoff; returns rows removed
    async fn gc_finished(&self, finished_before: i64) -> Result<u64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// In-memory FIFO queue for tests.
    ///
    /// Preserves submission order, which is all the real substrate promises.
    #[derive(Default)]
    pub struct InMemoryJobQueue {
        jobs: Mutex<VecDeque<SyncJob>>,
    }

    impl InMemoryJobQueue {
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of every job ever enqueued, in submission order
        pub fn submitted(&self) -> Vec<SyncJob> {
            self.jobs.lock().unwrap().iter().cloned().collect()
        }
    }

    #[async_trait]
    impl JobQueue for InMemoryJobQueue {
        async fn enqueue(&self, job: &SyncJob) -> Result<()> {
            self.jobs.lock().unwrap().push_back(job.clone());
            Ok(())
        }

        async fn pop_next(&self) -> Result<Option<SyncJob>> {
            let mut jobs = self.jobs.lock().unwrap();
            for job in jobs.iter_mut() {
                if job.state == JobState::Queued {
                    job.state = JobState::Running;
                    // Mock clock: claim time == submission time
                    job.started_at = Some(job.created_at);
                    return Ok(Some(job.clone()));
                }
            }
            Ok(None)
        }

        async fn mark_done(&self, id: &JobId, finished_at: i64) -> Result<()> {
            self.set_state(id, JobState::Done, Some(finished_at), None)
        }

        async fn mark_failed(&self, id: &JobId, finished_at: i64, reason: &str) -> Result<()> {
            self.set_state(id, JobState::Failed, Some(finished_at), Some(reason))
        }

        async fn requeue(&self, id: &JobId) -> Result<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.iter_mut().find(|j| &j.id == id) {
                job.state = JobState::Queued;
                job.started_at = None;
            }
            Ok(())
        }

        async fn find_by_id(&self, id: &JobId) -> Result<Option<SyncJob>> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .find(|j| &j.id == id)
                .cloned())
        }

        async fn find_by_state(&self, state: JobState) -> Result<Vec<SyncJob>> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .filter(|j| j.state == state)
                .cloned()
                .collect())
        }

        async fn count_by_state(&self, state: JobState) -> Result<i64> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .filter(|j| j.state == state)
                .count() as i64)
        }

        async fn gc_finished(&self, finished_before: i64) -> Result<u64> {
            let mut jobs = self.jobs.lock().unwrap();
            let before = jobs.len();
            jobs.retain(|j| {
                !(matches!(j.state, JobState::Done | JobState::Failed)
                    && j.finished_at.map_or(false, |t| t < finished_before))
            });
            Ok((before - jobs.len()) as u64)
        }
    }

    impl InMemoryJobQueue {
        fn set_state(
            &self,
            id: &JobId,
            state: JobState,
            finished_at: Option<i64>,
            reason: Option<&str>,
        ) -> Result<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.iter_mut().find(|j| &j.id == id) {
                job.state = state;
                job.finished_at = finished_at;
                if let Some(reason) = reason {
                    job.failure_reason = Some(reason.to_string());
                }
            }
            Ok(())
        }
    }
}
