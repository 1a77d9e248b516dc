// Recurring sync trigger
// Runs the fan-out on a fixed interval; also backs the manual RPC trigger.

use crate::application::sync_all;
use crate::error::Result;
use crate::port::{IdProvider, JobQueue, SourceRepository, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/// Periodic trigger for the sync fan-out
pub struct SyncTrigger {
    sources: Arc<dyn SourceRepository>,
    queue: Arc<dyn JobQueue>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    interval_minutes: u64,
}

impl SyncTrigger {
    pub fn new(
        sources: Arc<dyn SourceRepository>,
        queue: Arc<dyn JobQueue>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        interval_minutes: u64,
    ) -> Self {
        Self {
            sources,
            queue,
            id_provider,
            time_provider,
            interval_minutes,
        }
    }

    /// Run trigger loop (background task)
    ///
    /// Fires immediately on startup, then every `interval_minutes`.
    /// Should be spawned in tokio::spawn.
    pub async fn run(self) {
        info!(
            interval_minutes = self.interval_minutes,
            "Sync trigger started"
        );

        let mut tick = interval(Duration::from_secs(self.interval_minutes * 60));

        loop {
            tick.tick().await;

            match self.run_now().await {
                Ok(count) => {
                    info!(jobs = count, "Scheduled sync fan-out completed");
                }
                Err(e) => {
                    error!(error = ?e, "Scheduled sync fan-out failed");
                }
            }
        }
    }

    /// Run the fan-out immediately (startup tick and manual trigger)
    pub async fn run_now(&self) -> Result<usize> {
        let job_ids = sync_all::enqueue_sync_all(
            self.sources.as_ref(),
            self.queue.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
        )
        .await?;
        Ok(job_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;
    use crate::port::id_provider::UuidProvider;
    use crate::port::job_queue::mocks::InMemoryJobQueue;
    use crate::port::source_repository::mocks::InMemorySourceRepository;
    use crate::port::time_provider::SystemTimeProvider;

    #[tokio::test]
    async fn test_run_now_enqueues_for_enabled_sources() {
        let sources = Arc::new(InMemorySourceRepository::with_sources(vec![
            Source::new("src-1", "Corp Directory", true),
            Source::new("src-2", "Retired Directory", false),
        ]));
        let queue = Arc::new(InMemoryJobQueue::new());
        let trigger = SyncTrigger::new(
            sources,
            queue.clone(),
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
            60,
        );

        let count = trigger.run_now().await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(queue.submitted().len(), 3);
    }
}
