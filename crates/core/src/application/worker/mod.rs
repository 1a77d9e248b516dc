// Worker - Sync job execution loop

pub mod constants;

use constants::*;

use crate::application::runner::{RunOutcome, SyncJobRunner};
use crate::error::Result;
use crate::port::{cancel_channel, CancelToken, JobQueue, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Per-job execution caps.
///
/// The soft limit fires a cooperative cancellation into the synchronizer;
/// the hard limit aborts the job unconditionally. They default to the same
/// duration, so out of the box the hard cap is the enforced one.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    pub soft_limit: Duration,
    pub hard_limit: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            soft_limit: DEFAULT_SOFT_TIME_LIMIT,
            hard_limit: DEFAULT_HARD_TIME_LIMIT,
        }
    }
}

/// Worker processes sync jobs from the queue substrate
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    runner: Arc<SyncJobRunner>,
    time_provider: Arc<dyn TimeProvider>,
    timeouts: TimeoutConfig,
}

impl Worker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        runner: Arc<SyncJobRunner>,
        time_provider: Arc<dyn TimeProvider>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            queue,
            runner,
            time_provider,
            timeouts,
        }
    }

    /// Run worker loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: CancelToken) -> Result<()> {
        info!("Sync worker started");
        loop {
            if shutdown.is_cancelled() {
                info!("Sync worker shutting down");
                break;
            }
            match self.process_next_job().await {
                Ok(processed) => {
                    if !processed {
                        // No job available, sleep briefly (or wait for shutdown)
                        tokio::select! {
                            _ = sleep(IDLE_SLEEP_DURATION) => {},
                            _ = shutdown.cancelled() => {
                                info!("Sync worker interrupted during idle");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Sync worker error: {}", e);
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.cancelled() => {
                            info!("Sync worker interrupted during error recovery");
                            break;
                        }
                    }
                }
            }
        }
        info!("Sync worker stopped");
        Ok(())
    }

    /// Process next job from the queue (returns true if a job was claimed)
    pub async fn process_next_job(&self) -> Result<bool> {
        let job = match self.queue.pop_next().await? {
            Some(job) => job,
            None => return Ok(false),
        };

        info!(
            job_id = %job.id,
            source_id = %job.payload.source_id,
            phase = ?job.payload.phase,
            "Processing sync job"
        );

        // Execute in a spawned task: panics stay contained in the JoinHandle
        // and the hard cap can abort without tearing down the worker.
        let (cancel_tx, cancel_rx) = cancel_channel();
        let runner = Arc::clone(&self.runner);
        let payload = job.payload.clone();
        let mut handle =
            tokio::task::spawn(async move { runner.execute(&payload, cancel_rx).await });

        // Soft cap: request cooperative cancellation partway through.
        let soft_limit = self.timeouts.soft_limit;
        let soft_timer = tokio::spawn(async move {
            sleep(soft_limit).await;
            cancel_tx.cancel();
        });

        let execution = tokio::time::timeout(self.timeouts.hard_limit, &mut handle).await;
        if execution.is_err() {
            // Hard cap: kill the task before the soft timer is torn down, so
            // the closing cancel channel cannot double as a graceful exit.
            handle.abort();
        }
        soft_timer.abort();

        let now = self.time_provider.now_millis();
        match execution {
            Ok(Ok(Ok(outcome))) => {
                match &outcome {
                    RunOutcome::Finalized { uid, status } => {
                        info!(job_id = %job.id, uid = %uid, status = %status, "Sync job finished")
                    }
                    RunOutcome::SourceMissing | RunOutcome::PhaseMissing => {
                        info!(job_id = %job.id, outcome = ?outcome, "Sync job skipped")
                    }
                }
                self.queue.mark_done(&job.id, now).await?;
            }
            Ok(Ok(Err(e))) => {
                // Fatal error: recorded at the substrate level, never as a
                // job result.
                error!(job_id = %job.id, error = %e, "Sync job failed");
                self.queue
                    .mark_failed(&job.id, now, &e.to_string())
                    .await?;
            }
            Ok(Err(join_err)) => {
                let reason = if join_err.is_panic() {
                    format!("panicked: {}", join_err)
                } else {
                    format!("cancelled: {}", join_err)
                };
                error!(job_id = %job.id, reason = %reason, "Sync job aborted");
                self.queue.mark_failed(&job.id, now, &reason).await?;
            }
            Err(_elapsed) => {
                let reason = format!(
                    "hard time limit of {}s exceeded",
                    self.timeouts.hard_limit.as_secs()
                );
                warn!(job_id = %job.id, reason = %reason, "Sync job terminated");
                self.queue.mark_failed(&job.id, now, &reason).await?;
            }
        }
        Ok(true)
    }
}
