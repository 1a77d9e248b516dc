// Monitored sync job execution body

use crate::domain::{job_uid, JobResult, JobStatus, JobUid, SyncJobPayload};
use crate::error::Result;
use crate::port::{
    CancelToken, ResultStore, SourceRepository, SynchronizerFactory, TimeProvider,
};
use std::sync::Arc;
use tracing::{debug, info};

/// How one execution ended.
///
/// The two Skipped variants record no job result: without a live source
/// there is no stable uid to report against, and a payload without a phase
/// selector is an old-format job draining as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Finalized { uid: JobUid, status: JobStatus },
    SourceMissing,
    PhaseMissing,
}

/// Executes one queued sync job: load the source, resolve the phase, set the
/// job uid, run the synchronizer, finalize exactly one result.
///
/// The directory-protocol error is recovered here into an Error result -
/// finalizing it is the sole notification path, no separate alert is raised.
/// Every other error propagates to the substrate as a fatal job failure.
pub struct SyncJobRunner {
    sources: Arc<dyn SourceRepository>,
    factory: Arc<dyn SynchronizerFactory>,
    results: Arc<dyn ResultStore>,
    time_provider: Arc<dyn TimeProvider>,
    result_retention_ms: i64,
}

impl SyncJobRunner {
    pub fn new(
        sources: Arc<dyn SourceRepository>,
        factory: Arc<dyn SynchronizerFactory>,
        results: Arc<dyn ResultStore>,
        time_provider: Arc<dyn TimeProvider>,
        result_retention_ms: i64,
    ) -> Self {
        Self {
            sources,
            factory,
            results,
            time_provider,
            result_retention_ms,
        }
    }

    pub async fn execute(
        &self,
        payload: &SyncJobPayload,
        cancel: CancelToken,
    ) -> Result<RunOutcome> {
        let source = match self.sources.find_by_id(&payload.source_id).await? {
            Some(source) => source,
            None => {
                // Source deleted between submission and execution: no stable
                // uid exists, so nothing is recorded.
                debug!(source_id = %payload.source_id, "Source gone, skipping sync job");
                return Ok(RunOutcome::SourceMissing);
            }
        };

        let phase = match payload.phase {
            Some(phase) => phase,
            None => {
                debug!(source = %source.name, "Sync job without phase selector, skipping");
                return Ok(RunOutcome::PhaseMissing);
            }
        };

        // The uid is fixed before the synchronizer runs so that even failed
        // runs are attributable.
        let uid = job_uid(&source, phase);

        let synchronizer = self.factory.build(phase, &source);
        let sync_result = match synchronizer.sync(cancel).await {
            Ok(outcome) => Ok(outcome),
            Err(crate::port::SyncFailure::Directory(err)) => Err(err),
            // Anything beyond the directory protocol is not handled at this
            // layer.
            Err(crate::port::SyncFailure::Fatal(err)) => return Err(err),
        };

        match sync_result {
            Ok(outcome) => {
                let mut messages = outcome.messages;
                messages.push(format!("Synced {} objects.", outcome.count));

                let result = JobResult::new(
                    JobStatus::Successful,
                    messages,
                    self.time_provider.now_millis(),
                );
                self.results
                    .finalize(&uid, &result, self.result_retention_ms)
                    .await?;

                info!(uid = %uid, count = outcome.count, "Sync completed");
                Ok(RunOutcome::Finalized {
                    uid,
                    status: JobStatus::Successful,
                })
            }
            Err(err) => {
                // Finalizing the Error result is the notification; no event
                // is emitted here.
                debug!(uid = %uid, error = %err, "Sync failed with directory error");

                let result =
                    JobResult::new(JobStatus::Error, Vec::new(), self.time_provider.now_millis())
                        .with_error(err.detail());
                self.results
                    .finalize(&uid, &result, self.result_retention_ms)
                    .await?;

                Ok(RunOutcome::Finalized {
                    uid,
                    status: JobStatus::Error,
                })
            }
        }
    }
}
