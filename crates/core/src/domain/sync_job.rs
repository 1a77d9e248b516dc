// Queued sync job entity

use serde::{Deserialize, Serialize};

use super::phase::SyncPhase;
use super::source::SourceId;

/// Job ID (UUID v4)
pub type JobId = String;

/// Job type tag carried on queue rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobType(String);

/// The only job type this engine submits today.
pub const SYNC_JOB_TYPE: &str = "DIRECTORY_SYNC";

impl JobType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn sync() -> Self {
        Self(SYNC_JOB_TYPE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Queue substrate job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "QUEUED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Done => write!(f, "DONE"),
            JobState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Payload submitted with each sync job.
///
/// `phase` is optional: queued payloads from older releases carried only the
/// source id, and those jobs must drain as no-ops rather than fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJobPayload {
    pub source_id: SourceId,
    #[serde(default)]
    pub phase: Option<SyncPhase>,
}

impl SyncJobPayload {
    pub fn new(source_id: impl Into<String>, phase: SyncPhase) -> Self {
        Self {
            source_id: source_id.into(),
            phase: Some(phase),
        }
    }
}

/// Persisted job row owned by the queue substrate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: JobId,
    pub job_type: JobType,
    pub payload: SyncJobPayload,
    pub state: JobState,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,

    /// Infrastructure-level failure record (panic, fatal error, hard
    /// timeout). Distinct from the JobResult model.
    pub failure_reason: Option<String>,
}

impl SyncJob {
    /// Create a new queued job.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `payload` - Source id and phase selector
    pub fn new(id: impl Into<String>, created_at: i64, payload: SyncJobPayload) -> Self {
        Self {
            id: id.into(),
            job_type: JobType::sync(),
            payload,
            state: JobState::Queued,
            created_at,
            started_at: None,
            finished_at: None,
            failure_reason: None,
        }
    }

    /// Transition to Running with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.state != JobState::Queued {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "RUNNING".to_string(),
            });
        }
        self.state = JobState::Running;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Done with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.state != JobState::Running {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "DONE".to_string(),
            });
        }
        self.state = JobState::Done;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed with explicit timestamp and reason
    pub fn fail(&mut self, now_millis: i64, reason: impl Into<String>) {
        self.state = JobState::Failed;
        self.finished_at = Some(now_millis);
        self.failure_reason = Some(reason.into());
    }

    /// Create a test job with deterministic ID and timestamp.
    ///
    /// Uses a simple counter (test-1, test-2, ...); timestamps start at 1000
    /// and increment by 1000.
    ///
    /// **Note**: Tests only. Production code injects ID and time via
    /// providers.
    pub fn new_test(payload: SyncJobPayload) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::new(format!("test-{}", counter), (counter * 1000) as i64, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_lifecycle() {
        let mut job = SyncJob::new(
            "job-1",
            1000,
            SyncJobPayload::new("src-1", SyncPhase::Users),
        );
        assert_eq!(job.state, JobState::Queued);
        assert!(job.started_at.is_none());

        assert!(job.start(2000).is_ok());
        assert_eq!(job.state, JobState::Running);

        assert!(job.complete(3000).is_ok());
        assert_eq!(job.state, JobState::Done);
        assert_eq!(job.finished_at, Some(3000));
    }

    #[test]
    fn test_invalid_state_transitions() {
        let mut job = SyncJob::new(
            "job-2",
            1000,
            SyncJobPayload::new("src-1", SyncPhase::Groups),
        );

        // Cannot complete without starting
        assert!(job.complete(2000).is_err());

        assert!(job.start(2000).is_ok());
        // Cannot start again
        assert!(job.start(3000).is_err());
    }

    #[test]
    fn test_fail_records_reason() {
        let mut job = SyncJob::new(
            "job-3",
            1000,
            SyncJobPayload::new("src-1", SyncPhase::Users),
        );
        job.start(2000).unwrap();
        job.fail(3000, "hard time limit exceeded");
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(
            job.failure_reason.as_deref(),
            Some("hard time limit exceeded")
        );
    }

    #[test]
    fn test_payload_without_phase_deserializes() {
        // Older queued payloads carry only the source id.
        let payload: SyncJobPayload =
            serde_json::from_str(r#"{"source_id": "src-legacy"}"#).unwrap();
        assert_eq!(payload.source_id, "src-legacy");
        assert!(payload.phase.is_none());
    }

    #[test]
    fn test_payload_phase_enum_name() {
        let payload = SyncJobPayload::new("src-1", SyncPhase::Memberships);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["phase"], "MEMBERSHIPS");
    }
}
