// Job result model

use serde::{Deserialize, Serialize};

use super::phase::SyncPhase;
use super::source::Source;

/// Deterministic label correlating a submitted job with its eventual result.
///
/// Shared by concurrent or repeated submissions for the same (source, phase)
/// pair - a label for monitoring, not a mutex.
pub type JobUid = String;

/// Compute the job uid for a source/phase pair.
pub fn job_uid(source: &Source, phase: SyncPhase) -> JobUid {
    format!("{}-{}", source.slug(), phase.synchronizer_name())
}

/// Outcome status of a finalized job.
///
/// `Unknown` is what an inspector sees for a uid that was never finalized
/// (missing source, missing phase, hard timeout) - it is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Successful,
    Error,
    Unknown,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Successful => write!(f, "SUCCESSFUL"),
            JobStatus::Error => write!(f, "ERROR"),
            JobStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Immutable, time-bounded record of a job's outcome.
///
/// Finalized at most once per execution; the store keeps the latest
/// finalization per uid for a bounded inspection window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub status: JobStatus,
    pub messages: Vec<String>,
    pub error: Option<String>,
    pub finalized_at: i64, // epoch ms
}

impl JobResult {
    pub fn new(status: JobStatus, messages: Vec<String>, finalized_at: i64) -> Self {
        Self {
            status,
            messages,
            error: None,
            finalized_at,
        }
    }

    /// Attach the captured error detail (Error results).
    pub fn with_error(mut self, detail: impl Into<String>) -> Self {
        self.error = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_uid_format() {
        let source = Source::new("src-1", "Corp Directory", true);
        assert_eq!(
            job_uid(&source, SyncPhase::Users),
            "corp-directory-UserSynchronizer"
        );
        assert_eq!(
            job_uid(&source, SyncPhase::Memberships),
            "corp-directory-MembershipSynchronizer"
        );
    }

    #[test]
    fn test_uid_identical_for_repeated_submissions() {
        let source = Source::new("src-1", "Corp Directory", true);
        assert_eq!(
            job_uid(&source, SyncPhase::Groups),
            job_uid(&source, SyncPhase::Groups)
        );
    }

    #[test]
    fn test_with_error() {
        let result = JobResult::new(JobStatus::Error, vec![], 1000)
            .with_error("connection refused");
        assert_eq!(result.error.as_deref(), Some("connection refused"));
        assert_eq!(result.status, JobStatus::Error);
    }
}
