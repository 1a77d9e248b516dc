// Domain Layer - Pure business logic and entities

pub mod error;
pub mod phase;
pub mod result;
pub mod source;
pub mod sync_job;

// Re-exports
pub use error::DomainError;
pub use phase::SyncPhase;
pub use result::{job_uid, JobResult, JobStatus, JobUid};
pub use source::{Source, SourceId};
pub use sync_job::{JobId, JobState, JobType, SyncJob, SyncJobPayload, SYNC_JOB_TYPE};
