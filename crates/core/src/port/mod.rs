// Port Layer - Interfaces for external dependencies

pub mod cancel;
pub mod id_provider; // For deterministic testing
pub mod identity_store;
pub mod job_queue;
pub mod maintenance;
pub mod result_store;
pub mod source_repository;
pub mod synchronizer;
pub mod time_provider;

// Re-exports
pub use cancel::{cancel_channel, CancelSender, CancelToken};
pub use id_provider::IdProvider;
pub use identity_store::{DirectoryGroup, DirectoryUser, IdentityStore};
pub use job_queue::JobQueue;
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceStats};
pub use result_store::ResultStore;
pub use source_repository::{SourceAdmin, SourceRepository};
pub use synchronizer::{
    DirectoryError, SyncFailure, SyncOutcome, Synchronizer, SynchronizerFactory,
};
pub use time_provider::TimeProvider;
