// Application Layer - Use Cases and Business Logic

pub mod maintenance;
pub mod recovery;
pub mod runner;
pub mod sync_all;
pub mod trigger;
pub mod worker;

// Re-exports
pub use maintenance::MaintenanceScheduler;
pub use recovery::RecoveryService;
pub use runner::{RunOutcome, SyncJobRunner};
pub use trigger::SyncTrigger;
pub use worker::{TimeoutConfig, Worker};
