// dirsync Infrastructure - SQLite Adapter
// Implements: JobQueue, SourceRepository/SourceAdmin, ResultStore,
// IdentityStore, Maintenance

mod connection;
mod identity_store;
mod job_queue;
mod maintenance_impl;
mod migration;
mod result_store;
mod source_repository;

pub use connection::create_pool;
pub use identity_store::SqliteIdentityStore;
pub use job_queue::SqliteJobQueue;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::run_migrations;
pub use result_store::SqliteResultStore;
pub use source_repository::SqliteSourceRepository;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
