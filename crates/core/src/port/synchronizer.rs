// Synchronizer Port
// Abstraction over the per-phase directory reconciliation collaborator

use crate::domain::{Source, SyncPhase};
use crate::port::cancel::CancelToken;
use async_trait::async_trait;
use thiserror::Error;

/// What one reconciliation pass produced.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Number of directory objects processed.
    pub count: u64,
    /// Human-readable messages accumulated during the pass.
    pub messages: Vec<String>,
}

/// Directory-protocol failure taxonomy.
///
/// The one error class the orchestration layer recovers from: it is captured
/// into an Error job result at the call boundary and never re-raised. Every
/// other failure is fatal to the job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Bind failed: {0}")]
    Bind(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Invalid source settings: {0}")]
    Configuration(String),

    #[error("Sync interrupted: {0}")]
    Interrupted(String),
}

impl DirectoryError {
    /// Detail string captured into an Error job result.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

/// Failure arms of the synchronizer boundary.
///
/// Only the directory arm is recovered by the caller; the fatal arm keeps
/// propagating to the substrate.
#[derive(Error, Debug)]
pub enum SyncFailure {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Fatal(#[from] crate::error::AppError),
}

/// One reconciliation phase against one source.
///
/// Constructed per job execution and discarded afterwards. Implementations
/// should poll `cancel` at convenient points; the worker's hard cap will
/// terminate them regardless.
#[async_trait]
pub trait Synchronizer: Send + Sync {
    async fn sync(&self, cancel: CancelToken) -> Result<SyncOutcome, SyncFailure>;
}

/// Static phase-to-synchronizer mapping.
///
/// Implementations match exhaustively on `SyncPhase` - there is no runtime
/// registry and no name-based lookup.
pub trait SynchronizerFactory: Send + Sync {
    fn build(&self, phase: SyncPhase, source: &Source) -> Box<dyn Synchronizer>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock synchronizer behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return the given count and messages
        Success { count: u64, messages: Vec<String> },
        /// Fail with a directory error (recovered into an Error result)
        Fail(DirectoryError),
        /// Fail with a fatal error (propagates to the substrate)
        FatalFail(String),
        /// Block until cancelled, then report interruption
        Hang,
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock synchronizer for testing
    pub struct MockSynchronizer {
        behavior: MockBehavior,
    }

    impl MockSynchronizer {
        pub fn new(behavior: MockBehavior) -> Self {
            Self { behavior }
        }
    }

    #[async_trait]
    impl Synchronizer for MockSynchronizer {
        async fn sync(&self, mut cancel: CancelToken) -> Result<SyncOutcome, SyncFailure> {
            match self.behavior.clone() {
                MockBehavior::Success { count, messages } => Ok(SyncOutcome { count, messages }),
                MockBehavior::Fail(err) => Err(err.into()),
                MockBehavior::FatalFail(msg) => {
                    Err(crate::error::AppError::Internal(msg).into())
                }
                MockBehavior::Hang => {
                    cancel.cancelled().await;
                    Err(DirectoryError::Interrupted(
                        "cancellation requested".to_string(),
                    )
                    .into())
                }
                MockBehavior::Panic(msg) => panic!("{}", msg),
            }
        }
    }

    /// Mock factory returning the same behavior for every phase.
    ///
    /// Records each (source id, phase) it was asked to build, so tests can
    /// assert construction happened per execution.
    pub struct MockSynchronizerFactory {
        behavior: MockBehavior,
        built: Arc<Mutex<Vec<(String, SyncPhase)>>>,
    }

    impl MockSynchronizerFactory {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                built: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success(count: u64) -> Self {
            Self::new(MockBehavior::Success {
                count,
                messages: Vec::new(),
            })
        }

        pub fn new_fail(err: DirectoryError) -> Self {
            Self::new(MockBehavior::Fail(err))
        }

        pub fn built(&self) -> Vec<(String, SyncPhase)> {
            self.built.lock().unwrap().clone()
        }
    }

    impl SynchronizerFactory for MockSynchronizerFactory {
        fn build(&self, phase: SyncPhase, source: &Source) -> Box<dyn Synchronizer> {
            self.built.lock().unwrap().push((source.id.clone(), phase));
            Box::new(MockSynchronizer::new(self.behavior.clone()))
        }
    }
}
