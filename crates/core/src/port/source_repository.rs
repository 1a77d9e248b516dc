// Source Repository Port (Interface)

use crate::domain::{Source, SourceId};
use crate::error::Result;
use async_trait::async_trait;

/// Read access to configured directory sources.
///
/// Sources are owned by configuration storage; the orchestration layer only
/// ever reads snapshots through this port.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Load a source snapshot by id
    async fn find_by_id(&self, id: &SourceId) -> Result<Option<Source>>;

    /// All sources with enabled = true
    async fn find_enabled(&self) -> Result<Vec<Source>>;
}

/// Configuration-storage edge used by the API surface only.
///
/// The orchestration core never calls these.
#[async_trait]
pub trait SourceAdmin: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Source>>;

    async fn insert(&self, source: &Source) -> Result<()>;

    async fn set_enabled(&self, id: &SourceId, enabled: bool) -> Result<()>;

    async fn delete(&self, id: &SourceId) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// In-memory source repository for tests
    #[derive(Default)]
    pub struct InMemorySourceRepository {
        sources: Mutex<Vec<Source>>,
    }

    impl InMemorySourceRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_sources(sources: Vec<Source>) -> Self {
            Self {
                sources: Mutex::new(sources),
            }
        }

        pub fn add(&self, source: Source) {
            self.sources.lock().unwrap().push(source);
        }

        /// Simulate external deletion between submission and execution
        pub fn remove(&self, id: &str) {
            self.sources.lock().unwrap().retain(|s| s.id != id);
        }
    }

    #[async_trait]
    impl SourceRepository for InMemorySourceRepository {
        async fn find_by_id(&self, id: &SourceId) -> Result<Option<Source>> {
            Ok(self
                .sources
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.id == id)
                .cloned())
        }

        async fn find_enabled(&self) -> Result<Vec<Source>> {
            Ok(self
                .sources
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.enabled)
                .cloned()
                .collect())
        }
    }
}
