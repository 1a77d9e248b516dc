// Result Store Port (Interface)
// The only shared mutable resource in this core: single writer per uid at
// finalization time, readers see a fully-formed result or absence.

use crate::domain::{JobResult, JobUid};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Store the finalized result for a uid, expiring `retention_ms` after
    /// its finalization timestamp. A later finalization for the same uid
    /// overwrites the earlier one.
    async fn finalize(&self, uid: &JobUid, result: &JobResult, retention_ms: i64) -> Result<()>;

    /// Fetch the result for a uid; None once expired or never finalized
    async fn get(&self, uid: &JobUid) -> Result<Option<JobResult>>;

    /// Drop expired results; returns rows removed
    async fn purge_expired(&self) -> Result<u64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::TimeProvider;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory result store for tests
    pub struct InMemoryResultStore {
        results: Mutex<HashMap<JobUid, (JobResult, i64)>>,
        time_provider: Arc<dyn TimeProvider>,
    }

    impl InMemoryResultStore {
        pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
            Self {
                results: Mutex::new(HashMap::new()),
                time_provider,
            }
        }

        /// Number of stored (possibly expired) results
        pub fn len(&self) -> usize {
            self.results.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl ResultStore for InMemoryResultStore {
        async fn finalize(
            &self,
            uid: &JobUid,
            result: &JobResult,
            retention_ms: i64,
        ) -> Result<()> {
            let expires_at = result.finalized_at + retention_ms;
            self.results
                .lock()
                .unwrap()
                .insert(uid.clone(), (result.clone(), expires_at));
            Ok(())
        }

        async fn get(&self, uid: &JobUid) -> Result<Option<JobResult>> {
            let now = self.time_provider.now_millis();
            Ok(self
                .results
                .lock()
                .unwrap()
                .get(uid)
                .filter(|(_, expires_at)| *expires_at > now)
                .map(|(result, _)| result.clone()))
        }

        async fn purge_expired(&self) -> Result<u64> {
            let now = self.time_provider.now_millis();
            let mut results = self.results.lock().unwrap();
            let before = results.len();
            results.retain(|_, (_, expires_at)| *expires_at > now);
            Ok((before - results.len()) as u64)
        }
    }
}
