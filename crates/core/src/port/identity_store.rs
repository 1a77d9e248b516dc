// Identity Store Port (Interface)
// Local identity state written by the synchronizers. The orchestration
// layer never touches this; it is the seam between a synchronizer and
// storage.

use crate::domain::SourceId;
use crate::error::Result;
use async_trait::async_trait;

/// A directory user as reconciled locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    pub dn: String,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// A directory group as reconciled locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    pub dn: String,
    pub name: String,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn upsert_user(&self, source_id: &SourceId, user: &DirectoryUser) -> Result<()>;

    async fn upsert_group(&self, source_id: &SourceId, group: &DirectoryGroup) -> Result<()>;

    /// Link a member to a group.
    ///
    /// Returns false when either side is not known locally yet - membership
    /// runs after the user and group phases, but the substrate does not
    /// guarantee that order, so unresolved pairs are skipped rather than
    /// failed.
    async fn link_membership(
        &self,
        source_id: &SourceId,
        group_dn: &str,
        member_dn: &str,
    ) -> Result<bool>;

    async fn count_users(&self, source_id: &SourceId) -> Result<i64>;

    async fn count_groups(&self, source_id: &SourceId) -> Result<i64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        users: HashMap<(String, String), DirectoryUser>,
        groups: HashMap<(String, String), DirectoryGroup>,
        memberships: HashSet<(String, String, String)>,
    }

    /// In-memory identity store for tests
    #[derive(Default)]
    pub struct InMemoryIdentityStore {
        state: Mutex<State>,
    }

    impl InMemoryIdentityStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn membership_count(&self) -> usize {
            self.state.lock().unwrap().memberships.len()
        }
    }

    #[async_trait]
    impl IdentityStore for InMemoryIdentityStore {
        async fn upsert_user(&self, source_id: &SourceId, user: &DirectoryUser) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .users
                .insert((source_id.clone(), user.dn.clone()), user.clone());
            Ok(())
        }

        async fn upsert_group(&self, source_id: &SourceId, group: &DirectoryGroup) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .groups
                .insert((source_id.clone(), group.dn.clone()), group.clone());
            Ok(())
        }

        async fn link_membership(
            &self,
            source_id: &SourceId,
            group_dn: &str,
            member_dn: &str,
        ) -> Result<bool> {
            let mut state = self.state.lock().unwrap();
            let group_known = state
                .groups
                .contains_key(&(source_id.clone(), group_dn.to_string()));
            let member_known = state
                .users
                .contains_key(&(source_id.clone(), member_dn.to_string()));
            if !group_known || !member_known {
                return Ok(false);
            }
            state.memberships.insert((
                source_id.clone(),
                group_dn.to_string(),
                member_dn.to_string(),
            ));
            Ok(true)
        }

        async fn count_users(&self, source_id: &SourceId) -> Result<i64> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .users
                .keys()
                .filter(|(sid, _)| sid == source_id)
                .count() as i64)
        }

        async fn count_groups(&self, source_id: &SourceId) -> Result<i64> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .groups
                .keys()
                .filter(|(sid, _)| sid == source_id)
                .count() as i64)
        }
    }
}
