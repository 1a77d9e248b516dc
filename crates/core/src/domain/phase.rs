// Synchronization phases

use serde::{Deserialize, Serialize};

/// One reconciliation sub-task applied to a single source.
///
/// The order is fixed: membership resolution requires users and groups to
/// already exist locally, so `Users` and `Groups` run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncPhase {
    Users,
    Groups,
    Memberships,
}

impl SyncPhase {
    /// All phases in dispatch order.
    pub const ORDERED: [SyncPhase; 3] = [SyncPhase::Users, SyncPhase::Groups, SyncPhase::Memberships];

    /// Explicit synchronizer name for this phase.
    ///
    /// Part of the job uid, so it must stay stable across releases.
    pub fn synchronizer_name(&self) -> &'static str {
        match self {
            SyncPhase::Users => "UserSynchronizer",
            SyncPhase::Groups => "GroupSynchronizer",
            SyncPhase::Memberships => "MembershipSynchronizer",
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::Users => write!(f, "USERS"),
            SyncPhase::Groups => write!(f, "GROUPS"),
            SyncPhase::Memberships => write!(f, "MEMBERSHIPS"),
        }
    }
}

impl std::str::FromStr for SyncPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USERS" => Ok(SyncPhase::Users),
            "GROUPS" => Ok(SyncPhase::Groups),
            "MEMBERSHIPS" => Ok(SyncPhase::Memberships),
            _ => Err(format!("Unknown sync phase: {}", s)),
        }
    }
}
