//! LDAP synchronizers for dirsync
//!
//! Implements the core synchronizer ports against LDAP directories: one
//! synchronizer per phase (users, groups, memberships) plus the factory the
//! composition root wires into the job runner.

pub mod config;
pub mod directory;
pub mod synchronizers;

pub use config::LdapSettings;
pub use synchronizers::{
    GroupSynchronizer, LdapSynchronizerFactory, MembershipSynchronizer, UserSynchronizer,
};
