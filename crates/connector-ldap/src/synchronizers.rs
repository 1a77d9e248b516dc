//! Per-phase LDAP synchronizers
//!
//! Each synchronizer is built for one source, runs one reconciliation pass
//! and is discarded. Directory failures surface on the recoverable arm of
//! the boundary; identity-store failures stay fatal.

use async_trait::async_trait;
use dirsync_core::domain::{Source, SyncPhase};
use dirsync_core::port::{
    CancelToken, DirectoryError, DirectoryGroup, DirectoryUser, IdentityStore, SyncFailure,
    SyncOutcome, Synchronizer, SynchronizerFactory,
};
use ldap3::SearchEntry;
use std::sync::Arc;
use tracing::debug;

use crate::config::LdapSettings;
use crate::directory::{object_class_filter, LdapDirectory};

/// Builds the synchronizer for a phase.
///
/// The match is the whole registry: one constructor per phase, resolved at
/// compile time.
pub struct LdapSynchronizerFactory {
    store: Arc<dyn IdentityStore>,
}

impl LdapSynchronizerFactory {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }
}

impl SynchronizerFactory for LdapSynchronizerFactory {
    fn build(&self, phase: SyncPhase, source: &Source) -> Box<dyn Synchronizer> {
        match phase {
            SyncPhase::Users => Box::new(UserSynchronizer {
                source: source.clone(),
                store: Arc::clone(&self.store),
            }),
            SyncPhase::Groups => Box::new(GroupSynchronizer {
                source: source.clone(),
                store: Arc::clone(&self.store),
            }),
            SyncPhase::Memberships => Box::new(MembershipSynchronizer {
                source: source.clone(),
                store: Arc::clone(&self.store),
            }),
        }
    }
}

fn first_attr(entry: &SearchEntry, name: &str) -> Option<String> {
    entry.attrs.get(name).and_then(|v| v.first()).cloned()
}

fn user_from_entry(entry: &SearchEntry, settings: &LdapSettings) -> Option<DirectoryUser> {
    let username = first_attr(entry, &settings.username_attribute)?;
    Some(DirectoryUser {
        dn: entry.dn.clone(),
        username,
        display_name: first_attr(entry, "cn"),
        email: first_attr(entry, "mail"),
    })
}

fn group_from_entry(entry: &SearchEntry) -> Option<DirectoryGroup> {
    let name = first_attr(entry, "cn")?;
    Some(DirectoryGroup {
        dn: entry.dn.clone(),
        name,
    })
}

fn check_cancel(cancel: &CancelToken) -> Result<(), DirectoryError> {
    if cancel.is_cancelled() {
        return Err(DirectoryError::Interrupted(
            "cancellation requested".to_string(),
        ));
    }
    Ok(())
}

/// Reconciles user entries into local identity state.
pub struct UserSynchronizer {
    source: Source,
    store: Arc<dyn IdentityStore>,
}

#[async_trait]
impl Synchronizer for UserSynchronizer {
    async fn sync(&self, cancel: CancelToken) -> Result<SyncOutcome, SyncFailure> {
        let settings = LdapSettings::from_source_settings(&self.source.settings)?;
        let directory = LdapDirectory::new(settings.clone());
        let mut ldap = directory.connect().await?;

        let filter = object_class_filter(&settings.user_object_class);
        let entries = directory
            .search(
                &mut ldap,
                &filter,
                vec![settings.username_attribute.as_str(), "cn", "mail"],
            )
            .await?;

        let mut count = 0u64;
        let mut messages = Vec::new();

        for entry in entries {
            check_cancel(&cancel)?;
            let entry = SearchEntry::construct(entry);
            match user_from_entry(&entry, &settings) {
                Some(user) => {
                    self.store.upsert_user(&self.source.id, &user).await?;
                    count += 1;
                }
                None => {
                    debug!(dn = %entry.dn, "User entry without username attribute");
                    messages.push(format!(
                        "Skipped {}: missing {} attribute.",
                        entry.dn, settings.username_attribute
                    ));
                }
            }
        }

        let _ = ldap.unbind().await;
        Ok(SyncOutcome { count, messages })
    }
}

/// Reconciles group entries into local identity state.
pub struct GroupSynchronizer {
    source: Source,
    store: Arc<dyn IdentityStore>,
}

#[async_trait]
impl Synchronizer for GroupSynchronizer {
    async fn sync(&self, cancel: CancelToken) -> Result<SyncOutcome, SyncFailure> {
        let settings = LdapSettings::from_source_settings(&self.source.settings)?;
        let directory = LdapDirectory::new(settings.clone());
        let mut ldap = directory.connect().await?;

        let filter = object_class_filter(&settings.group_object_class);
        let entries = directory.search(&mut ldap, &filter, vec!["cn"]).await?;

        let mut count = 0u64;
        let mut messages = Vec::new();

        for entry in entries {
            check_cancel(&cancel)?;
            let entry = SearchEntry::construct(entry);
            match group_from_entry(&entry) {
                Some(group) => {
                    self.store.upsert_group(&self.source.id, &group).await?;
                    count += 1;
                }
                None => {
                    debug!(dn = %entry.dn, "Group entry without cn attribute");
                    messages.push(format!("Skipped {}: missing cn attribute.", entry.dn));
                }
            }
        }

        let _ = ldap.unbind().await;
        Ok(SyncOutcome { count, messages })
    }
}

/// Links group members to locally known users.
///
/// Runs after the user and group phases by submission order, but the
/// substrate does not guarantee that order: members that cannot be resolved
/// locally yet are skipped and reported, never treated as failures.
pub struct MembershipSynchronizer {
    source: Source,
    store: Arc<dyn IdentityStore>,
}

#[async_trait]
impl Synchronizer for MembershipSynchronizer {
    async fn sync(&self, cancel: CancelToken) -> Result<SyncOutcome, SyncFailure> {
        let settings = LdapSettings::from_source_settings(&self.source.settings)?;
        let directory = LdapDirectory::new(settings.clone());
        let mut ldap = directory.connect().await?;

        let filter = object_class_filter(&settings.group_object_class);
        let entries = directory
            .search(&mut ldap, &filter, vec![settings.member_attribute.as_str()])
            .await?;

        let mut count = 0u64;
        let mut skipped = 0u64;
        let mut messages = Vec::new();

        for entry in entries {
            check_cancel(&cancel)?;
            let entry = SearchEntry::construct(entry);
            let members = entry
                .attrs
                .get(&settings.member_attribute)
                .cloned()
                .unwrap_or_default();

            for member_dn in members {
                let linked = self
                    .store
                    .link_membership(&self.source.id, &entry.dn, &member_dn)
                    .await?;
                if linked {
                    count += 1;
                } else {
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            messages.push(format!("Skipped {} unresolved members.", skipped));
        }

        let _ = ldap.unbind().await;
        Ok(SyncOutcome { count, messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsync_core::port::cancel_channel;
    use dirsync_core::port::identity_store::mocks::InMemoryIdentityStore;
    use std::collections::HashMap;

    fn settings() -> LdapSettings {
        LdapSettings::from_source_settings(&serde_json::json!({
            "host": "ldap.corp.example",
            "base_dn": "dc=corp,dc=example",
            "bind_dn": "cn=sync,dc=corp,dc=example",
        }))
        .unwrap()
    }

    fn entry(dn: &str, attrs: &[(&str, &[&str])]) -> SearchEntry {
        SearchEntry {
            dn: dn.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
                .collect(),
            bin_attrs: HashMap::new(),
        }
    }

    #[test]
    fn test_user_from_entry() {
        let entry = entry(
            "uid=jdoe,dc=corp,dc=example",
            &[
                ("uid", &["jdoe"]),
                ("cn", &["Jane Doe"]),
                ("mail", &["jdoe@corp.example"]),
            ],
        );
        let user = user_from_entry(&entry, &settings()).unwrap();
        assert_eq!(user.username, "jdoe");
        assert_eq!(user.display_name.as_deref(), Some("Jane Doe"));
        assert_eq!(user.email.as_deref(), Some("jdoe@corp.example"));
    }

    #[test]
    fn test_user_without_username_attribute_is_skipped() {
        let entry = entry("cn=svc,dc=corp", &[("cn", &["svc"])]);
        assert!(user_from_entry(&entry, &settings()).is_none());
    }

    #[test]
    fn test_group_from_entry() {
        let entry = entry("cn=staff,dc=corp", &[("cn", &["staff"])]);
        let group = group_from_entry(&entry).unwrap();
        assert_eq!(group.name, "staff");
    }

    #[tokio::test]
    async fn test_factory_builds_per_phase() {
        let factory = LdapSynchronizerFactory::new(Arc::new(InMemoryIdentityStore::new()));
        let source = Source::new("src-1", "Corp Directory", true);
        for phase in SyncPhase::ORDERED {
            // Construction never touches the network
            let _ = factory.build(phase, &source);
        }
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_on_recoverable_arm() {
        let factory = LdapSynchronizerFactory::new(Arc::new(InMemoryIdentityStore::new()));
        let source = Source::new("src-1", "Corp Directory", true); // settings: null
        let synchronizer = factory.build(SyncPhase::Users, &source);

        let (_, token) = cancel_channel();
        match synchronizer.sync(token).await {
            Err(SyncFailure::Directory(DirectoryError::Configuration(_))) => {}
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
    }
}
