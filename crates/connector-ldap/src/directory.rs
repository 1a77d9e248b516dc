//! LDAP connection plumbing
//!
//! Connect, bind and search against one configured source, mapping protocol
//! failures into the directory error taxonomy.

use dirsync_core::port::DirectoryError;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, ResultEntry, Scope};
use tracing::{debug, info, warn};

use crate::config::LdapSettings;

/// LDAP result code for invalid credentials
const RC_INVALID_CREDENTIALS: u32 = 49;

pub struct LdapDirectory {
    settings: LdapSettings,
}

impl LdapDirectory {
    pub fn new(settings: LdapSettings) -> Self {
        Self { settings }
    }

    /// Open a connection and bind with the configured credentials.
    pub async fn connect(&self) -> Result<Ldap, DirectoryError> {
        let url = self.settings.url();

        debug!(url = %url, "Connecting to LDAP server");

        let conn_settings = LdapConnSettings::new()
            .set_conn_timeout(std::time::Duration::from_secs(
                self.settings.connection_timeout_secs,
            ))
            .set_starttls(self.settings.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(conn_settings, &url)
            .await
            .map_err(|e| {
                DirectoryError::Connection(format!("connect to {} failed: {}", url, e))
            })?;

        // Spawn the connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.settings.bind_dn;
        let bind_password = self.settings.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap
            .simple_bind(bind_dn, bind_password)
            .await
            .map_err(|e| DirectoryError::Bind(format!("bind as {} failed: {}", bind_dn, e)))?;

        if result.rc != 0 {
            if result.rc == RC_INVALID_CREDENTIALS {
                return Err(DirectoryError::Bind(format!(
                    "invalid credentials for {}",
                    bind_dn
                )));
            }
            return Err(DirectoryError::Bind(format!(
                "bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.settings.host, "LDAP connection established");

        Ok(ldap)
    }

    /// Subtree search under the configured base DN.
    pub async fn search(
        &self,
        ldap: &mut Ldap,
        filter: &str,
        attrs: Vec<&str>,
    ) -> Result<Vec<ResultEntry>, DirectoryError> {
        debug!(
            filter = %filter,
            base_dn = %self.settings.base_dn,
            "Searching LDAP"
        );

        let result = ldap
            .search(&self.settings.base_dn, Scope::Subtree, filter, attrs)
            .await
            .map_err(|e| DirectoryError::Search(format!("search failed: {}", e)))?;

        let (entries, _) = result
            .success()
            .map_err(|e| DirectoryError::Search(format!("search failed: {}", e)))?;

        debug!(entries = entries.len(), "LDAP search completed");

        Ok(entries)
    }
}

/// Build an objectClass filter for the given class.
pub fn object_class_filter(object_class: &str) -> String {
    format!("(objectClass={})", escape_filter_value(object_class))
}

/// Escape special characters in LDAP filter values (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}
