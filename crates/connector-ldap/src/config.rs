//! LDAP source settings
//!
//! Parsed from the opaque `settings` value on a source snapshot.

use dirsync_core::port::DirectoryError;
use serde::{Deserialize, Serialize};

/// Connection and search settings for one LDAP source.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapSettings {
    /// LDAP server hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN for all searches (e.g., "dc=example,dc=com").
    pub base_dn: String,

    /// Bind DN for authentication.
    pub bind_dn: String,

    /// Bind password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Object class identifying user entries.
    #[serde(default = "default_user_object_class")]
    pub user_object_class: String,

    /// Object class identifying group entries.
    #[serde(default = "default_group_object_class")]
    pub group_object_class: String,

    /// Attribute holding the login name on user entries.
    #[serde(default = "default_username_attribute")]
    pub username_attribute: String,

    /// Attribute holding the member DNs on group entries.
    #[serde(default = "default_member_attribute")]
    pub member_attribute: String,
}

impl std::fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("user_object_class", &self.user_object_class)
            .field("group_object_class", &self.group_object_class)
            .field("username_attribute", &self.username_attribute)
            .field("member_attribute", &self.member_attribute)
            .finish()
    }
}

fn default_ldap_port() -> u16 {
    389
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_object_class() -> String {
    "inetOrgPerson".to_string()
}

fn default_group_object_class() -> String {
    "groupOfNames".to_string()
}

fn default_username_attribute() -> String {
    "uid".to_string()
}

fn default_member_attribute() -> String {
    "member".to_string()
}

impl LdapSettings {
    /// Parse and validate the settings value carried on a source.
    pub fn from_source_settings(settings: &serde_json::Value) -> Result<Self, DirectoryError> {
        let parsed: LdapSettings = serde_json::from_value(settings.clone())
            .map_err(|e| DirectoryError::Configuration(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), DirectoryError> {
        if self.host.is_empty() {
            return Err(DirectoryError::Configuration("host is required".to_string()));
        }
        if self.base_dn.is_empty() {
            return Err(DirectoryError::Configuration(
                "base_dn is required".to_string(),
            ));
        }
        if self.bind_dn.is_empty() {
            return Err(DirectoryError::Configuration(
                "bind_dn is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Server URL for the configured transport.
    pub fn url(&self) -> String {
        if self.use_ssl {
            format!("ldaps://{}:{}", self.host, self.port)
        } else {
            format!("ldap://{}:{}", self.host, self.port)
        }
    }
}
