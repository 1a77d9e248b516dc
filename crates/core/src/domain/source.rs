// Directory source snapshot

use serde::{Deserialize, Serialize};

/// Source ID (opaque, assigned by configuration storage)
pub type SourceId = String;

/// One configured external directory endpoint.
///
/// Owned by configuration storage; this core only ever reads a snapshot by
/// identifier. `settings` is opaque here - connector crates parse it into
/// their own config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub settings: serde_json::Value,
}

impl Source {
    pub fn new(id: impl Into<String>, name: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled,
            settings: serde_json::Value::Null,
        }
    }

    pub fn with_settings(mut self, settings: serde_json::Value) -> Self {
        self.settings = settings;
        self
    }

    /// Normalized name used in job uids: lowercase alphanumeric runs joined
    /// by single hyphens, no leading or trailing hyphen.
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_hyphen = true; // suppress a leading hyphen
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
