// ID Provider Port (for deterministic testing)

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a unique id for a queue submission
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
///
/// Job uids are derived from source name and phase, never from this - this
/// only labels individual queue submissions.
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_per_submission() {
        let provider = UuidProvider;
        assert_ne!(provider.generate_id(), provider.generate_id());
    }
}
