// ID Provider Port (for deterministic testing)

use crate::domain::JobId;

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique job ID
    fn generate_id(&self) -> JobId;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> JobId {
        uuid::Uuid::new_v4().to_string()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Always returns the same id (for duplicate-create testing)
    pub struct FixedIdProvider(pub String);

    impl IdProvider for FixedIdProvider {
        fn generate_id(&self) -> JobId {
            self.0.clone()
        }
    }

    /// job-1, job-2, ...
    #[derive(Default)]
    pub struct SequentialIdProvider(AtomicU64);

    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self) -> JobId {
            format!("job-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }
}
