// Quota Guard Port
// Pre-flight check against the provider's account limits

use crate::domain::Credential;
use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a successful quota query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Approved { usage: u64, limit: u64 },
    Rejected { usage: u64, limit: u64, reason: String },
}

impl QuotaDecision {
    /// Approve only while usage is strictly below the limit
    pub fn evaluate(usage: u64, limit: u64) -> Self {
        if usage < limit {
            QuotaDecision::Approved { usage, limit }
        } else {
            QuotaDecision::Rejected {
                usage,
                limit,
                reason: format!(
                    "Droplet limit reached: {} of {} droplets in use",
                    usage, limit
                ),
            }
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, QuotaDecision::Approved { .. })
    }
}

/// Failures of the check itself, as opposed to an explicit rejection
#[derive(Error, Debug)]
pub enum QuotaError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// What to do when the quota check errors out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotaFailurePolicy {
    /// Let the job proceed (availability over safety)
    #[default]
    FailOpen,
    /// Refuse the submission
    FailClosed,
}

#[async_trait]
pub trait QuotaGuard: Send + Sync {
    async fn check(&self, credential: &Credential) -> Result<QuotaDecision, QuotaError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    pub enum MockQuota {
        /// Report the given usage against the limit
        Usage { usage: u64, limit: u64 },
        /// Fail the check with a network error
        Unreachable(String),
    }

    pub struct MockQuotaGuard {
        behavior: MockQuota,
        calls: AtomicUsize,
    }

    impl MockQuotaGuard {
        pub fn new(behavior: MockQuota) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn approving() -> Self {
            Self::new(MockQuota::Usage { usage: 0, limit: 10 })
        }

        pub fn with_usage(usage: u64, limit: u64) -> Self {
            Self::new(MockQuota::Usage { usage, limit })
        }

        pub fn unreachable(message: impl Into<String>) -> Self {
            Self::new(MockQuota::Unreachable(message.into()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuotaGuard for MockQuotaGuard {
        async fn check(&self, _credential: &Credential) -> Result<QuotaDecision, QuotaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                MockQuota::Usage { usage, limit } => Ok(QuotaDecision::evaluate(*usage, *limit)),
                MockQuota::Unreachable(msg) => Err(QuotaError::Network(msg.clone())),
            }
        }
    }
}
