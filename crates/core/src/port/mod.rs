// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_store;
pub mod provisioner;
pub mod quota_guard;
pub mod time_provider;
pub mod workspace;

// Re-exports
pub use id_provider::IdProvider;
pub use job_store::JobStore;
pub use provisioner::{ExecutionError, ProvisionOutcome, Provisioner};
pub use quota_guard::{QuotaDecision, QuotaError, QuotaFailurePolicy, QuotaGuard};
pub use time_provider::TimeProvider;
pub use workspace::{Workspace, WorkspaceManager};
