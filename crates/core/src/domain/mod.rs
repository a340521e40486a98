// Domain Layer - Pure business logic and entities

pub mod credential;
pub mod error;
pub mod execution_env;
pub mod job;

// Re-exports
pub use credential::{Credential, IacSource};
pub use error::DomainError;
pub use execution_env::{ExecutionEnv, CREDENTIAL_VARS};
pub use job::{JobId, JobRecord, JobStatus};
