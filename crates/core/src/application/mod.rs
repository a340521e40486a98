// Application Layer - Use Cases and Business Logic

pub mod credential;
pub mod deploy;
pub mod worker;

// Re-exports
pub use deploy::{DeployRequest, DeployService, JobCounts};
pub use worker::{JobTicket, Worker};
