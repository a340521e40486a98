//! HTTP API Layer
//!
//! Deploy submission, job status polling and the generator-agent inbox,
//! served with axum.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handler;
pub mod inbox;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use inbox::AgentInbox;
pub use server::{ApiServer, ApiServerConfig, ApiState};
