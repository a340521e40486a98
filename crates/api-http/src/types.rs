//! HTTP Request/Response Types

use serde::{Deserialize, Serialize};
use tfdeploy_core::application::JobCounts;
use tfdeploy_core::domain::JobId;

/// POST /trigger-deploy body (form, multipart or JSON).
/// Not `Debug`: it holds the raw token.
#[derive(Default, Deserialize)]
pub struct DeployForm {
    #[serde(default)]
    pub tf_code: Option<String>,
    #[serde(default)]
    pub do_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptedResponse {
    pub status: String,
    pub job_id: JobId,
    pub status_url: String,
}

impl AcceptedResponse {
    pub fn new(job_id: JobId, status_url: String) -> Self {
        Self {
            status: "accepted".to_string(),
            job_id,
            status_url,
        }
    }
}

/// `{status: "error", message}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// POST /agent/push body
#[derive(Default, Deserialize)]
pub struct AgentPushRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub deploy: bool,
    #[serde(default)]
    pub do_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: String,
    pub ts: i64,
}

/// Accept payload plus the snippet timestamp, for pushes that also deploy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushDeployResponse {
    #[serde(flatten)]
    pub accepted: AcceptedResponse,
    pub ts: i64,
}

/// GET /agent/latest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LatestResponse {
    pub code: Option<String>,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub jobs: JobCounts,
}
