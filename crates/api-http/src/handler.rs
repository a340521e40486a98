//! HTTP Route Handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tfdeploy_core::application::DeployRequest;
use tfdeploy_core::domain::{Credential, JobId, JobRecord};
use tfdeploy_core::error::AppError;
use tracing::{info, warn};

use crate::auth::{provided_secret, secrets_match};
use crate::error::ApiError;
use crate::extract::DeployPayload;
use crate::server::ApiState;
use crate::types::{
    AcceptedResponse, AgentPushRequest, HealthResponse, LatestResponse, PushDeployResponse,
    StoredResponse,
};

pub const MISSING_SNIPPET: &str = "code is required";

/// POST /trigger-deploy
pub async fn trigger_deploy(
    State(state): State<ApiState>,
    DeployPayload(form): DeployPayload,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let accepted = submit(
        &state,
        DeployRequest {
            iac_source: form.tf_code,
            credential: form.do_token,
        },
    )
    .await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// GET /jobs/{job_id}
pub async fn get_job(
    State(state): State<ApiState>,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobRecord>, ApiError> {
    match state.deploy.status(&job_id).await {
        Ok(record) => Ok(Json(record)),
        Err(AppError::NotFound(_)) => Err(ApiError::JobNotFound),
        Err(e) => Err(e.into()),
    }
}

/// POST /agent/push
pub async fn agent_push(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<AgentPushRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(push) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let authorized = provided_secret(&headers, push.secret.as_deref())
        .is_some_and(|secret| secrets_match(&state.agent_secret, secret));
    if !authorized {
        warn!("Agent push rejected: bad secret");
        return Err(ApiError::Unauthorized);
    }

    let code = push
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_SNIPPET.to_string()))?;

    let ts = state.inbox.store(code.clone())?;
    info!(ts = %ts, deploy = %push.deploy, "Agent snippet stored");

    let has_credential = push
        .do_token
        .as_deref()
        .and_then(Credential::parse)
        .is_some()
        || state.deploy.has_default_credential();

    if push.deploy && has_credential {
        let accepted = submit(&state, DeployRequest::new(code, push.do_token)).await?;
        return Ok((
            StatusCode::ACCEPTED,
            Json(PushDeployResponse { accepted, ts }),
        )
            .into_response());
    }
    if push.deploy {
        warn!("Agent asked for a deploy but no token is available, snippet stored only");
    }

    Ok(Json(StoredResponse {
        status: "stored".to_string(),
        ts,
    })
    .into_response())
}

/// GET /agent/latest
pub async fn agent_latest(State(state): State<ApiState>) -> Result<Json<LatestResponse>, ApiError> {
    let response = match state.inbox.latest()? {
        Some((code, ts)) => LatestResponse {
            code: Some(code),
            ts,
        },
        None => LatestResponse { code: None, ts: 0 },
    };
    Ok(Json(response))
}

/// GET /healthz
pub async fn healthz(State(state): State<ApiState>) -> Json<HealthResponse> {
    let jobs = state.deploy.job_counts().await.unwrap_or_else(|e| {
        warn!(error = %e, "Job counts unavailable");
        Default::default()
    });
    Json(HealthResponse {
        status: "ok",
        version: tfdeploy_core::VERSION,
        jobs,
    })
}

async fn submit(state: &ApiState, req: DeployRequest) -> Result<AcceptedResponse, ApiError> {
    let job_id = state.deploy.submit(req).await?;
    let status_url = state.status_url(&job_id);
    Ok(AcceptedResponse::new(job_id, status_url))
}
