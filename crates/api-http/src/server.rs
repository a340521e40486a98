//! HTTP Server
//!
//! Builds the axum router and serves it until the shutdown signal fires.

use crate::handler;
use crate::inbox::AgentInbox;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tfdeploy_core::application::DeployService;
use tfdeploy_core::domain::JobId;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub deploy: Arc<DeployService>,
    pub inbox: Arc<AgentInbox>,
    pub agent_secret: Arc<str>,
    /// Prefix for `status_url`; relative URLs when unset
    pub public_url: Option<Arc<str>>,
}

impl ApiState {
    pub fn new(
        deploy: Arc<DeployService>,
        inbox: Arc<AgentInbox>,
        agent_secret: impl Into<String>,
    ) -> Self {
        Self {
            deploy,
            inbox,
            agent_secret: Arc::from(agent_secret.into()),
            public_url: None,
        }
    }

    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .map(Arc::from);
        self
    }

    pub fn status_url(&self, job_id: &JobId) -> String {
        match &self.public_url {
            Some(base) => format!("{}/jobs/{}", base, job_id),
            None => format!("/jobs/{}", job_id),
        }
    }
}

pub struct ApiServer {
    config: ApiServerConfig,
    state: ApiState,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: ApiState) -> Self {
        Self { config, state }
    }

    pub fn router(state: ApiState) -> Router {
        Router::new()
            .route("/trigger-deploy", post(handler::trigger_deploy))
            .route("/jobs/{job_id}", get(handler::get_job))
            .route("/agent/push", post(handler::agent_push))
            .route("/agent/latest", get(handler::agent_latest))
            .route("/healthz", get(handler::healthz))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "HTTP server listening"
        );

        Self::serve(listener, self.state, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, Self::router(state))
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("HTTP server stopped");
        Ok(())
    }
}
