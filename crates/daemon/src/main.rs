//! tfdeploy daemon - Main Entry Point
//! HTTP API + per-job provisioning workers

mod config;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{DaemonConfig, LogFormat, DAEMON_SECRET_VARS};
use tfdeploy_api_http::{AgentInbox, ApiServer, ApiServerConfig, ApiState};
use tfdeploy_core::application::credential::capture_base_env;
use tfdeploy_core::application::{DeployService, Worker};
use tfdeploy_core::port::id_provider::UuidProvider;
use tfdeploy_core::port::time_provider::SystemTimeProvider;
use tfdeploy_core::port::QuotaFailurePolicy;
use tfdeploy_infra_digitalocean::DigitalOceanQuotaGuard;
use tfdeploy_infra_memory::MemoryJobStore;
use tfdeploy_infra_system::{TempWorkspaceManager, TerraformExecutor};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "tfdeploy=info,tower_http=info";

fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    match format {
        LogFormat::Json => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C. In-flight jobs are not cancelled.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received. Exiting gracefully...");
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env().context("Invalid configuration")?;

    // 2. Initialize logging
    init_logging(config.log_format)?;
    info!("tfdeploy v{} starting...", VERSION);
    info!(
        terraform_bin = %config.terraform_bin.display(),
        workspace_root = %config.workspace_root.display(),
        do_api_url = %config.do_api_url,
        quota_policy = ?config.quota_policy,
        default_token = %config.default_credential.is_some(),
        "Configuration loaded"
    );
    if config.quota_policy == QuotaFailurePolicy::FailOpen {
        info!("Quota check failures will not block deployments (fail-open)");
    }

    // 3. Snapshot the environment terraform will inherit
    let mut base_env = capture_base_env(config.env_allowlist.as_deref());
    for key in DAEMON_SECRET_VARS {
        base_env.remove(key);
    }
    if !base_env.contains_key("PATH") {
        warn!("PATH is not passed to terraform; set TFDEPLOY_TERRAFORM_BIN to an absolute path");
    }

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let job_store = Arc::new(MemoryJobStore::new(time_provider.clone()));
    let workspaces = Arc::new(TempWorkspaceManager::new(config.workspace_root.clone()));
    let executor = Arc::new(TerraformExecutor::new(
        config.terraform_bin.clone(),
        time_provider.clone(),
    ));
    let quota_guard = Arc::new(
        DigitalOceanQuotaGuard::new(config.do_api_url.clone(), config.quota_timeout)
            .context("Quota guard setup failed")?,
    );

    let worker = Worker::new(job_store.clone(), workspaces, executor, base_env);
    let deploy = DeployService::new(
        job_store,
        quota_guard,
        worker,
        Arc::new(UuidProvider),
        time_provider.clone(),
    )
    .with_quota_policy(config.quota_policy)
    .with_default_credential(config.default_credential.clone());

    let state = ApiState::new(
        Arc::new(deploy),
        Arc::new(AgentInbox::new(time_provider)),
        config.agent_secret.clone(),
    )
    .with_public_url(config.public_url.clone());

    // 5. Serve until Ctrl+C
    let server_config = ApiServerConfig {
        host: config.host.clone(),
        port: config.port,
    };
    ApiServer::new(server_config, state)
        .run(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutdown complete.");

    Ok(())
}
