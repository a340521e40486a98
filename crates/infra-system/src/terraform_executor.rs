// Terraform executor implementation
// reason: tokio::process for non-blocking subprocess management
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{info, warn};

use tfdeploy_core::domain::ExecutionEnv;
use tfdeploy_core::port::provisioner::{
    completion_message, failure_details, ExecutionError, ProvisionOutcome, Provisioner,
    APPLY_FAILED, INIT_FAILED,
};
use tfdeploy_core::port::TimeProvider;

pub const DEFAULT_BINARY: &str = "terraform";

const INIT_ARGS: [&str; 3] = ["init", "-input=false", "-no-color"];
const APPLY_ARGS: [&str; 4] = ["apply", "-auto-approve", "-input=false", "-no-color"];

/// Runs `terraform init` then `terraform apply` as child processes.
///
/// The child sees exactly the job's `ExecutionEnv`; nothing is inherited from
/// the daemon's own environment.
pub struct TerraformExecutor {
    binary: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
}

impl TerraformExecutor {
    /// Create a new executor
    ///
    /// # Arguments
    /// * `binary` - Tool to invoke, resolved through the job's `PATH` when not absolute
    /// * `time_provider` - Time provider for duration tracking
    pub fn new(binary: impl Into<PathBuf>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            binary: binary.into(),
            time_provider,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Spawn one step and wait for it to exit
    async fn spawn_and_wait(
        &self,
        args: &[&str],
        workdir: &Path,
        env: &ExecutionEnv,
    ) -> Result<Output, ExecutionError> {
        let start_time = self.time_provider.now_millis();
        let step = args.first().copied().unwrap_or_default();

        info!(
            binary = %self.binary.display(),
            step = %step,
            workdir = %workdir.display(),
            "Starting terraform step"
        );

        let child = Command::new(&self.binary)
            .args(args)
            .env_clear()
            .envs(env.iter())
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ExecutionError::SpawnFailed(format!("{}: {}", self.binary.display(), e))
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecutionError::IoError(e.to_string()))?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        info!(
            step = %step,
            duration_ms = %duration_ms,
            exit_code = ?output.status.code(),
            "Terraform step completed"
        );

        Ok(output)
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[async_trait]
impl Provisioner for TerraformExecutor {
    async fn run(
        &self,
        workdir: &Path,
        env: &ExecutionEnv,
    ) -> Result<ProvisionOutcome, ExecutionError> {
        let init = self.spawn_and_wait(&INIT_ARGS, workdir, env).await?;
        if !init.status.success() {
            warn!(exit_code = ?init.status.code(), "Terraform init failed, skipping apply");
            return Ok(ProvisionOutcome::Failed {
                error: INIT_FAILED.to_string(),
                details: failure_details(&lossy(&init.stdout), &lossy(&init.stderr)),
            });
        }

        let apply = self.spawn_and_wait(&APPLY_ARGS, workdir, env).await?;
        let stdout = lossy(&apply.stdout);
        if !apply.status.success() {
            warn!(exit_code = ?apply.status.code(), "Terraform apply failed");
            return Ok(ProvisionOutcome::Failed {
                error: APPLY_FAILED.to_string(),
                details: failure_details(&stdout, &lossy(&apply.stderr)),
            });
        }

        Ok(ProvisionOutcome::Applied {
            message: completion_message(&stdout),
        })
    }
}
