// Worker - per-job provisioning task

pub mod constants;
mod panic_guard;

use constants::*;
pub use panic_guard::panic_message;

use crate::application::credential::build_env;
use crate::domain::{Credential, IacSource, JobId, JobStatus};
use crate::error::Result;
use crate::port::{JobStore, ProvisionOutcome, Provisioner, WorkspaceManager};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Everything one job needs, moved into its task
pub struct JobTicket {
    pub job_id: JobId,
    pub source: IacSource,
    pub credential: Credential,
}

/// Runs accepted jobs: one spawned task per job, each owning its terminal write
#[derive(Clone)]
pub struct Worker {
    job_store: Arc<dyn JobStore>,
    workspaces: Arc<dyn WorkspaceManager>,
    provisioner: Arc<dyn Provisioner>,
    base_env: Arc<HashMap<String, String>>,
}

impl Worker {
    /// Create a new worker
    ///
    /// # Arguments
    /// * `job_store` - Status store the worker reports into
    /// * `workspaces` - Per-job scratch directory factory
    /// * `provisioner` - Tool runner (init + apply)
    /// * `base_env` - Process environment snapshot jobs derive from
    pub fn new(
        job_store: Arc<dyn JobStore>,
        workspaces: Arc<dyn WorkspaceManager>,
        provisioner: Arc<dyn Provisioner>,
        base_env: HashMap<String, String>,
    ) -> Self {
        Self {
            job_store,
            workspaces,
            provisioner,
            base_env: Arc::new(base_env),
        }
    }

    /// Detach a task for `ticket`. The handle is only useful to tests; callers may drop it.
    pub fn spawn(&self, ticket: JobTicket) -> JoinHandle<()> {
        let worker = self.clone();
        tokio::spawn(async move { worker.run(ticket).await })
    }

    /// Drive one job from `pending` to a terminal state
    pub async fn run(&self, ticket: JobTicket) {
        let job_id = ticket.job_id.clone();
        let credential = ticket.credential.clone();

        if let Err(e) = self
            .job_store
            .set_status(&job_id, JobStatus::Running, RUNNING_MESSAGE.to_string(), None)
            .await
        {
            error!(job_id = %job_id, error = %e, "Failed to mark job running, abandoning it");
            return;
        }
        info!(job_id = %job_id, "Job running");

        // Execute in a nested task so a panic surfaces as a JoinError instead of
        // killing this one, which still has to write the terminal state.
        let worker = self.clone();
        let handle = tokio::task::spawn(async move { worker.execute(ticket).await });

        let (status, message, details) = match handle.await {
            Ok(Ok(ProvisionOutcome::Applied { message })) => (JobStatus::Done, message, None),
            Ok(Ok(ProvisionOutcome::Failed { error, details })) => {
                warn!(job_id = %job_id, error = %error, "Provisioning failed");
                (
                    JobStatus::Error,
                    credential.redact(&error),
                    details.map(|d| credential.redact(&d)),
                )
            }
            Ok(Err(e)) => {
                let detail = credential.redact(&e.to_string());
                error!(job_id = %job_id, error = %detail, "Worker fault");
                (
                    JobStatus::Error,
                    UNHANDLED_WORKER_ERROR.to_string(),
                    Some(detail),
                )
            }
            Err(join_err) => {
                let detail = if join_err.is_panic() {
                    credential.redact(&panic_message(join_err.into_panic()))
                } else {
                    WORKER_CANCELLED.to_string()
                };
                error!(job_id = %job_id, "Worker task did not complete");
                (
                    JobStatus::Error,
                    UNHANDLED_WORKER_ERROR.to_string(),
                    Some(detail),
                )
            }
        };

        // The completion line of a successful apply is stored as the tool printed it
        match self
            .job_store
            .set_status(&job_id, status, message, details)
            .await
        {
            Ok(record) => info!(job_id = %job_id, status = %record.status, message = %record.message, "Job finished"),
            Err(e) => error!(job_id = %job_id, error = %e, "Failed to record terminal state"),
        }
    }

    /// Workspace, environment, tool run, teardown.
    ///
    /// The workspace is torn down explicitly on the normal paths; on unwind its
    /// `Drop` releases it.
    async fn execute(&self, ticket: JobTicket) -> Result<ProvisionOutcome> {
        let JobTicket {
            job_id,
            source,
            credential,
        } = ticket;

        let workspace = self.workspaces.prepare(&job_id, &source).await?;
        debug!(job_id = %job_id, path = %workspace.path().display(), "Workspace prepared");

        let env = build_env(&self.base_env, &credential);
        let result = self.provisioner.run(workspace.path(), &env).await;

        // Removing `.terraform/` is blocking filesystem work
        match tokio::task::spawn_blocking(move || workspace.teardown()).await {
            Ok(()) => debug!(job_id = %job_id, "Workspace released"),
            Err(e) => warn!(job_id = %job_id, error = %e, "Workspace teardown did not complete"),
        }

        Ok(result?)
    }
}
