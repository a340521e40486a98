// Provisioner Port
// Abstraction over the external provisioning tool (init + apply)

use crate::domain::ExecutionEnv;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub const INIT_FAILED: &str = "Terraform init failed";
pub const APPLY_FAILED: &str = "Terraform apply failed";
pub const APPLY_COMPLETE_FALLBACK: &str = "Terraform apply complete";

/// Line prefix the tool prints after a successful apply
pub const COMPLETION_MARKER: &str = "Apply complete!";

/// Structured result of a provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Applied { message: String },
    Failed { error: String, details: Option<String> },
}

/// Faults that prevented the tool from running at all
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Provisioner trait
///
/// Implementations:
/// - TerraformExecutor: runs the terraform binary as a subprocess
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Run init then apply inside `workdir`
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the tool cannot be started
    /// - ExecutionError::IoError if its output cannot be collected
    async fn run(
        &self,
        workdir: &Path,
        env: &ExecutionEnv,
    ) -> Result<ProvisionOutcome, ExecutionError>;
}

/// Surface the tool's completion line, or a generic message if it printed none
pub fn completion_message(stdout: &str) -> String {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| line.contains(COMPLETION_MARKER))
        .map(str::to_string)
        .unwrap_or_else(|| APPLY_COMPLETE_FALLBACK.to_string())
}

/// Diagnostic text for a failed step: stderr, falling back to stdout
pub fn failure_details(stdout: &str, stderr: &str) -> Option<String> {
    [stderr, stdout]
        .into_iter()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Mock provisioner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Init and apply succeed, apply prints this stdout
        Apply(String),
        /// Init exits non-zero with this stderr
        InitFails(String),
        /// Apply exits non-zero with this stderr
        ApplyFails(String),
        /// Tool cannot be spawned
        SpawnFails(String),
        /// Panic inside the worker (for panic isolation testing)
        Panic(String),
    }

    /// Steps the mock pretended to run
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockStep {
        Init,
        Apply,
    }

    pub struct MockProvisioner {
        behavior: MockBehavior,
        gate: Option<Arc<Notify>>,
        steps: Mutex<Vec<MockStep>>,
        envs: Mutex<Vec<ExecutionEnv>>,
        workdirs: Mutex<Vec<PathBuf>>,
    }

    impl MockProvisioner {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                gate: None,
                steps: Mutex::new(Vec::new()),
                envs: Mutex::new(Vec::new()),
                workdirs: Mutex::new(Vec::new()),
            }
        }

        pub fn new_success(stdout: impl Into<String>) -> Self {
            Self::new(MockBehavior::Apply(stdout.into()))
        }

        pub fn new_init_failure(stderr: impl Into<String>) -> Self {
            Self::new(MockBehavior::InitFails(stderr.into()))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        /// Block every run until the returned handle is notified
        pub fn gated(behavior: MockBehavior) -> (Self, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let mut mock = Self::new(behavior);
            mock.gate = Some(Arc::clone(&gate));
            (mock, gate)
        }

        pub fn steps(&self) -> Vec<MockStep> {
            self.steps.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.workdirs.lock().unwrap().len()
        }

        /// Environments received, one per run
        pub fn envs(&self) -> Vec<ExecutionEnv> {
            self.envs.lock().unwrap().clone()
        }

        pub fn workdirs(&self) -> Vec<PathBuf> {
            self.workdirs.lock().unwrap().clone()
        }

        fn record(&self, step: MockStep) {
            self.steps.lock().unwrap().push(step);
        }
    }

    #[async_trait]
    impl Provisioner for MockProvisioner {
        async fn run(
            &self,
            workdir: &Path,
            env: &ExecutionEnv,
        ) -> Result<ProvisionOutcome, ExecutionError> {
            self.workdirs.lock().unwrap().push(workdir.to_path_buf());
            self.envs.lock().unwrap().push(env.clone());

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            match &self.behavior {
                MockBehavior::SpawnFails(msg) => Err(ExecutionError::SpawnFailed(msg.clone())),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::InitFails(stderr) => {
                    self.record(MockStep::Init);
                    Ok(ProvisionOutcome::Failed {
                        error: INIT_FAILED.to_string(),
                        details: failure_details("", stderr),
                    })
                }
                MockBehavior::ApplyFails(stderr) => {
                    self.record(MockStep::Init);
                    self.record(MockStep::Apply);
                    Ok(ProvisionOutcome::Failed {
                        error: APPLY_FAILED.to_string(),
                        details: failure_details("", stderr),
                    })
                }
                MockBehavior::Apply(stdout) => {
                    self.record(MockStep::Init);
                    self.record(MockStep::Apply);
                    Ok(ProvisionOutcome::Applied {
                        message: completion_message(stdout),
                    })
                }
            }
        }
    }
}
