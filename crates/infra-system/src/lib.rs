// tfdeploy Infrastructure - System Adapters
// Implements: WorkspaceManager (filesystem), Provisioner (terraform subprocess)

pub mod terraform_executor;
pub mod workspace;

pub use terraform_executor::TerraformExecutor;
pub use workspace::TempWorkspaceManager;
