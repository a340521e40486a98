// Workspace manager implementation
// reason: tempfile gives unique names and removal on drop

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

use tfdeploy_core::domain::{IacSource, JobId};
use tfdeploy_core::error::Result;
use tfdeploy_core::port::{Workspace, WorkspaceManager};

/// File the caller's source is written to
pub const MAIN_FILE: &str = "main.tf";

/// File synthesized when the source declares no provider
pub const PROVIDER_FILE: &str = "provider.tf";

/// Substring that counts as "source already configures the provider"
pub const PROVIDER_MARKER: &str = "provider \"digitalocean\"";

/// Substring that counts as "source already pins its providers"
pub const REQUIRED_PROVIDERS_MARKER: &str = "required_providers";

/// Provider requirement, left out when the source pins its own
const REQUIRED_PROVIDERS_BLOCK: &str = r#"terraform {
  required_providers {
    digitalocean = {
      source  = "digitalocean/digitalocean"
      version = "~> 2.0"
    }
  }
}
"#;

/// Empty provider block; the token reaches it through the environment
const PROVIDER_BLOCK: &str = "provider \"digitalocean\" {}\n";

/// `provider.tf` contents for `source`, or `None` when it configures the provider itself.
///
/// Terraform refuses a module with two `required_providers` blocks, so the
/// requirement is only added when the source has none.
fn synthesized_provider(source: &IacSource) -> Option<String> {
    if source.contains(PROVIDER_MARKER) {
        return None;
    }
    if source.contains(REQUIRED_PROVIDERS_MARKER) {
        Some(PROVIDER_BLOCK.to_string())
    } else {
        Some(format!("{}\n{}", REQUIRED_PROVIDERS_BLOCK, PROVIDER_BLOCK))
    }
}

/// Creates one uniquely named directory per job under `root`
pub struct TempWorkspaceManager {
    root: PathBuf,
}

impl TempWorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

struct TempWorkspace {
    dir: TempDir,
}

impl Workspace for TempWorkspace {
    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn teardown(self: Box<Self>) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "Workspace removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Workspace cleanup failed"),
        }
    }
}

#[async_trait]
impl WorkspaceManager for TempWorkspaceManager {
    async fn prepare(&self, job_id: &JobId, source: &IacSource) -> Result<Box<dyn Workspace>> {
        tokio::fs::create_dir_all(&self.root).await?;

        // Dropping `dir` on any early return below removes the half-built workspace
        let dir = tempfile::Builder::new()
            .prefix(&format!("tfdeploy-{}-", job_id))
            .tempdir_in(&self.root)?;

        tokio::fs::write(dir.path().join(MAIN_FILE), source.as_str()).await?;

        if let Some(provider) = synthesized_provider(source) {
            tokio::fs::write(dir.path().join(PROVIDER_FILE), provider).await?;
            debug!(job_id = %job_id, "Synthesized provider configuration");
        }

        debug!(job_id = %job_id, path = %dir.path().display(), "Workspace created");
        Ok(Box::new(TempWorkspace { dir }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> IacSource {
        IacSource::parse(text).unwrap()
    }

    #[tokio::test]
    async fn test_prepare_writes_source_verbatim() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(root.path());
        let code = "resource \"digitalocean_droplet\" \"web\" {\n  name = \"web-1\"\n}\n";

        let ws = manager.prepare(&"job-1".to_string(), &source(code)).await.unwrap();

        let written = std::fs::read_to_string(ws.path().join(MAIN_FILE)).unwrap();
        assert_eq!(written, code);
        assert!(ws.path().starts_with(root.path()));
        assert!(ws
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("tfdeploy-job-1-"));
        ws.teardown();
    }

    #[tokio::test]
    async fn test_provider_synthesized_when_missing() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(root.path());

        let ws = manager
            .prepare(&"job-1".to_string(), &source("resource \"x\" {}"))
            .await
            .unwrap();

        let provider = std::fs::read_to_string(ws.path().join(PROVIDER_FILE)).unwrap();
        assert!(provider.contains(PROVIDER_MARKER));
        assert!(provider.contains("digitalocean/digitalocean"));
        ws.teardown();
    }

    #[tokio::test]
    async fn test_provider_not_synthesized_when_declared() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(root.path());
        let code = "provider \"digitalocean\" {\n  token = var.do_token\n}\n";

        let ws = manager.prepare(&"job-1".to_string(), &source(code)).await.unwrap();

        assert!(!ws.path().join(PROVIDER_FILE).exists());
        ws.teardown();
    }

    #[tokio::test]
    async fn test_required_providers_not_duplicated() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(root.path());
        let code = r#"terraform {
  required_providers {
    digitalocean = {
      source = "digitalocean/digitalocean"
    }
  }
}

resource "digitalocean_droplet" "web" {}
"#;

        let ws = manager.prepare(&"job-1".to_string(), &source(code)).await.unwrap();

        let provider = std::fs::read_to_string(ws.path().join(PROVIDER_FILE)).unwrap();
        assert!(provider.contains(PROVIDER_MARKER));
        assert!(!provider.contains(REQUIRED_PROVIDERS_MARKER));
        ws.teardown();
    }

    #[test]
    fn test_synthesized_provider_variants() {
        let full = synthesized_provider(&source("resource \"x\" {}")).unwrap();
        assert!(full.contains(REQUIRED_PROVIDERS_MARKER));
        assert!(full.ends_with(PROVIDER_BLOCK));

        let bare = synthesized_provider(&source("terraform {\n  required_providers {}\n}\n")).unwrap();
        assert_eq!(bare, PROVIDER_BLOCK);

        assert!(synthesized_provider(&source("provider \"digitalocean\" {}")).is_none());
    }

    #[tokio::test]
    async fn test_teardown_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(root.path());

        let ws = manager
            .prepare(&"job-1".to_string(), &source("resource \"x\" {}"))
            .await
            .unwrap();
        let path = ws.path().to_path_buf();
        std::fs::create_dir(path.join(".terraform")).unwrap();
        std::fs::write(path.join(".terraform/lock"), "x").unwrap();

        ws.teardown();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(root.path());

        let ws = manager
            .prepare(&"job-1".to_string(), &source("resource \"x\" {}"))
            .await
            .unwrap();
        let path = ws.path().to_path_buf();

        drop(ws);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_teardown_tolerates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(root.path());

        let ws = manager
            .prepare(&"job-1".to_string(), &source("resource \"x\" {}"))
            .await
            .unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();

        ws.teardown(); // must not panic
    }

    #[tokio::test]
    async fn test_jobs_never_share_a_workspace() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(root.path());
        let src = source("resource \"x\" {}");

        let a = manager.prepare(&"same".to_string(), &src).await.unwrap();
        let b = manager.prepare(&"same".to_string(), &src).await.unwrap();

        assert_ne!(a.path(), b.path());
        a.teardown();
        b.teardown();
    }

    #[tokio::test]
    async fn test_missing_root_is_created() {
        let parent = tempfile::tempdir().unwrap();
        let manager = TempWorkspaceManager::new(parent.path().join("nested/root"));

        let ws = manager
            .prepare(&"job-1".to_string(), &source("resource \"x\" {}"))
            .await
            .unwrap();

        assert!(manager.root().is_dir());
        ws.teardown();
    }
}
