// Workspace Port
// One scratch directory per job, released on every exit path

use crate::domain::{IacSource, JobId};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Handle to a prepared workspace.
///
/// Implementations must also release the directory on drop, so a panicking
/// worker cannot leak it.
pub trait Workspace: Send + Sync {
    fn path(&self) -> &Path;

    /// Remove the directory. Errors are logged and swallowed.
    ///
    /// Blocking filesystem work: async callers run it on the blocking pool.
    fn teardown(self: Box<Self>);
}

#[async_trait]
pub trait WorkspaceManager: Send + Sync {
    /// Create a fresh directory for `job_id` holding `source`
    async fn prepare(&self, job_id: &JobId, source: &IacSource) -> Result<Box<dyn Workspace>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        prepared: AtomicUsize,
        released: AtomicUsize,
    }

    /// Workspace manager that touches no filesystem and counts releases
    #[derive(Default)]
    pub struct MockWorkspaceManager {
        counters: Arc<Counters>,
        fail_prepare: bool,
    }

    impl MockWorkspaceManager {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every `prepare` fails with an IO error
        pub fn failing() -> Self {
            Self {
                fail_prepare: true,
                ..Self::default()
            }
        }

        pub fn prepared(&self) -> usize {
            self.counters.prepared.load(Ordering::SeqCst)
        }

        pub fn released(&self) -> usize {
            self.counters.released.load(Ordering::SeqCst)
        }

        /// Workspaces prepared but not yet released
        pub fn live(&self) -> usize {
            self.prepared() - self.released()
        }
    }

    struct MockWorkspace {
        path: PathBuf,
        counters: Arc<Counters>,
    }

    impl Workspace for MockWorkspace {
        fn path(&self) -> &Path {
            &self.path
        }

        fn teardown(self: Box<Self>) {
            // release happens in Drop
        }
    }

    impl Drop for MockWorkspace {
        fn drop(&mut self) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl WorkspaceManager for MockWorkspaceManager {
        async fn prepare(
            &self,
            job_id: &JobId,
            _source: &IacSource,
        ) -> Result<Box<dyn Workspace>> {
            if self.fail_prepare {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "workspace root is read-only",
                )));
            }
            self.counters.prepared.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockWorkspace {
                path: PathBuf::from(format!("/mock/tfdeploy-{}", job_id)),
                counters: Arc::clone(&self.counters),
            }))
        }
    }
}
