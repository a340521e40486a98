// Job Store Port (Interface)

use crate::domain::{JobId, JobRecord, JobStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Status store shared by the submission path, the per-job workers and pollers.
///
/// Implementations must be safe for concurrent use; each call is one atomic
/// read or record swap.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new record. Fails with `AppError::Conflict` if the id exists.
    async fn create(&self, record: JobRecord) -> Result<()>;

    /// Transition a job, returning the updated record.
    ///
    /// # Errors
    /// - `AppError::NotFound` for an unknown id
    /// - `AppError::Domain` for an illegal transition (record left untouched)
    async fn set_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        message: String,
        details: Option<String>,
    ) -> Result<JobRecord>;

    /// Fetch a snapshot of a job. Unknown ids yield `AppError::NotFound`.
    async fn get(&self, job_id: &JobId) -> Result<JobRecord>;

    /// Count jobs by status
    async fn count_by_status(&self, status: JobStatus) -> Result<usize>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store that also keeps every status a job passed through
    #[derive(Default)]
    pub struct RecordingJobStore {
        jobs: Mutex<HashMap<JobId, JobRecord>>,
        history: Mutex<HashMap<JobId, Vec<JobStatus>>>,
        clock: Mutex<i64>,
    }

    impl RecordingJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Status sequence observed for a job, in order
        pub fn history(&self, job_id: &JobId) -> Vec<JobStatus> {
            self.history
                .lock()
                .unwrap()
                .get(job_id)
                .cloned()
                .unwrap_or_default()
        }

        pub fn len(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Every record currently held
        pub fn snapshot(&self) -> Vec<JobRecord> {
            self.jobs.lock().unwrap().values().cloned().collect()
        }

        fn tick(&self) -> i64 {
            let mut clock = self.clock.lock().unwrap();
            *clock += 1;
            *clock
        }
    }

    #[async_trait]
    impl JobStore for RecordingJobStore {
        async fn create(&self, record: JobRecord) -> Result<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if jobs.contains_key(&record.job_id) {
                return Err(AppError::Conflict(format!("job {} exists", record.job_id)));
            }
            self.history
                .lock()
                .unwrap()
                .insert(record.job_id.clone(), vec![record.status]);
            jobs.insert(record.job_id.clone(), record);
            Ok(())
        }

        async fn set_status(
            &self,
            job_id: &JobId,
            status: JobStatus,
            message: String,
            details: Option<String>,
        ) -> Result<JobRecord> {
            let now = self.tick();
            let mut jobs = self.jobs.lock().unwrap();
            let record = jobs
                .get_mut(job_id)
                .ok_or_else(|| AppError::NotFound(format!("job {}", job_id)))?;
            record.transition(status, message, details, now)?;
            self.history
                .lock()
                .unwrap()
                .entry(job_id.clone())
                .or_default()
                .push(status);
            Ok(record.clone())
        }

        async fn get(&self, job_id: &JobId) -> Result<JobRecord> {
            self.jobs
                .lock()
                .unwrap()
                .get(job_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("job {}", job_id)))
        }

        async fn count_by_status(&self, status: JobStatus) -> Result<usize> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.status == status)
                .count())
        }
    }
}
