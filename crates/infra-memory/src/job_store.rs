// In-Memory JobStore Implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tfdeploy_core::domain::{JobId, JobRecord, JobStatus};
use tfdeploy_core::error::{AppError, Result};
use tfdeploy_core::port::{JobStore, TimeProvider};
use tracing::debug;

fn poisoned<T>(_: PoisonError<T>) -> AppError {
    AppError::Internal("job store lock poisoned".to_string())
}

fn not_found(job_id: &JobId) -> AppError {
    AppError::NotFound(format!("job {}", job_id))
}

/// Lock-guarded map of job records.
///
/// Every operation holds the lock for one lookup or one record swap and never
/// across an `.await`, so pollers and workers only contend for that long.
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl MemoryJobStore {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            time_provider,
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.jobs.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, record: JobRecord) -> Result<()> {
        let mut jobs = self.jobs.write().map_err(poisoned)?;
        if jobs.contains_key(&record.job_id) {
            return Err(AppError::Conflict(format!(
                "job {} already exists",
                record.job_id
            )));
        }
        debug!(job_id = %record.job_id, "Job record created");
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
        let now = self.time_provider.now_millis();
        let mut jobs = self.jobs.write().map_err(poisoned)?;
        let record = jobs.get_mut(job_id).ok_or_else(|| not_found(job_id))?;

        // Transition on a copy so a rejected transition leaves the stored record untouched
        let mut next = record.clone();
        next.transition(status, message, details, now)?;
        *record = next.clone();

        debug!(job_id = %job_id, status = %status, "Job status updated");
        Ok(next)
    }

    async fn get(&self, job_id: &JobId) -> Result<JobRecord> {
        self.jobs
            .read()
            .map_err(poisoned)?
            .get(job_id)
            .cloned()
            .ok_or_else(|| not_found(job_id))
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<usize> {
        Ok(self
            .jobs
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|r| r.status == status)
            .count())
    }
}
