// Deploy Service - submission use case (job scheduler)

pub mod submit;

pub use submit::DeployRequest;

use crate::application::worker::{JobTicket, Worker};
use crate::domain::{Credential, JobId, JobRecord, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{
    IdProvider, JobStore, QuotaDecision, QuotaFailurePolicy, QuotaGuard, TimeProvider,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Job counts per status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub pending: usize,
    pub running: usize,
    pub done: usize,
    pub error: usize,
}

/// Accepts deploy requests and hands them to the worker.
///
/// Validation and the quota check run on the caller's task; provisioning never does.
pub struct DeployService {
    job_store: Arc<dyn JobStore>,
    quota_guard: Arc<dyn QuotaGuard>,
    worker: Worker,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    quota_policy: QuotaFailurePolicy,
    default_credential: Option<Credential>,
}

impl DeployService {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        quota_guard: Arc<dyn QuotaGuard>,
        worker: Worker,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            job_store,
            quota_guard,
            worker,
            id_provider,
            time_provider,
            quota_policy: QuotaFailurePolicy::default(),
            default_credential: None,
        }
    }

    pub fn with_quota_policy(mut self, policy: QuotaFailurePolicy) -> Self {
        self.quota_policy = policy;
        self
    }

    /// Token used when a request carries none
    pub fn with_default_credential(mut self, credential: Option<Credential>) -> Self {
        self.default_credential = credential;
        self
    }

    pub fn has_default_credential(&self) -> bool {
        self.default_credential.is_some()
    }

    /// Validate, gate on quota, record `pending` and detach the worker.
    ///
    /// Returns as soon as the job exists; the id is immediately resolvable.
    ///
    /// # Errors
    /// - AppError::Validation for blank code or missing token (no job created)
    /// - AppError::QuotaExceeded if the provider limit is reached (no job created)
    /// - AppError::QuotaUnavailable if the check fails under `FailClosed`
    pub async fn submit(&self, req: DeployRequest) -> Result<JobId> {
        let (source, credential) =
            submit::validate_request(req, self.default_credential.as_ref())?;

        self.check_quota(&credential).await?;

        let job_id = self.id_provider.generate_id();
        let record = JobRecord::new(job_id.clone(), self.time_provider.now_millis());
        self.job_store.create(record).await?;

        info!(job_id = %job_id, "Deployment accepted");

        self.worker.spawn(JobTicket {
            job_id: job_id.clone(),
            source,
            credential,
        });

        Ok(job_id)
    }

    /// Current record for a job
    pub async fn status(&self, job_id: &JobId) -> Result<JobRecord> {
        self.job_store.get(job_id).await
    }

    pub async fn job_counts(&self) -> Result<JobCounts> {
        Ok(JobCounts {
            pending: self.job_store.count_by_status(JobStatus::Pending).await?,
            running: self.job_store.count_by_status(JobStatus::Running).await?,
            done: self.job_store.count_by_status(JobStatus::Done).await?,
            error: self.job_store.count_by_status(JobStatus::Error).await?,
        })
    }

    async fn check_quota(&self, credential: &Credential) -> Result<()> {
        match self.quota_guard.check(credential).await {
            Ok(QuotaDecision::Approved { usage, limit }) => {
                info!(usage = %usage, limit = %limit, "Quota check passed");
                Ok(())
            }
            Ok(QuotaDecision::Rejected {
                usage,
                limit,
                reason,
            }) => {
                warn!(usage = %usage, limit = %limit, "Quota check rejected deployment");
                Err(AppError::QuotaExceeded(reason))
            }
            Err(e) => match self.quota_policy {
                QuotaFailurePolicy::FailOpen => {
                    warn!(error = %e, "Quota check failed, proceeding (fail-open)");
                    Ok(())
                }
                QuotaFailurePolicy::FailClosed => {
                    warn!(error = %e, "Quota check failed, refusing deployment (fail-closed)");
                    Err(AppError::QuotaUnavailable(e.to_string()))
                }
            },
        }
    }
}
