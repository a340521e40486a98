// Job Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Job ID (UUID v4)
pub type JobId = String;

/// Job status
///
/// Legal transitions: `Pending -> Running -> Done | Error`. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Done,
        JobStatus::Error,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Whether `next` is the legal successor of `self`
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Done)
                | (JobStatus::Running, JobStatus::Error)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Job status record as exposed to pollers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: String,
    /// Tool output for diagnosis. Credential-redacted before it gets here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: i64, // epoch ms
    pub updated_at: i64, // epoch ms
}

impl JobRecord {
    pub const PENDING_MESSAGE: &'static str = "Deployment queued";

    /// Create a new pending record
    ///
    /// # Arguments
    ///
    /// * `job_id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(job_id: impl Into<JobId>, created_at: i64) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            message: Self::PENDING_MESSAGE.to_string(),
            details: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Apply a status transition, rejecting anything that is not the legal successor
    pub fn transition(
        &mut self,
        next: JobStatus,
        message: impl Into<String>,
        details: Option<String>,
        now_millis: i64,
    ) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.message = message.into();
        self.details = details;
        self.updated_at = now_millis;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let record = JobRecord::new("job-1", 1000);
        assert_eq!(record.status, JobStatus::Pending);
        assert_eq!(record.created_at, 1000);
        assert_eq!(record.updated_at, 1000);
        assert!(record.details.is_none());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut record = JobRecord::new("job-1", 1000);
        record
            .transition(JobStatus::Running, "Running", None, 2000)
            .unwrap();
        record
            .transition(JobStatus::Done, "Apply complete!", None, 3000)
            .unwrap();

        assert_eq!(record.status, JobStatus::Done);
        assert_eq!(record.message, "Apply complete!");
        assert_eq!(record.updated_at, 3000);
        assert!(record.is_terminal());
    }

    #[test]
    fn test_cannot_skip_running() {
        let mut record = JobRecord::new("job-1", 1000);
        let err = record
            .transition(JobStatus::Done, "done", None, 2000)
            .unwrap_err();

        assert!(err.to_string().contains("pending -> done"));
        assert_eq!(record.status, JobStatus::Pending);
        assert_eq!(record.updated_at, 1000);
    }

    #[test]
    fn test_terminal_record_is_frozen() {
        let mut record = JobRecord::new("job-1", 1000);
        record.transition(JobStatus::Running, "", None, 2000).unwrap();
        record
            .transition(JobStatus::Error, "Terraform init failed", Some("x".into()), 3000)
            .unwrap();

        for next in JobStatus::ALL {
            assert!(record.transition(next, "again", None, 4000).is_err());
        }
        assert_eq!(record.message, "Terraform init failed");
        assert_eq!(record.details.as_deref(), Some("x"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let record = JobRecord::new("job-1", 1000);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["job_id"], "job-1");
        assert!(json.get("details").is_none());
    }
}
