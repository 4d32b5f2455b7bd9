//! Per-request merge job record and state management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One upload-convert-merge request, tracked for logging and telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeJob {
    pub job_id: String,
    pub file_count: usize,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_pages: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Received,
    Converting,
    Merging,
    Complete,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Received => write!(f, "received"),
            JobStatus::Converting => write!(f, "converting"),
            JobStatus::Merging => write!(f, "merging"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl MergeJob {
    pub fn new(file_count: usize) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4().to_string(),
            file_count,
            status: JobStatus::Received,
            created_at: now,
            updated_at: now,
            total_pages: None,
            error: None,
        }
    }

    pub fn start_converting(&mut self) {
        self.status = JobStatus::Converting;
        self.updated_at = Utc::now();
    }

    pub fn start_merging(&mut self) {
        self.status = JobStatus::Merging;
        self.updated_at = Utc::now();
    }

    pub fn mark_complete(&mut self, total_pages: usize) {
        self.status = JobStatus::Complete;
        self.updated_at = Utc::now();
        self.total_pages = Some(total_pages);
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.updated_at = Utc::now();
        self.error = Some(error);
    }

    pub fn processing_duration_ms(&self) -> Option<i64> {
        if self.status == JobStatus::Complete || self.status == JobStatus::Failed {
            Some(
                self.updated_at
                    .signed_duration_since(self.created_at)
                    .num_milliseconds(),
            )
        } else {
            None
        }
    }
}
