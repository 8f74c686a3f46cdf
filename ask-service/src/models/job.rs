//! Background generation job and its lifecycle.

use super::Generation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Where a job is in its lifecycle.
///
/// A result or an error only exists once the job has left `Pending`, and
/// never both. Serialized flat into the job record under `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Done {
        result: Generation,
        #[serde(rename = "finishedAt")]
        finished_at: DateTime<Utc>,
    },
    Failed {
        error: String,
        #[serde(rename = "finishedAt")]
        finished_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: JobState,
}

impl Job {
    /// Create a new pending job with a fresh identifier.
    pub fn pending(prompt: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt,
            created_at: Utc::now(),
            state: JobState::Pending,
        }
    }

    pub fn status(&self) -> JobStatus {
        match self.state {
            JobState::Pending => JobStatus::Pending,
            JobState::Done { .. } => JobStatus::Done,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }

    /// Move to `done`. A job that already finished is returned unchanged.
    pub fn complete(self, result: Generation) -> Self {
        self.finish(JobState::Done {
            result,
            finished_at: Utc::now(),
        })
    }

    /// Move to `failed`. A job that already finished is returned unchanged.
    pub fn fail(self, error: impl Into<String>) -> Self {
        self.finish(JobState::Failed {
            error: error.into(),
            finished_at: Utc::now(),
        })
    }

    fn finish(mut self, terminal: JobState) -> Self {
        if self.status().is_terminal() {
            tracing::warn!(
                job_id = %self.id,
                status = self.status().as_str(),
                "Ignoring second terminal transition"
            );
            return self;
        }
        self.state = terminal;
        self
    }

    pub fn result(&self) -> Option<&Generation> {
        match &self.state {
            JobState::Done { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            JobState::Pending => None,
            JobState::Done { finished_at, .. } | JobState::Failed { finished_at, .. } => {
                Some(*finished_at)
            }
        }
    }
}
