//! Remote transcription jobs: creation, status polling and deletion.
//!
//! The provider owns the job. Locally we only ever hold its id and the most
//! recent status payload.

pub mod poll;
pub mod retention;
pub mod submit;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::{first_present, first_string};

pub const CREATE_ROUTE: [&str; 1] = ["speech-to-text"];
pub const TRANSCRIPTS_ROUTE: [&str; 2] = ["speech-to-text", "transcripts"];

/// Fields that may carry the job id in a creation response, most preferred
/// first.
pub const JOB_ID_FIELDS: &[&str] = &["transcription_id", "id", "result.transcription_id"];
/// Top-level id fields of a status payload. A nested `result.transcription_id`
/// there is not trusted to name the job being deleted.
const TERMINAL_ID_FIELDS: &[&str] = &["transcription_id", "id"];
const STATUS_FIELDS: &[&str] = &["status", "state"];

/// Path segments of one stored transcript. The id is kept as a single
/// segment and encoded when the URL is built.
pub fn transcript_path(job_id: &str) -> Vec<String> {
    TRANSCRIPTS_ROUTE
        .iter()
        .map(|segment| segment.to_string())
        .chain(std::iter::once(job_id.to_string()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    /// `completed` and `failed` are terminal; any other value, or no status
    /// at all, means the job is still running.
    pub fn from_payload(payload: &Value) -> Self {
        match first_present(payload, STATUS_FIELDS).and_then(Value::as_str) {
            Some("completed") => Self::Completed,
            Some("failed") => Self::Failed,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Last observed snapshot of a remote job.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Id reported in the payload, or the one we asked about.
    pub id: String,
    pub status: JobStatus,
    pub payload: Value,
}

impl Job {
    pub fn from_payload(requested_id: &str, payload: Value) -> Self {
        Self {
            id: first_string(&payload, TERMINAL_ID_FIELDS)
                .unwrap_or_else(|| requested_id.to_string()),
            status: JobStatus::from_payload(&payload),
            payload,
        }
    }

    /// The transcript payload, once the job has completed.
    pub fn result(&self) -> Option<&Value> {
        (self.status == JobStatus::Completed).then_some(&self.payload)
    }

    /// Provider-supplied explanation for a failed job: every `errors[].message`
    /// joined, else `error.message`, else the raw payload.
    pub fn failure_reason(&self) -> Option<String> {
        if self.status != JobStatus::Failed {
            return None;
        }

        let listed: Vec<&str> = self
            .payload
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|item| item.get("message").and_then(Value::as_str))
                    .filter(|msg| !msg.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if !listed.is_empty() {
            return Some(listed.join(", "));
        }

        Some(
            first_string(&self.payload, &["error.message", "error"])
                .unwrap_or_else(|| self.payload.to_string()),
        )
    }
}
