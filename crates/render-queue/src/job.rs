//! Render job descriptors and records.

use chrono::{DateTime, Utc};
use clipforge_project_model::project::RenderOptions;
use serde::{Deserialize, Serialize};

/// What a render job should materialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderRequest {
    /// Low-resolution preview artifact.
    Proxy { project_id: String, version: u64 },

    /// Full-resolution deliverable artifact.
    Export {
        project_id: String,
        version: u64,
        options: RenderOptions,
    },
}

impl RenderRequest {
    pub fn project_id(&self) -> &str {
        match self {
            Self::Proxy { project_id, .. } | Self::Export { project_id, .. } => project_id,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            Self::Proxy { version, .. } | Self::Export { version, .. } => *version,
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    /// Whether the job has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A queued render job and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job identifier (UUID).
    pub id: String,

    /// The render request.
    pub request: RenderRequest,

    /// Current state.
    pub state: JobState,

    /// Error message when `state == Failed`.
    pub error: Option<String>,

    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(request: RenderRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request,
            state: JobState::Pending,
            error: None,
            enqueued_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}
