//! Operation result payloads.

use clipforge_project_model::export_version::ExportVersion;
use clipforge_project_model::video::Video;
use serde::Serialize;

/// Result of appending an operation batch.
#[derive(Debug, Clone, Serialize)]
pub struct AppendOutcome {
    /// The log version the batch was accepted at.
    pub version: u64,

    /// Id of the persisted operation batch.
    pub operation_id: String,

    /// Id of the proxy render job enqueued for the new version.
    pub job_id: String,
}

/// Result of an export request.
///
/// A duplicate request for an already-materialized version is a
/// success carrying `existing: true`, never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExportRequestOutcome {
    /// A cached artifact satisfied the request immediately.
    Existing {
        existing: bool,
        export: ExportVersion,
    },

    /// An export job was enqueued; poll the job for completion.
    Pending { status: String, job_id: String },
}

impl ExportRequestOutcome {
    pub fn existing(export: ExportVersion) -> Self {
        Self::Existing {
            existing: true,
            export,
        }
    }

    pub fn pending(job_id: String) -> Self {
        Self::Pending {
            status: "pending".to_string(),
            job_id,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing { .. })
    }
}

/// Result of ingesting an upload into the content store.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub video: Video,

    /// True when the upload deduplicated against an existing video and
    /// became an alias of it.
    pub existing: bool,
}
