//! Export version catalog entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::project::{ExportFormat, Resolution};

/// A materialized export artifact for one `(project, version)` pair.
///
/// At most one record exists per pair. Records move through
/// Active -> (optionally) Archived -> Deleted; archiving relocates the
/// physical file but keeps the catalog record.
///
/// Invariant: `pinned` implies `gc_candidate == false` after every
/// mutation. The catalog store enforces this on each transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportVersion {
    /// Unique export identifier (UUID).
    pub id: String,

    /// Owning project.
    pub project_id: String,

    /// Edit log version this artifact was rendered from.
    pub version: u64,

    /// Storage key of the physical artifact, relative to the library root.
    pub storage_key: String,

    /// Artifact size in bytes.
    pub size_bytes: u64,

    /// Rendered resolution.
    pub resolution: Resolution,

    /// Artifact duration in seconds.
    pub duration_secs: f64,

    /// Container/codec format.
    pub format: ExportFormat,

    /// User-controlled protection from garbage collection.
    pub pinned: bool,

    /// System-controlled eligibility for reclamation.
    pub gc_candidate: bool,

    /// When the record was marked as a GC candidate.
    pub gc_marked_at: Option<DateTime<Utc>>,

    /// Whether the physical file has been relocated under `archive/`.
    pub archived: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields needed to register a freshly rendered export artifact.
#[derive(Debug, Clone)]
pub struct NewExportVersion {
    pub project_id: String,
    pub version: u64,
    pub storage_key: String,
    pub size_bytes: u64,
    pub resolution: Resolution,
    pub duration_secs: f64,
    pub format: ExportFormat,
}

impl ExportVersion {
    /// Build an active, unpinned record from freshly rendered fields.
    pub fn from_new(new: NewExportVersion) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: new.project_id,
            version: new.version,
            storage_key: new.storage_key,
            size_bytes: new.size_bytes,
            resolution: new.resolution,
            duration_secs: new.duration_secs,
            format: new.format,
            pinned: false,
            gc_candidate: false,
            gc_marked_at: None,
            archived: false,
            created_at: Utc::now(),
        }
    }

    /// Age of this artifact relative to `now`, in whole days.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExportVersion {
        ExportVersion::from_new(NewExportVersion {
            project_id: "p1".to_string(),
            version: 2,
            storage_key: "export/p1/v2_final.mp4".to_string(),
            size_bytes: 1024,
            resolution: Resolution::new(1920, 1080),
            duration_secs: 12.5,
            format: ExportFormat::Mp4H264,
        })
    }

    #[test]
    fn test_new_record_is_active_and_unpinned() {
        let export = sample();
        assert!(!export.pinned);
        assert!(!export.gc_candidate);
        assert!(export.gc_marked_at.is_none());
        assert!(!export.archived);
    }

    #[test]
    fn test_age_days() {
        let export = sample();
        let later = export.created_at + chrono::Duration::days(10);
        assert_eq!(export.age_days(later), 10);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let export = sample();
        let json = serde_json::to_string(&export).unwrap();
        let parsed: ExportVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(export, parsed);
    }
}
