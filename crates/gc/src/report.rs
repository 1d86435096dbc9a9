//! Structured reports returned by the GC phases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One export eligible for reclamation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcCandidate {
    pub export_id: String,
    pub project_id: String,
    pub version: u64,
    pub storage_key: String,
    pub size_bytes: u64,
    pub age_days: i64,
    pub gc_marked_at: Option<DateTime<Utc>>,
    /// Whether this run marked the record, as opposed to finding it
    /// already marked by an earlier run.
    pub newly_marked: bool,
}

/// Outcome of the candidate-calculation phase. Flags only; no file was
/// moved or deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalcReport {
    pub newly_marked: usize,
    pub already_marked: usize,
    pub exempt_pinned: usize,
    pub exempt_recent: usize,
    pub candidates: Vec<GcCandidate>,
}

/// A per-item failure inside a batch phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemError {
    pub export_id: String,
    pub error: String,
}

/// Outcome of the archive phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveReport {
    /// Ids whose files were relocated under `archive/`.
    pub archived: Vec<String>,
    pub errors: Vec<ItemError>,
}

/// Outcome of the delete phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Ids whose files and catalog records were destroyed.
    pub deleted: Vec<String>,
    pub errors: Vec<ItemError>,
    pub space_saved_bytes: u64,
}
