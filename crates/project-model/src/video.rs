//! Content-addressed source video records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source video deduplicated by content digest.
///
/// `ref_count` counts logical owners of the physical file. The file is
/// only ever deleted by an explicit manual action once the count reaches
/// zero; the dedup path increments the count instead of writing a
/// duplicate file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Unique video identifier (UUID).
    pub id: String,

    /// SHA-256 content digest, lowercase hex.
    pub sha256: String,

    /// Number of logical owners of the physical file.
    pub ref_count: u64,

    /// Path of the physical file, relative to the library root.
    pub file_path: PathBuf,

    /// File size in bytes.
    pub size_bytes: u64,

    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl Video {
    /// Register a first-class video with a single owner.
    pub fn new(sha256: impl Into<String>, file_path: PathBuf, size_bytes: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sha256: sha256.into(),
            ref_count: 1,
            file_path,
            size_bytes,
            created_at: Utc::now(),
        }
    }
}
