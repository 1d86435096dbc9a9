//! Project records and the artifact key scheme.
//!
//! A project ties a source video to its append-only edit log. The
//! `current_version` field is the authoritative high-water mark of the
//! log; the `latest_*_key` pointers are opportunistic caches of the most
//! recent materialized artifacts and are never authoritative.

use serde::{Deserialize, Serialize};

/// A video project. Persisted at `projects/{id}.json` under the library root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier (UUID).
    pub id: String,

    /// Human-readable project name.
    pub name: String,

    /// Owning user. Operation appends from anyone else are rejected.
    pub owner_id: String,

    /// Id of the owning source video record.
    pub video_id: String,

    /// Current edit log version. Starts at 0 and increases by exactly
    /// one per accepted operation batch.
    pub current_version: u64,

    /// Storage key of the most recent materialized proxy artifact.
    pub latest_proxy_key: Option<String>,

    /// Storage key of the most recent materialized export artifact.
    pub latest_export_key: Option<String>,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,
}

impl Project {
    /// Create a new project at version 0 with no rendered artifacts.
    pub fn new(
        name: impl Into<String>,
        owner_id: impl Into<String>,
        video_id: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            owner_id: owner_id.into(),
            video_id: video_id.into(),
            current_version: 0,
            latest_proxy_key: None,
            latest_export_key: None,
            created_at: now.clone(),
            modified_at: now,
        }
    }
}

/// Output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Output video format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    #[serde(rename = "mp4-h264")]
    Mp4H264,
    #[serde(rename = "mp4-h265")]
    Mp4H265,
    Webm,
    Gif,
}

impl ExportFormat {
    /// File extension used in artifact keys.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4H264 | Self::Mp4H265 => "mp4",
            Self::Webm => "webm",
            Self::Gif => "gif",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp4-h264" => Ok(Self::Mp4H264),
            "mp4-h265" => Ok(Self::Mp4H265),
            "webm" => Ok(Self::Webm),
            "gif" => Ok(Self::Gif),
            other => Err(format!(
                "Unknown format: {other}. Use: mp4-h264, mp4-h265, webm, gif"
            )),
        }
    }
}

/// Render parameters for an export request.
///
/// These affect the rendered output but are deliberately not part of the
/// export cache key, which is `(project_id, version)` alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub resolution: Resolution,
    pub format: ExportFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(1920, 1080),
            format: ExportFormat::Mp4H264,
        }
    }
}

/// Storage key for the proxy artifact of `(project_id, version)`.
///
/// The layout is fixed for compatibility: `proxy/{projectId}/v{version}_proxy.{ext}`.
pub fn proxy_artifact_key(project_id: &str, version: u64, ext: &str) -> String {
    format!("proxy/{project_id}/v{version}_proxy.{ext}")
}

/// Storage key for the export artifact of `(project_id, version)`.
///
/// The layout is fixed for compatibility: `export/{projectId}/v{version}_final.{format}`.
pub fn export_artifact_key(project_id: &str, version: u64, format: ExportFormat) -> String {
    format!(
        "export/{project_id}/v{version}_final.{}",
        format.extension()
    )
}

/// Relocated key for an archived export artifact.
///
/// Archiving moves the physical file under `archive/` while preserving
/// the per-project directory and file name.
pub fn archive_artifact_key(storage_key: &str) -> String {
    match storage_key.strip_prefix("export/") {
        Some(rest) => format!("archive/{rest}"),
        None => format!("archive/{storage_key}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_starts_at_version_zero() {
        let project = Project::new("Launch Teaser", "alice", "vid-1");
        assert_eq!(project.current_version, 0);
        assert!(project.latest_proxy_key.is_none());
        assert!(project.latest_export_key.is_none());
    }

    #[test]
    fn test_proxy_key_layout() {
        assert_eq!(
            proxy_artifact_key("p1", 3, "mp4"),
            "proxy/p1/v3_proxy.mp4"
        );
    }

    #[test]
    fn test_export_key_layout() {
        assert_eq!(
            export_artifact_key("p1", 2, ExportFormat::Webm),
            "export/p1/v2_final.webm"
        );
    }

    #[test]
    fn test_archive_key_swaps_prefix() {
        let key = export_artifact_key("p1", 2, ExportFormat::Mp4H264);
        assert_eq!(archive_artifact_key(&key), "archive/p1/v2_final.mp4");
    }

    #[test]
    fn test_format_parse_and_extension() {
        let format: ExportFormat = "mp4-h265".parse().unwrap();
        assert_eq!(format, ExportFormat::Mp4H265);
        assert_eq!(format.extension(), "mp4");
        assert!("avi".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_project_serialization_roundtrip() {
        let project = Project::new("Test", "bob", "vid-9");
        let json = serde_json::to_string_pretty(&project).unwrap();
        let parsed: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, project.id);
        assert_eq!(parsed.owner_id, "bob");
    }
}
