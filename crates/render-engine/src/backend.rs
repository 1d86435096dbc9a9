//! Media backend boundary.
//!
//! The backend is the external collaborator that applies an ordered
//! effect chain to a source file and probes media metadata. ClipForge
//! trusts it to be correct; per-effect filter semantics live upstream,
//! carried opaquely inside each effect's parameters.

use std::path::Path;
use std::process::Command;

use clipforge_common::error::{ForgeError, ForgeResult};
use clipforge_project_model::project::Resolution;

use crate::plan::RenderPlan;

/// Metadata of a media file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

/// Trait for media processing backends (FFmpeg and test doubles).
pub trait MediaBackend: Send + Sync {
    /// Apply the ordered effect chain to `input`, scaled to `target`,
    /// writing the result to `output`.
    fn apply_plan(
        &self,
        input: &Path,
        plan: &RenderPlan,
        target: Resolution,
        output: &Path,
    ) -> ForgeResult<()>;

    /// Probe duration and dimensions of a media file.
    fn probe(&self, path: &Path) -> ForgeResult<MediaInfo>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// FFmpeg subprocess backend.
///
/// Effect descriptors may carry a prebuilt `filter` string in their
/// parameters (produced by the upstream effect compiler); those are
/// chained ahead of the final scale. Effects without one are passed
/// over with a warning rather than guessed at.
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    fn filter_chain(plan: &RenderPlan, target: Resolution) -> String {
        let mut filters: Vec<String> = Vec::new();
        for effect in &plan.effects {
            match effect.parameters.get("filter").and_then(|f| f.as_str()) {
                Some(filter) if !filter.trim().is_empty() => filters.push(filter.to_string()),
                _ => {
                    tracing::warn!(
                        effect = %effect.effect,
                        "Effect carries no prebuilt filter; skipping"
                    );
                }
            }
        }
        filters.push(format!("scale={}:{}", target.width, target.height));
        filters.join(",")
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for FfmpegBackend {
    fn apply_plan(
        &self,
        input: &Path,
        plan: &RenderPlan,
        target: Resolution,
        output: &Path,
    ) -> ForgeResult<()> {
        let filter = Self::filter_chain(plan, target);
        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            %filter,
            "Invoking ffmpeg"
        );

        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vf")
            .arg(&filter)
            .arg(output)
            .output()
            .map_err(|e| ForgeError::render(format!("failed to spawn ffmpeg: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ForgeError::render(format!(
                "ffmpeg exited with {}: {tail}",
                result.status
            )));
        }
        Ok(())
    }

    fn probe(&self, path: &Path) -> ForgeResult<MediaInfo> {
        let result = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|e| ForgeError::render(format!("failed to spawn ffprobe: {e}")))?;

        if !result.status.success() {
            return Err(ForgeError::render(format!(
                "ffprobe exited with {} for {}",
                result.status,
                path.display()
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&result.stdout)?;
        let duration_secs = value
            .pointer("/format/duration")
            .and_then(|d| d.as_str())
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let video_stream = value
            .pointer("/streams")
            .and_then(|s| s.as_array())
            .and_then(|streams| {
                streams.iter().find(|stream| {
                    stream.get("codec_type").and_then(|c| c.as_str()) == Some("video")
                })
            });
        let width = video_stream
            .and_then(|s| s.get("width"))
            .and_then(|w| w.as_u64())
            .unwrap_or(0) as u32;
        let height = video_stream
            .and_then(|s| s.get("height"))
            .and_then(|h| h.as_u64())
            .unwrap_or(0) as u32;

        Ok(MediaInfo {
            duration_secs,
            width,
            height,
        })
    }

    fn is_available(&self) -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
