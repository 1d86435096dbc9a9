//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the media library (projects, logs, artifacts, catalogs).
    pub library_dir: PathBuf,

    /// Render defaults for proxy and export artifacts.
    pub render: RenderDefaults,

    /// Render job queue settings.
    pub queue: QueueConfig,

    /// Garbage-collection defaults.
    pub gc: GcDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderDefaults {
    /// Proxy artifact width in pixels.
    pub proxy_width: u32,

    /// Proxy artifact height in pixels.
    pub proxy_height: u32,

    /// Default export width in pixels.
    pub export_width: u32,

    /// Default export height in pixels.
    pub export_height: u32,

    /// Default export format identifier (e.g. "mp4-h264").
    pub export_format: String,
}

/// Render queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Seconds to retain completed/failed job records before reclaiming them.
    pub retention_secs: u64,
}

/// Garbage-collection defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcDefaults {
    /// Minimum age in days before an unpinned export becomes a GC candidate.
    pub ttl_days: u32,

    /// Number of most recent exports per project exempt from GC.
    pub keep_latest_n: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipforge=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_dir: dirs_default_library(),
            render: RenderDefaults::default(),
            queue: QueueConfig::default(),
            gc: GcDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            proxy_width: 854,
            proxy_height: 480,
            export_width: 1920,
            export_height: 1080,
            export_format: "mp4-h264".to_string(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            retention_secs: 3600,
        }
    }
}

impl Default for GcDefaults {
    fn default() -> Self {
        Self {
            ttl_days: 30,
            keep_latest_n: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipforge").join("config.json")
}

/// Default library directory.
fn dirs_default_library() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("clipforge").join("library")
}
