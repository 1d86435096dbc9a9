//! The ClipForge facade.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use clipforge_common::config::AppConfig;
use clipforge_common::error::{ForgeError, ForgeResult};
use clipforge_content_store::{compute_digest, VideoStore};
use clipforge_edit_log::EditLog;
use clipforge_export_store::ExportStore;
use clipforge_gc::{ArchiveReport, CalcReport, DeleteReport, GcCandidate, GcService};
use clipforge_project_model::export_version::ExportVersion;
use clipforge_project_model::operation::{EditOperation, OpDescriptor};
use clipforge_project_model::project::{Project, RenderOptions, Resolution};
use clipforge_project_model::video::Video;
use clipforge_render_engine::{
    FfmpegBackend, MediaBackend, NullSink, RenderContext, RenderEventSink,
};
use clipforge_render_queue::{JobRecord, RenderQueue, RenderRequest};

use crate::outcome::{AppendOutcome, ExportRequestOutcome, IngestOutcome};

/// Everything wired together: stores, render context, queue, GC.
pub struct ClipForge {
    config: AppConfig,
    edit_log: Arc<EditLog>,
    videos: Arc<VideoStore>,
    exports: Arc<ExportStore>,
    queue: Arc<RenderQueue>,
    gc: GcService,
}

impl ClipForge {
    /// Open the library with the default FFmpeg backend.
    ///
    /// Must be called from within a tokio runtime (the queue spawns its
    /// worker loop).
    pub fn open(config: AppConfig) -> ForgeResult<Self> {
        Self::with_backend(config, Arc::new(FfmpegBackend::new()), Arc::new(NullSink))
    }

    /// Open the library with an explicit media backend and event sink.
    pub fn with_backend(
        config: AppConfig,
        backend: Arc<dyn MediaBackend>,
        sink: Arc<dyn RenderEventSink>,
    ) -> ForgeResult<Self> {
        let root = config.library_dir.clone();
        std::fs::create_dir_all(&root)?;

        let edit_log = Arc::new(EditLog::open(&root)?);
        let videos = Arc::new(VideoStore::open(&root)?);
        let exports = Arc::new(ExportStore::open(&root)?);

        let ctx = Arc::new(RenderContext {
            root: root.clone(),
            edit_log: edit_log.clone(),
            videos: videos.clone(),
            exports: exports.clone(),
            backend,
            sink,
            proxy_resolution: Resolution::new(config.render.proxy_width, config.render.proxy_height),
        });
        let queue = RenderQueue::start(ctx, &root, config.queue.retention_secs)?;
        let gc = GcService::new(&root, exports.clone(), videos.clone());

        Ok(Self {
            config,
            edit_log,
            videos,
            exports,
            queue,
            gc,
        })
    }

    /// Ingest an uploaded file into the content store.
    ///
    /// The file is staged under `uploads/`, digested, and either
    /// deduplicated against an existing video (the stage file is
    /// removed and the existing record aliased) or moved into
    /// `sources/` and registered with `ref_count = 1`.
    pub fn ingest_video(&self, source: &Path) -> ForgeResult<IngestOutcome> {
        if !source.exists() {
            return Err(ForgeError::FileNotFound {
                path: source.to_path_buf(),
            });
        }
        let root = &self.config.library_dir;
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4")
            .to_string();

        let staged = root
            .join("uploads")
            .join(format!("{}.{ext}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(staged.parent().expect("uploads dir has a parent"))?;
        std::fs::copy(source, &staged)?;

        let digest = compute_digest(&staged)?;
        if let Some(existing) = self.videos.deduplicate(&staged, &digest)? {
            return Ok(IngestOutcome {
                video: existing,
                existing: true,
            });
        }

        let rel = Path::new("sources").join(format!("{digest}.{ext}"));
        std::fs::rename(&staged, root.join(&rel))?;
        // A concurrent ingest of the same content may have registered
        // between the dedup check and here; register aliases in that
        // case, and the ref count tells the two outcomes apart.
        let video = self.videos.register(&rel, &digest)?;
        let existing = video.ref_count > 1;
        Ok(IngestOutcome { video, existing })
    }

    /// Create a project over an ingested video.
    pub fn create_project(
        &self,
        name: &str,
        owner_id: &str,
        video_id: &str,
    ) -> ForgeResult<Project> {
        // The video must exist before a project can point at it.
        self.videos.get(video_id)?;
        self.edit_log.create_project(name, owner_id, video_id)
    }

    pub fn get_project(&self, project_id: &str) -> ForgeResult<Project> {
        self.edit_log.get_project(project_id)
    }

    pub fn projects(&self) -> Vec<Project> {
        self.edit_log.projects()
    }

    /// Append an operation batch and enqueue the proxy render for the
    /// new version.
    pub fn append_operations(
        &self,
        project_id: &str,
        user_id: &str,
        ops: Vec<OpDescriptor>,
    ) -> ForgeResult<AppendOutcome> {
        let operation = self.edit_log.append(project_id, user_id, ops)?;
        let job_id = self.queue.enqueue(RenderRequest::Proxy {
            project_id: project_id.to_string(),
            version: operation.version,
        });
        Ok(AppendOutcome {
            version: operation.version,
            operation_id: operation.id,
            job_id,
        })
    }

    /// Ordered operation list, optionally truncated to `up_to`.
    pub fn operations(
        &self,
        project_id: &str,
        up_to: Option<u64>,
    ) -> ForgeResult<Vec<EditOperation>> {
        let version = match up_to {
            Some(version) => version,
            None => self.edit_log.latest_version(project_id)?,
        };
        self.edit_log.operations_up_to(project_id, version)
    }

    /// Request an export render for a version (default: latest).
    ///
    /// If a matching ExportVersion already exists it is returned
    /// immediately with `existing: true`; otherwise an export job is
    /// enqueued. Options are not part of the cache key.
    pub fn request_export(
        &self,
        project_id: &str,
        version: Option<u64>,
        options: Option<RenderOptions>,
    ) -> ForgeResult<ExportRequestOutcome> {
        let latest = self.edit_log.latest_version(project_id)?;
        let version = version.unwrap_or(latest);
        if version > latest {
            return Err(ForgeError::validation(format!(
                "version {version} does not exist for project {project_id} (current version: {latest})"
            )));
        }
        if let Some(export) = self.exports.find_by_project_and_version(project_id, version) {
            return Ok(ExportRequestOutcome::existing(export));
        }

        let options = options.unwrap_or_else(|| self.default_options());
        let job_id = self.queue.enqueue(RenderRequest::Export {
            project_id: project_id.to_string(),
            version,
            options,
        });
        Ok(ExportRequestOutcome::pending(job_id))
    }

    /// All export records for a project, including pin/GC flags.
    pub fn list_exports(&self, project_id: &str) -> ForgeResult<Vec<ExportVersion>> {
        self.edit_log.get_project(project_id)?;
        Ok(self.exports.find_by_project(project_id))
    }

    /// Toggle the pin on an export, returning the new state.
    pub fn toggle_pin(&self, project_id: &str, version: u64) -> ForgeResult<bool> {
        let export = self
            .exports
            .find_by_project_and_version(project_id, version)
            .ok_or_else(|| {
                ForgeError::not_found(format!("export for project {project_id} v{version}"))
            })?;
        self.exports.toggle_pin(&export.id)
    }

    /// Job record for a render job, or `None` for unknown ids.
    pub fn job_status(&self, job_id: &str) -> Option<JobRecord> {
        self.queue.job_status(job_id)
    }

    // GC admin surface.

    pub fn gc_calculate(&self, ttl_days: u32, keep_latest_n: usize) -> ForgeResult<CalcReport> {
        self.gc.calc_candidates(ttl_days, keep_latest_n, Utc::now())
    }

    pub fn gc_candidates(&self, older_than_days: Option<u32>) -> Vec<GcCandidate> {
        self.gc.list_candidates(older_than_days, Utc::now())
    }

    pub fn gc_archive(&self, export_ids: &[String]) -> ArchiveReport {
        self.gc.archive(export_ids)
    }

    pub fn gc_delete(&self, export_ids: &[String], confirmed: bool) -> ForgeResult<DeleteReport> {
        self.gc.delete_archived(export_ids, confirmed)
    }

    pub fn unused_videos(&self) -> Vec<Video> {
        self.gc.find_unused_videos()
    }

    /// Configured GC defaults.
    pub fn gc_defaults(&self) -> &clipforge_common::config::GcDefaults {
        &self.config.gc
    }

    /// Default export options from configuration.
    fn default_options(&self) -> RenderOptions {
        let format = self
            .config
            .render
            .export_format
            .parse()
            .unwrap_or_default();
        RenderOptions {
            resolution: Resolution::new(
                self.config.render.export_width,
                self.config.render.export_height,
            ),
            format,
        }
    }
}
