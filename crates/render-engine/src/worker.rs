//! Proxy and export render workers.

use std::path::PathBuf;
use std::sync::Arc;

use clipforge_common::error::{ForgeError, ForgeResult};
use clipforge_content_store::VideoStore;
use clipforge_edit_log::EditLog;
use clipforge_export_store::ExportStore;
use clipforge_project_model::export_version::{ExportVersion, NewExportVersion};
use clipforge_project_model::project::{
    export_artifact_key, proxy_artifact_key, Project, RenderOptions, Resolution,
};

use crate::backend::MediaBackend;
use crate::events::{RenderEvent, RenderEventSink, RenderStage};
use crate::plan::{fold_operations, RenderPlan};

/// Everything a render worker needs, passed explicitly.
pub struct RenderContext {
    pub root: PathBuf,
    pub edit_log: Arc<EditLog>,
    pub videos: Arc<VideoStore>,
    pub exports: Arc<ExportStore>,
    pub backend: Arc<dyn MediaBackend>,
    pub sink: Arc<dyn RenderEventSink>,
    pub proxy_resolution: Resolution,
}

/// Result of a proxy render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Storage key of the artifact, relative to the library root.
    pub storage_key: String,

    /// Whether an existing artifact satisfied the request without work.
    pub cache_hit: bool,
}

/// A render targets a log version that actually exists; an artifact
/// registered for a version beyond the log would misrepresent the state
/// it was rendered from.
fn check_version(project: &Project, version: u64) -> ForgeResult<()> {
    if version > project.current_version {
        return Err(ForgeError::validation(format!(
            "version {version} does not exist for project {} (current version: {})",
            project.id, project.current_version
        )));
    }
    Ok(())
}

impl RenderContext {
    /// Materialize the proxy artifact for `(project, version)`.
    ///
    /// Idempotent: the artifact key is deterministic, and if a file
    /// already exists at it the call is a cache hit — the project's
    /// `latest_proxy_key` pointer is refreshed and no transcode runs.
    pub fn render_proxy(&self, project_id: &str, version: u64) -> ForgeResult<RenderedArtifact> {
        let project = self.edit_log.get_project(project_id)?;
        check_version(&project, version)?;
        let key = proxy_artifact_key(project_id, version, "mp4");
        let artifact_path = self.root.join(&key);

        if artifact_path.exists() {
            tracing::debug!(project = project_id, version, %key, "Proxy cache hit");
            self.edit_log.set_latest_proxy_key(project_id, &key)?;
            self.emit(project_id, version, RenderStage::Completed, Some(&key));
            return Ok(RenderedArtifact {
                storage_key: key,
                cache_hit: true,
            });
        }

        let plan = self.plan_for(project_id, version)?;
        self.materialize(&project, version, &plan, self.proxy_resolution, &key)?;
        self.edit_log.set_latest_proxy_key(project_id, &key)?;
        self.emit(project_id, version, RenderStage::Completed, Some(&key));

        Ok(RenderedArtifact {
            storage_key: key,
            cache_hit: false,
        })
    }

    /// Materialize the export artifact for `(project, version)`.
    ///
    /// The cache check runs against the export catalog: one artifact
    /// per `(project, version)`, full stop. Options shape the render
    /// but are not part of the cache key, so a repeat request with
    /// different options returns the existing artifact unchanged
    /// (`cache_hit == true`).
    pub fn render_export(
        &self,
        project_id: &str,
        version: u64,
        options: &RenderOptions,
    ) -> ForgeResult<(ExportVersion, bool)> {
        let project = self.edit_log.get_project(project_id)?;
        check_version(&project, version)?;

        if let Some(existing) = self.exports.find_by_project_and_version(project_id, version) {
            tracing::debug!(project = project_id, version, "Export cache hit");
            self.edit_log
                .set_latest_export_key(project_id, &existing.storage_key)?;
            self.emit(
                project_id,
                version,
                RenderStage::Completed,
                Some(&existing.storage_key),
            );
            return Ok((existing, true));
        }

        let plan = self.plan_for(project_id, version)?;
        let key = export_artifact_key(project_id, version, options.format);
        let artifact_path =
            self.materialize(&project, version, &plan, options.resolution, &key)?;

        let info = self.backend.probe(&artifact_path).unwrap_or_else(|e| {
            tracing::warn!(artifact = %artifact_path.display(), "Probe failed: {e}");
            crate::backend::MediaInfo {
                duration_secs: 0.0,
                width: options.resolution.width,
                height: options.resolution.height,
            }
        });
        let size_bytes = std::fs::metadata(&artifact_path)?.len();

        let export = self.exports.create(NewExportVersion {
            project_id: project_id.to_string(),
            version,
            storage_key: key.clone(),
            size_bytes,
            resolution: options.resolution,
            duration_secs: info.duration_secs,
            format: options.format,
        })?;
        self.edit_log.set_latest_export_key(project_id, &key)?;
        self.emit(project_id, version, RenderStage::Completed, Some(&key));

        Ok((export, false))
    }

    /// Replay the log prefix and fold it into a render plan.
    fn plan_for(&self, project_id: &str, version: u64) -> ForgeResult<RenderPlan> {
        let operations = self.edit_log.operations_up_to(project_id, version)?;
        Ok(fold_operations(&operations))
    }

    /// Run the backend against the source video, writing the artifact
    /// at `key`.
    ///
    /// The render lands in a `.tmp` sibling first and is renamed into
    /// place only on success, so a failed or interrupted render never
    /// leaves a partial artifact at the deterministic key.
    fn materialize(
        &self,
        project: &Project,
        version: u64,
        plan: &RenderPlan,
        resolution: Resolution,
        key: &str,
    ) -> ForgeResult<PathBuf> {
        let video = self.videos.get(&project.video_id)?;
        let source = self.videos.physical_path(&video);
        if !source.exists() {
            return Err(ForgeError::render(format!(
                "source video missing for project {}: {}",
                project.id,
                source.display()
            )));
        }

        let artifact_path = self.root.join(key);
        if let Some(parent) = artifact_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = artifact_path.with_extension("tmp");

        self.emit(&project.id, version, RenderStage::Preparing, None);
        tracing::info!(
            project = %project.id,
            version,
            effects = plan.len(),
            resolution = %resolution,
            backend = self.backend.name(),
            "Rendering artifact"
        );
        self.emit(&project.id, version, RenderStage::Rendering, None);

        if let Err(e) = self
            .backend
            .apply_plan(&source, plan, resolution, &tmp_path)
        {
            std::fs::remove_file(&tmp_path).ok();
            self.emit(
                &project.id,
                version,
                RenderStage::Failed,
                Some(&e.to_string()),
            );
            return Err(e);
        }

        std::fs::rename(&tmp_path, &artifact_path)?;
        Ok(artifact_path)
    }

    fn emit(&self, project_id: &str, version: u64, stage: RenderStage, message: Option<&str>) {
        self.sink.emit(RenderEvent {
            project_id: project_id.to_string(),
            version,
            stage,
            message: message.map(str::to_string),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MediaInfo;
    use clipforge_content_store::compute_digest;
    use clipforge_project_model::operation::OpDescriptor;
    use clipforge_project_model::project::ExportFormat;
    use serde_json::json;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend double that counts transcodes and records applied plans.
    struct CountingBackend {
        renders: AtomicUsize,
        plans: Mutex<Vec<RenderPlan>>,
        fail: bool,
    }

    impl CountingBackend {
        fn new(fail: bool) -> Self {
            Self {
                renders: AtomicUsize::new(0),
                plans: Mutex::new(vec![]),
                fail,
            }
        }

        fn render_count(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }

    impl MediaBackend for CountingBackend {
        fn apply_plan(
            &self,
            input: &Path,
            plan: &RenderPlan,
            _target: Resolution,
            output: &Path,
        ) -> ForgeResult<()> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            self.plans.lock().unwrap().push(plan.clone());
            if self.fail {
                return Err(ForgeError::render("transcoder exploded"));
            }
            let content = std::fs::read(input)?;
            std::fs::write(output, content)?;
            Ok(())
        }

        fn probe(&self, _path: &Path) -> ForgeResult<MediaInfo> {
            Ok(MediaInfo {
                duration_secs: 12.0,
                width: 1920,
                height: 1080,
            })
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Fixture {
        root: PathBuf,
        ctx: RenderContext,
        backend: Arc<CountingBackend>,
        project_id: String,
    }

    fn fixture(name: &str, fail: bool) -> Fixture {
        let root = std::env::temp_dir().join(format!("clipforge_worker_{name}"));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();

        let edit_log = Arc::new(EditLog::open(&root).unwrap());
        let videos = Arc::new(VideoStore::open(&root).unwrap());
        let exports = Arc::new(ExportStore::open(&root).unwrap());

        let source = root.join("sources/demo.mp4");
        std::fs::write(&source, b"pretend video frames").unwrap();
        let digest = compute_digest(&source).unwrap();
        let video = videos
            .register(Path::new("sources/demo.mp4"), &digest)
            .unwrap();
        let project = edit_log.create_project("Demo", "alice", &video.id).unwrap();
        for effect in ["trim", "brightness", "fade"] {
            edit_log
                .append(
                    &project.id,
                    "alice",
                    vec![OpDescriptor::new("apply_effect", effect, json!({}))],
                )
                .unwrap();
        }

        let backend = Arc::new(CountingBackend::new(fail));
        let ctx = RenderContext {
            root: root.clone(),
            edit_log,
            videos,
            exports,
            backend: backend.clone(),
            sink: Arc::new(crate::events::NullSink),
            proxy_resolution: Resolution::new(854, 480),
        };
        Fixture {
            root,
            ctx,
            backend,
            project_id: project.id,
        }
    }

    #[test]
    fn test_proxy_render_is_idempotent() {
        let f = fixture("proxy_idem", false);

        let first = f.ctx.render_proxy(&f.project_id, 2).unwrap();
        assert!(!first.cache_hit);
        assert_eq!(f.backend.render_count(), 1);

        let second = f.ctx.render_proxy(&f.project_id, 2).unwrap();
        assert!(second.cache_hit);
        assert_eq!(second.storage_key, first.storage_key);
        assert_eq!(f.backend.render_count(), 1);

        let project = f.ctx.edit_log.get_project(&f.project_id).unwrap();
        assert_eq!(project.latest_proxy_key, Some(first.storage_key));

        std::fs::remove_dir_all(&f.root).ok();
    }

    #[test]
    fn test_proxy_plan_covers_log_prefix_only() {
        let f = fixture("proxy_prefix", false);
        f.ctx.render_proxy(&f.project_id, 2).unwrap();

        let plans = f.backend.plans.lock().unwrap();
        let effects: Vec<&str> = plans[0].effects.iter().map(|e| e.effect.as_str()).collect();
        assert_eq!(effects, vec!["trim", "brightness"]);

        drop(plans);
        std::fs::remove_dir_all(&f.root).ok();
    }

    #[test]
    fn test_export_render_registers_catalog_record() {
        let f = fixture("export_create", false);
        let (export, cache_hit) = f
            .ctx
            .render_export(&f.project_id, 3, &RenderOptions::default())
            .unwrap();
        assert!(!cache_hit);
        assert_eq!(export.version, 3);
        assert_eq!(export.storage_key, format!("export/{}/v3_final.mp4", f.project_id));
        assert!((export.duration_secs - 12.0).abs() < 1e-9);
        assert!(f.root.join(&export.storage_key).exists());

        let project = f.ctx.edit_log.get_project(&f.project_id).unwrap();
        assert_eq!(project.latest_export_key, Some(export.storage_key));

        std::fs::remove_dir_all(&f.root).ok();
    }

    #[test]
    fn test_export_rerequest_with_different_options_returns_existing() {
        let f = fixture("export_options", false);
        let (first, _) = f
            .ctx
            .render_export(&f.project_id, 2, &RenderOptions::default())
            .unwrap();
        assert_eq!(f.backend.render_count(), 1);

        let different = RenderOptions {
            resolution: Resolution::new(1280, 720),
            format: ExportFormat::Webm,
        };
        let (second, cache_hit) = f
            .ctx
            .render_export(&f.project_id, 2, &different)
            .unwrap();

        // Version is the sole cache key: same artifact, no re-render.
        assert!(cache_hit);
        assert_eq!(second.id, first.id);
        assert_eq!(second.format, ExportFormat::Mp4H264);
        assert_eq!(f.backend.render_count(), 1);

        std::fs::remove_dir_all(&f.root).ok();
    }

    #[test]
    fn test_failed_render_leaves_no_artifact_or_record() {
        let f = fixture("failure", true);

        let err = f.ctx.render_proxy(&f.project_id, 1).unwrap_err();
        assert!(matches!(err, ForgeError::Render { .. }));
        let key = proxy_artifact_key(&f.project_id, 1, "mp4");
        assert!(!f.root.join(&key).exists());
        assert!(!f.root.join(&key).with_extension("tmp").exists());

        let project = f.ctx.edit_log.get_project(&f.project_id).unwrap();
        assert!(project.latest_proxy_key.is_none());

        let err = f
            .ctx
            .render_export(&f.project_id, 1, &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, ForgeError::Render { .. }));
        assert!(f
            .ctx
            .exports
            .find_by_project_and_version(&f.project_id, 1)
            .is_none());

        std::fs::remove_dir_all(&f.root).ok();
    }

    #[test]
    fn test_version_beyond_log_is_rejected() {
        let f = fixture("beyond_log", false);

        let err = f.ctx.render_proxy(&f.project_id, 99).unwrap_err();
        assert!(matches!(err, ForgeError::Validation { .. }));

        let err = f
            .ctx
            .render_export(&f.project_id, 99, &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, ForgeError::Validation { .. }));

        // Nothing was transcoded or cataloged for the phantom version.
        assert_eq!(f.backend.render_count(), 0);
        assert!(f
            .ctx
            .exports
            .find_by_project_and_version(&f.project_id, 99)
            .is_none());

        std::fs::remove_dir_all(&f.root).ok();
    }

    #[test]
    fn test_missing_source_is_render_error() {
        let f = fixture("missing_source", false);
        std::fs::remove_file(f.root.join("sources/demo.mp4")).unwrap();

        let err = f.ctx.render_proxy(&f.project_id, 1).unwrap_err();
        assert!(matches!(err, ForgeError::Render { .. }));
        assert_eq!(f.backend.render_count(), 0);

        std::fs::remove_dir_all(&f.root).ok();
    }
}
