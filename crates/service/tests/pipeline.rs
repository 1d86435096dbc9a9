//! End-to-end pipeline scenarios against a counting media backend.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clipforge_common::config::AppConfig;
use clipforge_common::error::{ForgeError, ForgeResult};
use clipforge_project_model::operation::OpDescriptor;
use clipforge_project_model::project::Resolution;
use clipforge_render_engine::{MediaBackend, MediaInfo, NullSink, RenderPlan};
use clipforge_render_queue::JobState;
use clipforge_service::{ClipForge, ExportRequestOutcome};
use serde_json::json;

/// Backend double that copies bytes and counts transcode invocations.
struct CountingBackend {
    renders: AtomicUsize,
}

impl CountingBackend {
    fn new() -> Self {
        Self {
            renders: AtomicUsize::new(0),
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
        _plan: &RenderPlan,
        _target: Resolution,
        output: &Path,
    ) -> ForgeResult<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        std::fs::write(output, std::fs::read(input)?)?;
        Ok(())
    }

    fn probe(&self, _path: &Path) -> ForgeResult<MediaInfo> {
        Ok(MediaInfo {
            duration_secs: 8.0,
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

struct Harness {
    root: PathBuf,
    forge: ClipForge,
    backend: Arc<CountingBackend>,
}

impl Drop for Harness {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.root).ok();
    }
}

fn harness(name: &str) -> Harness {
    let root = std::env::temp_dir().join(format!("clipforge_pipeline_{name}"));
    let _ = std::fs::remove_dir_all(&root);

    let config = AppConfig {
        library_dir: root.clone(),
        ..AppConfig::default()
    };
    let backend = Arc::new(CountingBackend::new());
    let forge = ClipForge::with_backend(config, backend.clone(), Arc::new(NullSink)).unwrap();
    Harness {
        root,
        forge,
        backend,
    }
}

fn write_upload(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = root.join("incoming").join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

fn batch(effect: &str) -> Vec<OpDescriptor> {
    vec![OpDescriptor::new("apply_effect", effect, json!({}))]
}

async fn wait_for_job(forge: &ClipForge, job_id: &str) -> JobState {
    for _ in 0..300 {
        if let Some(job) = forge.job_status(job_id) {
            if job.state.is_terminal() {
                return job.state;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never finished");
}

async fn project_with_versions(h: &Harness, n: usize) -> String {
    let upload = write_upload(&h.root, "master.mp4", b"master recording bytes");
    let ingest = h.forge.ingest_video(&upload).unwrap();
    let project = h
        .forge
        .create_project("Launch Video", "alice", &ingest.video.id)
        .unwrap();
    for index in 0..n {
        let outcome = h
            .forge
            .append_operations(&project.id, "alice", batch(&format!("effect{index}")))
            .unwrap();
        wait_for_job(&h.forge, &outcome.job_id).await;
    }
    project.id
}

#[tokio::test]
async fn test_append_bumps_version_and_enqueues_proxy() {
    let h = harness("append");
    let project_id = project_with_versions(&h, 3).await;

    let project = h.forge.get_project(&project_id).unwrap();
    assert_eq!(project.current_version, 3);
    assert_eq!(
        project.latest_proxy_key,
        Some(format!("proxy/{project_id}/v3_proxy.mp4"))
    );
    // One proxy transcode per appended version.
    assert_eq!(h.backend.render_count(), 3);

    let operations = h.forge.operations(&project_id, None).unwrap();
    let versions: Vec<u64> = operations.iter().map(|op| op.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_duplicate_export_request_returns_existing_without_rerender() {
    let h = harness("dup_export");
    let project_id = project_with_versions(&h, 3).await;
    let proxies = h.backend.render_count();

    let first = h.forge.request_export(&project_id, Some(2), None).unwrap();
    let ExportRequestOutcome::Pending { job_id, .. } = first else {
        panic!("first export request should enqueue a job");
    };
    assert_eq!(wait_for_job(&h.forge, &job_id).await, JobState::Completed);
    assert_eq!(h.backend.render_count(), proxies + 1);

    let second = h.forge.request_export(&project_id, Some(2), None).unwrap();
    assert!(second.is_existing());
    let ExportRequestOutcome::Existing { existing, export } = second else {
        unreachable!();
    };
    assert!(existing);
    assert_eq!(export.version, 2);
    // The transcoder never ran a second time.
    assert_eq!(h.backend.render_count(), proxies + 1);
}

#[tokio::test]
async fn test_export_request_for_nonexistent_version_is_rejected() {
    let h = harness("bad_version");
    let project_id = project_with_versions(&h, 3).await;

    let err = h
        .forge
        .request_export(&project_id, Some(99), None)
        .unwrap_err();
    assert!(matches!(err, ForgeError::Validation { .. }));
    assert!(h.forge.list_exports(&project_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_pinned_export_never_becomes_gc_candidate() {
    let h = harness("pin_gc");
    let project_id = project_with_versions(&h, 1).await;

    let outcome = h.forge.request_export(&project_id, Some(1), None).unwrap();
    let ExportRequestOutcome::Pending { job_id, .. } = outcome else {
        panic!("expected pending export");
    };
    wait_for_job(&h.forge, &job_id).await;

    assert!(h.forge.toggle_pin(&project_id, 1).unwrap());

    // Zero TTL, zero keep-latest: everything unpinned would qualify.
    let report = h.forge.gc_calculate(0, 0).unwrap();
    assert_eq!(report.newly_marked, 0);
    assert_eq!(report.exempt_pinned, 1);
    assert!(report.candidates.is_empty());

    let exports = h.forge.list_exports(&project_id).unwrap();
    assert!(exports[0].pinned);
    assert!(!exports[0].gc_candidate);
}

#[tokio::test]
async fn test_delete_without_confirmation_is_refused() {
    let h = harness("confirm");
    let project_id = project_with_versions(&h, 1).await;

    let outcome = h.forge.request_export(&project_id, None, None).unwrap();
    let ExportRequestOutcome::Pending { job_id, .. } = outcome else {
        panic!("expected pending export");
    };
    wait_for_job(&h.forge, &job_id).await;

    let export_id = h.forge.list_exports(&project_id).unwrap()[0].id.clone();
    let err = h
        .forge
        .gc_delete(&[export_id.clone()], false)
        .unwrap_err();
    assert!(matches!(err, ForgeError::ConfirmationRequired { .. }));
    assert_eq!(h.forge.list_exports(&project_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_upload_dedups_to_one_physical_file() {
    let h = harness("dedup");
    let first = write_upload(&h.root, "a.mp4", b"identical video content");
    let second = write_upload(&h.root, "b.mp4", b"identical video content");

    let one = h.forge.ingest_video(&first).unwrap();
    assert!(!one.existing);
    assert_eq!(one.video.ref_count, 1);

    let two = h.forge.ingest_video(&second).unwrap();
    assert!(two.existing);
    assert_eq!(two.video.id, one.video.id);
    assert_eq!(two.video.ref_count, 2);

    // Exactly one physical file in sources/, staging cleaned up.
    let sources: Vec<_> = std::fs::read_dir(h.root.join("sources"))
        .unwrap()
        .collect();
    assert_eq!(sources.len(), 1);
    let uploads: Vec<_> = std::fs::read_dir(h.root.join("uploads"))
        .unwrap()
        .collect();
    assert!(uploads.is_empty());
}

#[tokio::test]
async fn test_full_gc_lifecycle_reclaims_space() {
    let h = harness("gc_lifecycle");
    let project_id = project_with_versions(&h, 2).await;

    for version in 1..=2 {
        let outcome = h
            .forge
            .request_export(&project_id, Some(version), None)
            .unwrap();
        if let ExportRequestOutcome::Pending { job_id, .. } = outcome {
            wait_for_job(&h.forge, &job_id).await;
        }
    }

    let report = h.forge.gc_calculate(0, 1).unwrap();
    assert_eq!(report.newly_marked, 1);
    let candidate_ids: Vec<String> = report
        .candidates
        .iter()
        .map(|candidate| candidate.export_id.clone())
        .collect();

    let archived = h.forge.gc_archive(&candidate_ids);
    assert_eq!(archived.archived.len(), 1);
    assert!(archived.errors.is_empty());
    assert!(h
        .root
        .join(format!("archive/{project_id}/v1_final.mp4"))
        .exists());

    let deleted = h.forge.gc_delete(&candidate_ids, true).unwrap();
    assert_eq!(deleted.deleted.len(), 1);
    assert!(deleted.space_saved_bytes > 0);
    assert_eq!(h.forge.list_exports(&project_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_unused_video_discovery_is_read_only() {
    let h = harness("unused");
    let upload = write_upload(&h.root, "orphan.mp4", b"orphaned content");
    let ingest = h.forge.ingest_video(&upload).unwrap();

    // A freshly ingested video has one owner, so nothing is unused yet.
    assert!(h.forge.unused_videos().is_empty());

    // Discovery never deletes: the physical file stays put regardless.
    assert!(h.root.join(&ingest.video.file_path).exists());
}
