//! The three-phase GC service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clipforge_common::error::{ForgeError, ForgeResult};
use clipforge_content_store::VideoStore;
use clipforge_export_store::ExportStore;
use clipforge_project_model::project::archive_artifact_key;
use clipforge_project_model::video::Video;

use crate::report::{ArchiveReport, CalcReport, DeleteReport, GcCandidate, ItemError};

/// Garbage collector over the export catalog and video catalog.
pub struct GcService {
    root: PathBuf,
    exports: Arc<ExportStore>,
    videos: Arc<VideoStore>,
}

impl GcService {
    pub fn new(root: impl AsRef<Path>, exports: Arc<ExportStore>, videos: Arc<VideoStore>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            exports,
            videos,
        }
    }

    /// Phase 1: compute GC candidates. Flags only, never files.
    ///
    /// Per project, exports are ranked by version descending; the most
    /// recent `keep_latest_n` are exempt. Among the remainder, any
    /// unpinned export older than `ttl_days` becomes a candidate.
    /// Exports already marked by an earlier run are counted separately
    /// from newly marked ones.
    pub fn calc_candidates(
        &self,
        ttl_days: u32,
        keep_latest_n: usize,
        now: DateTime<Utc>,
    ) -> ForgeResult<CalcReport> {
        let mut report = CalcReport::default();

        let mut by_project: std::collections::HashMap<String, Vec<_>> =
            std::collections::HashMap::new();
        for export in self.exports.all() {
            by_project
                .entry(export.project_id.clone())
                .or_default()
                .push(export);
        }

        for (_, mut exports) in by_project {
            exports.sort_by(|a, b| b.version.cmp(&a.version));
            for export in exports.iter().skip(keep_latest_n) {
                if export.pinned {
                    report.exempt_pinned += 1;
                    continue;
                }
                let age_days = export.age_days(now);
                if age_days < ttl_days as i64 {
                    report.exempt_recent += 1;
                    continue;
                }

                let (record, newly_marked) = if export.gc_candidate {
                    report.already_marked += 1;
                    (export.clone(), false)
                } else {
                    let marked = self.exports.mark_for_gc(&export.id, now)?;
                    report.newly_marked += 1;
                    (marked, true)
                };
                report.candidates.push(GcCandidate {
                    export_id: record.id.clone(),
                    project_id: record.project_id.clone(),
                    version: record.version,
                    storage_key: record.storage_key.clone(),
                    size_bytes: record.size_bytes,
                    age_days,
                    gc_marked_at: record.gc_marked_at,
                    newly_marked,
                });
            }
        }

        tracing::info!(
            newly_marked = report.newly_marked,
            already_marked = report.already_marked,
            "GC candidate calculation complete"
        );
        Ok(report)
    }

    /// Current candidates, optionally only those marked at least
    /// `older_than_days` days ago.
    pub fn list_candidates(
        &self,
        older_than_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Vec<GcCandidate> {
        self.exports
            .candidates()
            .into_iter()
            .filter(|export| match (older_than_days, export.gc_marked_at) {
                (Some(days), Some(marked_at)) => (now - marked_at).num_days() >= days as i64,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .map(|export| GcCandidate {
                export_id: export.id.clone(),
                project_id: export.project_id.clone(),
                version: export.version,
                storage_key: export.storage_key.clone(),
                size_bytes: export.size_bytes,
                age_days: export.age_days(now),
                gc_marked_at: export.gc_marked_at,
                newly_marked: false,
            })
            .collect()
    }

    /// Phase 2: relocate candidate files under `archive/`.
    ///
    /// Per-item fault isolation: a missing or pinned export produces an
    /// item error and the batch continues. The catalog record's storage
    /// key is rewritten in place, so archiving stays reversible in
    /// principle — the file still exists, just elsewhere.
    pub fn archive(&self, export_ids: &[String]) -> ArchiveReport {
        let mut report = ArchiveReport::default();

        for export_id in export_ids {
            match self.archive_one(export_id) {
                Ok(()) => report.archived.push(export_id.clone()),
                Err(e) => report.errors.push(ItemError {
                    export_id: export_id.clone(),
                    error: e.to_string(),
                }),
            }
        }
        report
    }

    fn archive_one(&self, export_id: &str) -> ForgeResult<()> {
        let export = self.exports.get(export_id)?;
        if export.pinned {
            return Err(ForgeError::pinned(format!(
                "export {export_id} is pinned and cannot be archived"
            )));
        }
        if export.archived {
            return Err(ForgeError::validation(format!(
                "export {export_id} is already archived"
            )));
        }

        let source = self.root.join(&export.storage_key);
        if !source.exists() {
            return Err(ForgeError::FileNotFound { path: source });
        }
        let archived_key = archive_artifact_key(&export.storage_key);
        let target = self.root.join(&archived_key);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&source, &target)?;
        self.exports.set_storage_key(export_id, &archived_key, true)?;
        tracing::info!(export = export_id, key = %archived_key, "Archived export artifact");
        Ok(())
    }

    /// Phase 3: destroy files and catalog records.
    ///
    /// Refuses outright unless `confirmed` — a deliberate extra gate
    /// distinct from normal validation, because this phase is
    /// irreversible. Per item: pinned exports are skipped with an
    /// error; an already-missing file is tolerated and the record is
    /// still removed.
    pub fn delete_archived(
        &self,
        export_ids: &[String],
        confirmed: bool,
    ) -> ForgeResult<DeleteReport> {
        if !confirmed {
            return Err(ForgeError::confirmation_required(
                "deleting archived exports is irreversible; pass confirmed=true",
            ));
        }

        let mut report = DeleteReport::default();
        for export_id in export_ids {
            match self.delete_one(export_id) {
                Ok(size_bytes) => {
                    report.deleted.push(export_id.clone());
                    report.space_saved_bytes += size_bytes;
                }
                Err(e) => report.errors.push(ItemError {
                    export_id: export_id.clone(),
                    error: e.to_string(),
                }),
            }
        }
        tracing::info!(
            deleted = report.deleted.len(),
            space_saved_bytes = report.space_saved_bytes,
            "GC delete phase complete"
        );
        Ok(report)
    }

    fn delete_one(&self, export_id: &str) -> ForgeResult<u64> {
        let export = self.exports.get(export_id)?;
        if export.pinned {
            return Err(ForgeError::pinned(format!(
                "export {export_id} is pinned and cannot be deleted"
            )));
        }

        let path = self.root.join(&export.storage_key);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(export = export_id, path = %path.display(), "Artifact already gone");
            }
            Err(e) => return Err(e.into()),
        }
        self.exports.remove(export_id)?;
        Ok(export.size_bytes)
    }

    /// Source videos with no remaining logical owners. Read-only.
    pub fn find_unused_videos(&self) -> Vec<Video> {
        self.videos.unused()
    }
}
