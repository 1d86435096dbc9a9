//! The export version catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use clipforge_common::error::{ForgeError, ForgeResult};
use clipforge_project_model::export_version::{ExportVersion, NewExportVersion};

/// Catalog of export artifacts, persisted at `exports.json`.
///
/// Invariants owned by this store:
/// - at most one record per `(project_id, version)`
/// - `pinned` implies `gc_candidate == false` after every mutation
pub struct ExportStore {
    catalog_path: PathBuf,
    exports: Mutex<HashMap<String, ExportVersion>>,
}

impl ExportStore {
    /// Open the catalog at the given library root.
    pub fn open(root: impl AsRef<Path>) -> ForgeResult<Self> {
        let catalog_path = root.as_ref().join("exports.json");
        let exports = if catalog_path.exists() {
            let content = std::fs::read_to_string(&catalog_path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            catalog_path,
            exports: Mutex::new(exports),
        })
    }

    /// Register a freshly rendered export artifact.
    ///
    /// Rejects a second record for the same `(project, version)`:
    /// callers check the cache first, so a duplicate here is a bug.
    pub fn create(&self, new: NewExportVersion) -> ForgeResult<ExportVersion> {
        let mut exports = self.exports.lock().expect("export catalog lock poisoned");
        if exports
            .values()
            .any(|export| export.project_id == new.project_id && export.version == new.version)
        {
            return Err(ForgeError::validation(format!(
                "export already exists for project {} version {}",
                new.project_id, new.version
            )));
        }
        let export = ExportVersion::from_new(new);
        exports.insert(export.id.clone(), export.clone());
        self.persist(&exports)?;
        Ok(export)
    }

    /// Fetch a record by id.
    pub fn get(&self, export_id: &str) -> ForgeResult<ExportVersion> {
        let exports = self.exports.lock().expect("export catalog lock poisoned");
        exports
            .get(export_id)
            .cloned()
            .ok_or_else(|| ForgeError::not_found(format!("export {export_id}")))
    }

    /// The cached artifact for `(project, version)`, if one exists.
    pub fn find_by_project_and_version(
        &self,
        project_id: &str,
        version: u64,
    ) -> Option<ExportVersion> {
        let exports = self.exports.lock().expect("export catalog lock poisoned");
        exports
            .values()
            .find(|export| export.project_id == project_id && export.version == version)
            .cloned()
    }

    /// All exports for a project, ascending by version.
    pub fn find_by_project(&self, project_id: &str) -> Vec<ExportVersion> {
        let exports = self.exports.lock().expect("export catalog lock poisoned");
        let mut found: Vec<ExportVersion> = exports
            .values()
            .filter(|export| export.project_id == project_id)
            .cloned()
            .collect();
        found.sort_by_key(|export| export.version);
        found
    }

    /// Every record in the catalog.
    pub fn all(&self) -> Vec<ExportVersion> {
        let exports = self.exports.lock().expect("export catalog lock poisoned");
        exports.values().cloned().collect()
    }

    /// Current GC candidates.
    pub fn candidates(&self) -> Vec<ExportVersion> {
        let exports = self.exports.lock().expect("export catalog lock poisoned");
        exports
            .values()
            .filter(|export| export.gc_candidate)
            .cloned()
            .collect()
    }

    /// Flip pin state, returning the new value.
    ///
    /// Transitioning to pinned clears `gc_candidate` and `gc_marked_at`
    /// in the same operation, keeping the exclusion invariant.
    pub fn toggle_pin(&self, export_id: &str) -> ForgeResult<bool> {
        self.mutate(export_id, |export| {
            export.pinned = !export.pinned;
            if export.pinned {
                export.gc_candidate = false;
                export.gc_marked_at = None;
            }
            Ok(export.pinned)
        })
    }

    /// Mark a record as eligible for reclamation.
    ///
    /// The one hard safety rule of the subsystem: a pinned export can
    /// never become a GC candidate.
    pub fn mark_for_gc(
        &self,
        export_id: &str,
        now: DateTime<Utc>,
    ) -> ForgeResult<ExportVersion> {
        self.mutate(export_id, |export| {
            if export.pinned {
                return Err(ForgeError::pinned(format!(
                    "export {export_id} is pinned and cannot be marked for GC"
                )));
            }
            export.gc_candidate = true;
            export.gc_marked_at = Some(now);
            Ok(export.clone())
        })
    }

    /// Clear GC-candidate state.
    pub fn unmark_for_gc(&self, export_id: &str) -> ForgeResult<ExportVersion> {
        self.mutate(export_id, |export| {
            export.gc_candidate = false;
            export.gc_marked_at = None;
            Ok(export.clone())
        })
    }

    /// Rewrite the storage key in place (archive relocation).
    pub fn set_storage_key(
        &self,
        export_id: &str,
        storage_key: &str,
        archived: bool,
    ) -> ForgeResult<ExportVersion> {
        self.mutate(export_id, |export| {
            export.storage_key = storage_key.to_string();
            export.archived = archived;
            Ok(export.clone())
        })
    }

    /// Delete a catalog record, returning it.
    pub fn remove(&self, export_id: &str) -> ForgeResult<ExportVersion> {
        let mut exports = self.exports.lock().expect("export catalog lock poisoned");
        let export = exports
            .remove(export_id)
            .ok_or_else(|| ForgeError::not_found(format!("export {export_id}")))?;
        self.persist(&exports)?;
        Ok(export)
    }

    fn mutate<T>(
        &self,
        export_id: &str,
        mutate: impl FnOnce(&mut ExportVersion) -> ForgeResult<T>,
    ) -> ForgeResult<T> {
        let mut exports = self.exports.lock().expect("export catalog lock poisoned");
        let export = exports
            .get_mut(export_id)
            .ok_or_else(|| ForgeError::not_found(format!("export {export_id}")))?;
        let result = mutate(export)?;
        self.persist(&exports)?;
        Ok(result)
    }

    fn persist(&self, exports: &HashMap<String, ExportVersion>) -> ForgeResult<()> {
        let json = serde_json::to_string_pretty(exports)?;
        std::fs::write(&self.catalog_path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_project_model::project::{ExportFormat, Resolution};

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clipforge_exportstore_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn new_export(project_id: &str, version: u64) -> NewExportVersion {
        NewExportVersion {
            project_id: project_id.to_string(),
            version,
            storage_key: format!("export/{project_id}/v{version}_final.mp4"),
            size_bytes: 4096,
            resolution: Resolution::new(1920, 1080),
            duration_secs: 30.0,
            format: ExportFormat::Mp4H264,
        }
    }

    #[test]
    fn test_create_rejects_duplicate_pair() {
        let root = temp_root("duplicate");
        let store = ExportStore::open(&root).unwrap();
        store.create(new_export("p1", 1)).unwrap();
        let err = store.create(new_export("p1", 1)).unwrap_err();
        assert!(matches!(err, ForgeError::Validation { .. }));
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_mark_for_gc_refuses_pinned() {
        let root = temp_root("pinned");
        let store = ExportStore::open(&root).unwrap();
        let export = store.create(new_export("p1", 1)).unwrap();
        assert!(store.toggle_pin(&export.id).unwrap());

        let err = store.mark_for_gc(&export.id, Utc::now()).unwrap_err();
        assert!(err.is_pinned());
        let record = store.get(&export.id).unwrap();
        assert!(!record.gc_candidate);
        assert!(record.gc_marked_at.is_none());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_pinning_clears_gc_state_atomically() {
        let root = temp_root("exclusion");
        let store = ExportStore::open(&root).unwrap();
        let export = store.create(new_export("p1", 1)).unwrap();
        store.mark_for_gc(&export.id, Utc::now()).unwrap();

        assert!(store.toggle_pin(&export.id).unwrap());
        let record = store.get(&export.id).unwrap();
        assert!(record.pinned);
        assert!(!record.gc_candidate);
        assert!(record.gc_marked_at.is_none());

        // Unpinning does not resurrect candidate state.
        assert!(!store.toggle_pin(&export.id).unwrap());
        let record = store.get(&export.id).unwrap();
        assert!(!record.gc_candidate);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_find_by_project_sorted_by_version() {
        let root = temp_root("sorted");
        let store = ExportStore::open(&root).unwrap();
        store.create(new_export("p1", 3)).unwrap();
        store.create(new_export("p1", 1)).unwrap();
        store.create(new_export("p2", 2)).unwrap();

        let found = store.find_by_project("p1");
        let versions: Vec<u64> = found.iter().map(|export| export.version).collect();
        assert_eq!(versions, vec![1, 3]);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_unmark_clears_candidate_state() {
        let root = temp_root("unmark");
        let store = ExportStore::open(&root).unwrap();
        let export = store.create(new_export("p1", 1)).unwrap();
        store.mark_for_gc(&export.id, Utc::now()).unwrap();

        let record = store.unmark_for_gc(&export.id).unwrap();
        assert!(!record.gc_candidate);
        assert!(record.gc_marked_at.is_none());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_catalog_survives_reopen() {
        let root = temp_root("reopen");
        let id;
        {
            let store = ExportStore::open(&root).unwrap();
            id = store.create(new_export("p1", 1)).unwrap().id;
        }
        let store = ExportStore::open(&root).unwrap();
        assert_eq!(store.get(&id).unwrap().version, 1);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_remove_deletes_record() {
        let root = temp_root("remove");
        let store = ExportStore::open(&root).unwrap();
        let export = store.create(new_export("p1", 1)).unwrap();
        store.remove(&export.id).unwrap();
        assert!(store.find_by_project_and_version("p1", 1).is_none());
        assert!(store.get(&export.id).is_err());
        std::fs::remove_dir_all(&root).ok();
    }
}
