//! Project records and the append-only operation log.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clipforge_common::error::{ForgeError, ForgeResult};
use clipforge_project_model::operation::{
    parse_operations, validate_ops, EditOperation, OpDescriptor,
};
use clipforge_project_model::project::Project;

/// The versioned edit log for all projects under one library root.
///
/// Project records live behind a single mutex, so the read-increment-
/// write sequence in [`EditLog::append`] is atomic with respect to
/// concurrent appenders: two simultaneous appends to the same project
/// always yield two distinct, gapless versions.
pub struct EditLog {
    root: PathBuf,
    projects: Mutex<HashMap<String, Project>>,
}

impl EditLog {
    /// Open the edit log at the given library root, loading all project
    /// records and reconciling each `current_version` against the tail
    /// of its operation log.
    pub fn open(root: impl AsRef<Path>) -> ForgeResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("projects"))?;
        std::fs::create_dir_all(root.join("oplog"))?;

        let mut projects = HashMap::new();
        for entry in std::fs::read_dir(root.join("projects"))? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(entry.path())?;
            let project: Project = serde_json::from_str(&content)?;
            projects.insert(project.id.clone(), project);
        }

        let log = Self {
            root,
            projects: Mutex::new(projects),
        };
        log.reconcile_versions()?;
        Ok(log)
    }

    /// Create a new project owned by `owner_id` for the given source video.
    pub fn create_project(
        &self,
        name: impl Into<String>,
        owner_id: impl Into<String>,
        video_id: impl Into<String>,
    ) -> ForgeResult<Project> {
        let project = Project::new(name, owner_id, video_id);
        self.persist_project(&project)?;
        let mut projects = self.projects.lock().expect("edit log lock poisoned");
        projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    /// Fetch a project record by id.
    pub fn get_project(&self, project_id: &str) -> ForgeResult<Project> {
        let projects = self.projects.lock().expect("edit log lock poisoned");
        projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| ForgeError::not_found(format!("project {project_id}")))
    }

    /// All known projects, in unspecified order.
    pub fn projects(&self) -> Vec<Project> {
        let projects = self.projects.lock().expect("edit log lock poisoned");
        projects.values().cloned().collect()
    }

    /// Append an operation batch to a project's log.
    ///
    /// Rejects empty or malformed batches with a validation error,
    /// unknown projects with not-found, and non-owners with an
    /// authorization error. On success the batch is persisted with
    /// `version = current_version + 1` and the project's
    /// `current_version` advances in the same locked section.
    pub fn append(
        &self,
        project_id: &str,
        user_id: &str,
        ops: Vec<OpDescriptor>,
    ) -> ForgeResult<EditOperation> {
        validate_ops(&ops).map_err(ForgeError::validation)?;

        let mut projects = self.projects.lock().expect("edit log lock poisoned");
        let project = projects
            .get_mut(project_id)
            .ok_or_else(|| ForgeError::not_found(format!("project {project_id}")))?;
        if project.owner_id != user_id {
            return Err(ForgeError::authorization(format!(
                "user {user_id} does not own project {project_id}"
            )));
        }

        let next = project.current_version + 1;
        let operation = EditOperation::new(project_id, next, ops, user_id);

        // Log line first, project record second. A crash in between
        // leaves a log entry ahead of the record; open() reconciles.
        // The record write happens under the lock so a slower append can
        // never overwrite a newer durable record with an older snapshot.
        self.append_log_line(project_id, &operation)?;
        project.current_version = next;
        project.modified_at = chrono::Utc::now().to_rfc3339();
        self.persist_project(project)?;
        drop(projects);

        tracing::debug!(
            project = project_id,
            version = next,
            ops = operation.ops.len(),
            "Appended operation batch"
        );
        Ok(operation)
    }

    /// All operation batches with `version <= version`, ascending.
    ///
    /// Used by render workers to reconstruct state. The returned prefix
    /// is verified complete against the project record: a gap in the
    /// middle or a truncated tail means the log is corrupt and fails
    /// loudly rather than silently rendering from partial state.
    pub fn operations_up_to(
        &self,
        project_id: &str,
        version: u64,
    ) -> ForgeResult<Vec<EditOperation>> {
        // Existence check first so unknown projects report not-found
        // rather than an empty log.
        let project = self.get_project(project_id)?;

        let mut operations = self.read_log(project_id)?;
        operations.retain(|op| op.version <= version);
        operations.sort_by_key(|op| op.version);

        for (index, operation) in operations.iter().enumerate() {
            let expected = index as u64 + 1;
            if operation.version != expected {
                return Err(ForgeError::integrity(format!(
                    "operation log gap for project {project_id}: expected version {expected}, found {}",
                    operation.version
                )));
            }
        }

        // A gapless prefix can still be short if the log tail was lost.
        let expected_len = version.min(project.current_version);
        if operations.len() as u64 != expected_len {
            return Err(ForgeError::integrity(format!(
                "operation log truncated for project {project_id}: expected {expected_len} operations, found {}",
                operations.len()
            )));
        }
        Ok(operations)
    }

    /// The project's current log version.
    pub fn latest_version(&self, project_id: &str) -> ForgeResult<u64> {
        Ok(self.get_project(project_id)?.current_version)
    }

    /// Update the cached pointer to the most recent proxy artifact.
    pub fn set_latest_proxy_key(&self, project_id: &str, key: &str) -> ForgeResult<()> {
        self.update_project(project_id, |project| {
            project.latest_proxy_key = Some(key.to_string());
        })
    }

    /// Update the cached pointer to the most recent export artifact.
    pub fn set_latest_export_key(&self, project_id: &str, key: &str) -> ForgeResult<()> {
        self.update_project(project_id, |project| {
            project.latest_export_key = Some(key.to_string());
        })
    }

    fn update_project(
        &self,
        project_id: &str,
        mutate: impl FnOnce(&mut Project),
    ) -> ForgeResult<()> {
        let mut projects = self.projects.lock().expect("edit log lock poisoned");
        let project = projects
            .get_mut(project_id)
            .ok_or_else(|| ForgeError::not_found(format!("project {project_id}")))?;
        mutate(project);
        project.modified_at = chrono::Utc::now().to_rfc3339();
        self.persist_project(project)
    }

    /// Advance any project record that lags behind its log tail.
    ///
    /// A crash between the log-line write and the record write in
    /// `append` leaves `current_version` one behind the log; the log is
    /// authoritative, so the record catches up here.
    fn reconcile_versions(&self) -> ForgeResult<()> {
        let ids: Vec<String> = {
            let projects = self.projects.lock().expect("edit log lock poisoned");
            projects.keys().cloned().collect()
        };
        for id in ids {
            let tail = self
                .read_log(&id)?
                .iter()
                .map(|op| op.version)
                .max()
                .unwrap_or(0);
            let mut projects = self.projects.lock().expect("edit log lock poisoned");
            if let Some(project) = projects.get_mut(&id) {
                if project.current_version < tail {
                    tracing::warn!(
                        project = %id,
                        record = project.current_version,
                        log = tail,
                        "Project record behind operation log; advancing"
                    );
                    project.current_version = tail;
                    self.persist_project(project)?;
                }
            }
        }
        Ok(())
    }

    fn project_path(&self, project_id: &str) -> PathBuf {
        self.root.join("projects").join(format!("{project_id}.json"))
    }

    fn oplog_path(&self, project_id: &str) -> PathBuf {
        self.root.join("oplog").join(format!("{project_id}.jsonl"))
    }

    fn persist_project(&self, project: &Project) -> ForgeResult<()> {
        let json = serde_json::to_string_pretty(project)?;
        std::fs::write(self.project_path(&project.id), json)?;
        Ok(())
    }

    fn append_log_line(&self, project_id: &str, operation: &EditOperation) -> ForgeResult<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.oplog_path(project_id))?;
        let mut line = serde_json::to_string(operation)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn read_log(&self, project_id: &str) -> ForgeResult<Vec<EditOperation>> {
        let path = self.oplog_path(project_id);
        if !path.exists() {
            return Ok(vec![]);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(parse_operations(&content)?)
    }
}
