//! The FIFO queue and its worker loop.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use clipforge_common::error::ForgeResult;
use clipforge_render_engine::RenderContext;
use tokio::sync::mpsc;

use crate::job::{JobRecord, JobState, RenderRequest};

/// The render job queue.
///
/// Strictly FIFO across all job types; drained by one worker task.
/// Enqueue is fire-and-forget: failures land on the job record and are
/// observed by polling [`RenderQueue::job_status`], never thrown back
/// at the enqueuing caller.
pub struct RenderQueue {
    records: Mutex<HashMap<String, JobRecord>>,
    tx: mpsc::UnboundedSender<String>,
    journal_path: PathBuf,
    retention: Duration,
}

impl RenderQueue {
    /// Start the queue: recover the journal, re-enqueue unfinished
    /// jobs in their original order, and spawn the worker loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        ctx: Arc<RenderContext>,
        root: impl AsRef<Path>,
        retention_secs: u64,
    ) -> ForgeResult<Arc<Self>> {
        let queue_dir = root.as_ref().join("queue");
        std::fs::create_dir_all(&queue_dir)?;
        let journal_path = queue_dir.join("jobs.json");

        let records: HashMap<String, JobRecord> = if journal_path.exists() {
            let content = std::fs::read_to_string(&journal_path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        let (tx, rx) = mpsc::unbounded_channel();

        // Recovery pass: anything the previous process left unfinished
        // goes back on the queue. A job caught mid-processing restarts
        // from scratch; renders are idempotent, so a replay is safe.
        let mut unfinished: Vec<&JobRecord> = records
            .values()
            .filter(|job| !job.state.is_terminal())
            .collect();
        unfinished.sort_by_key(|job| job.enqueued_at);
        for job in &unfinished {
            tracing::info!(job = %job.id, state = ?job.state, "Recovering unfinished render job");
            tx.send(job.id.clone()).ok();
        }

        let queue = Arc::new(Self {
            records: Mutex::new(records),
            tx,
            journal_path,
            retention: Duration::seconds(retention_secs as i64),
        });
        queue.reset_processing_to_pending();

        tokio::spawn(Self::worker_loop(queue.clone(), ctx, rx));
        Ok(queue)
    }

    /// Add a render request to the queue, returning the job id.
    pub fn enqueue(&self, request: RenderRequest) -> String {
        let job = JobRecord::new(request);
        let id = job.id.clone();
        {
            let mut records = self.records.lock().expect("queue lock poisoned");
            records.insert(id.clone(), job);
            self.persist(&records);
        }
        tracing::debug!(job = %id, "Enqueued render job");
        self.tx.send(id.clone()).ok();
        id
    }

    /// Current record for a job, or `None` for unknown ids. Never fails.
    pub fn job_status(&self, job_id: &str) -> Option<JobRecord> {
        let records = self.records.lock().expect("queue lock poisoned");
        records.get(job_id).cloned()
    }

    /// Drop terminal job records older than the retention window.
    /// Returns how many were reclaimed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.lock().expect("queue lock poisoned");
        let before = records.len();
        let retention = self.retention;
        records.retain(|_, job| match (job.state.is_terminal(), job.finished_at) {
            (true, Some(finished_at)) => now - finished_at < retention,
            _ => true,
        });
        let reclaimed = before - records.len();
        if reclaimed > 0 {
            self.persist(&records);
            tracing::debug!(reclaimed, "Reclaimed expired job records");
        }
        reclaimed
    }

    async fn worker_loop(
        queue: Arc<Self>,
        ctx: Arc<RenderContext>,
        mut rx: mpsc::UnboundedReceiver<String>,
    ) {
        while let Some(job_id) = rx.recv().await {
            let Some(request) = queue.begin(&job_id) else {
                continue;
            };

            let ctx = ctx.clone();
            let run = tokio::task::spawn_blocking(move || match request {
                RenderRequest::Proxy {
                    project_id,
                    version,
                } => ctx.render_proxy(&project_id, version).map(|_| ()),
                RenderRequest::Export {
                    project_id,
                    version,
                    options,
                } => ctx
                    .render_export(&project_id, version, &options)
                    .map(|_| ()),
            })
            .await;

            // One job's failure never blocks the jobs behind it.
            match run {
                Ok(Ok(())) => queue.finish(&job_id, JobState::Completed, None),
                Ok(Err(e)) => {
                    tracing::warn!(job = %job_id, "Render job failed: {e}");
                    queue.finish(&job_id, JobState::Failed, Some(e.to_string()));
                }
                Err(e) => {
                    tracing::error!(job = %job_id, "Render job panicked: {e}");
                    queue.finish(&job_id, JobState::Failed, Some(format!("panic: {e}")));
                }
            }

            queue.sweep_expired(Utc::now());
        }
    }

    /// Transition a job to processing, returning its request.
    fn begin(&self, job_id: &str) -> Option<RenderRequest> {
        let mut records = self.records.lock().expect("queue lock poisoned");
        let job = records.get_mut(job_id)?;
        if job.state.is_terminal() {
            return None;
        }
        job.state = JobState::Processing;
        job.started_at = Some(Utc::now());
        let request = job.request.clone();
        self.persist(&records);
        Some(request)
    }

    fn finish(&self, job_id: &str, state: JobState, error: Option<String>) {
        let mut records = self.records.lock().expect("queue lock poisoned");
        if let Some(job) = records.get_mut(job_id) {
            job.state = state;
            job.error = error;
            job.finished_at = Some(Utc::now());
            self.persist(&records);
        }
    }

    fn reset_processing_to_pending(&self) {
        let mut records = self.records.lock().expect("queue lock poisoned");
        let mut changed = false;
        for job in records.values_mut() {
            if job.state == JobState::Processing {
                job.state = JobState::Pending;
                job.started_at = None;
                changed = true;
            }
        }
        if changed {
            self.persist(&records);
        }
    }

    fn persist(&self, records: &HashMap<String, JobRecord>) {
        match serde_json::to_string_pretty(records) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.journal_path, json) {
                    tracing::error!("Failed to write job journal: {e}");
                }
            }
            Err(e) => tracing::error!("Failed to serialize job journal: {e}"),
        }
    }
}
