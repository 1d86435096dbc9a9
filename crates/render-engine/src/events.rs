//! Render progress events.
//!
//! The sink is passed into the render context explicitly rather than
//! living in a process-global broadcaster, so consumers can be wired
//! per-context and progress reporting is observable in tests.

/// Stages a render moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Rendering,
    Completed,
    Failed,
}

/// A progress notification from a render worker.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEvent {
    pub project_id: String,
    pub version: u64,
    pub stage: RenderStage,
    /// Stage detail: artifact key on completion, error text on failure.
    pub message: Option<String>,
}

/// Consumer of render progress events.
pub trait RenderEventSink: Send + Sync {
    fn emit(&self, event: RenderEvent);
}

/// Sink that discards every event.
pub struct NullSink;

impl RenderEventSink for NullSink {
    fn emit(&self, _event: RenderEvent) {}
}

/// Sink that forwards events to tracing at info level.
pub struct TracingSink;

impl RenderEventSink for TracingSink {
    fn emit(&self, event: RenderEvent) {
        tracing::info!(
            project = %event.project_id,
            version = event.version,
            stage = ?event.stage,
            message = event.message.as_deref().unwrap_or(""),
            "Render progress"
        );
    }
}
