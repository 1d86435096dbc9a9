//! ClipForge Render Queue
//!
//! Ordered queue of render requests drained by a single in-process
//! worker loop. One render job is in flight at a time, process-wide:
//! render work saturates the host, so queueing bounds resource usage
//! where parallelism would not.
//!
//! Job records are journaled to `queue/jobs.json` on every transition;
//! a recovery pass on startup re-enqueues anything the previous process
//! left pending or processing.

pub mod job;
pub mod queue;

pub use job::{JobRecord, JobState, RenderRequest};
pub use queue::RenderQueue;
