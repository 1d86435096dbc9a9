//! ClipForge Render Engine
//!
//! Materializes edit logs into derived artifacts:
//!
//! ```text
//! oplog/{project}.jsonl ──► fold ──► RenderPlan ──┐
//!                                                 ├── MediaBackend (ffmpeg)
//! sources/{digest}.mp4 ───────────────────────────┘         │
//!                                                           ▼
//!                                     proxy/{project}/v{n}_proxy.mp4
//!                                     export/{project}/v{n}_final.{fmt}
//! ```
//!
//! Both render entry points are idempotent: the proxy worker keys on
//! the artifact path, the export worker on the export catalog, and a
//! repeat request for the same `(project, version)` is a cache hit that
//! performs no transcode work.

pub mod backend;
pub mod events;
pub mod plan;
pub mod worker;

pub use backend::{FfmpegBackend, MediaBackend, MediaInfo};
pub use events::{NullSink, RenderEvent, RenderEventSink, RenderStage};
pub use plan::{fold_operations, RenderPlan};
pub use worker::{RenderContext, RenderedArtifact};
