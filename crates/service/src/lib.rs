//! ClipForge Service
//!
//! The transport-agnostic operation surface of the pipeline. An HTTP
//! layer, a CLI, or an embedding application calls these operations;
//! every failure comes back as a [`ForgeError`] suitable for a
//! structured response, and nothing here panics on bad input.
//!
//! Control flow through the subsystem:
//! append batch -> log gains a version -> proxy render enqueued ->
//! worker replays the log -> artifact written -> pointer updated.
//! Export renders are requested on demand for a specific version and
//! checked against the export catalog first.

pub mod outcome;
pub mod service;

pub use outcome::{AppendOutcome, ExportRequestOutcome, IngestOutcome};
pub use service::ClipForge;

pub use clipforge_gc::{ArchiveReport, CalcReport, DeleteReport, GcCandidate};
