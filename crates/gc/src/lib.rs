//! ClipForge GC Service
//!
//! Storage reclamation for old export artifacts in three explicit,
//! separately invokable phases, so an operator can review candidates
//! before anything is moved or destroyed:
//!
//! 1. mark — compute GC candidates; touches catalog flags only
//! 2. archive — relocate candidate files under `archive/`; reversible
//! 3. delete — destroy archived files and records; gated on an
//!    explicit confirmation flag
//!
//! Pinned exports are refused at every phase. A fourth read-only
//! operation reports source videos with no remaining owners; deleting
//! those is a deliberate manual follow-up, never automatic.

pub mod report;
pub mod service;

pub use report::{ArchiveReport, CalcReport, DeleteReport, GcCandidate, ItemError};
pub use service::GcService;
