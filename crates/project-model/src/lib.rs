//! ClipForge Project Model
//!
//! Core data model shared by the edit log, render pipeline, and GC
//! subsystems:
//! - Project records with the current-version pointer
//! - Append-only edit operation batches
//! - Export version catalog entries with pin/GC state
//! - Content-addressed source video records
//! - The artifact key scheme for proxy/export/archive paths

pub mod export_version;
pub mod operation;
pub mod project;
pub mod video;

pub use export_version::*;
pub use operation::*;
pub use project::*;
pub use video::*;
