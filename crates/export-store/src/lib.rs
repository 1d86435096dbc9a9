//! ClipForge Export Store
//!
//! Catalog of materialized export artifacts. Each record tracks
//! user-controlled pin state and system-controlled GC-candidate state;
//! the store enforces their mutual exclusion on every transition, not
//! by convention at call sites.

pub mod store;

pub use store::ExportStore;
