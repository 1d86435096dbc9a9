//! ClipForge Edit Log
//!
//! Append-only, per-project, monotonically versioned log of edit
//! operation batches, plus the project records that carry the
//! current-version pointer.
//!
//! The log is the authoritative record of a project's edit history:
//! render workers replay it to reconstruct state, and the project's
//! `latest_*_key` pointers are only caches derived from it. Batches are
//! stored one JSON object per line (`oplog/{projectId}.jsonl`) so that a
//! crash mid-write can lose at most the final line.

pub mod log;

pub use log::EditLog;
