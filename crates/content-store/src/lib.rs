//! ClipForge Content Store
//!
//! Content-addressed storage for source videos:
//! - Streaming SHA-256 digests (uploads are multi-gigabyte, never
//!   buffered whole)
//! - Dedup by digest: a repeat upload becomes an alias of the existing
//!   physical file and bumps its reference count
//! - Reference counting that gates physical deletion

pub mod digest;
pub mod store;

pub use digest::compute_digest;
pub use store::VideoStore;
