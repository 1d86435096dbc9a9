pub mod append;
pub mod export;
pub mod exports;
pub mod gc;
pub mod ingest;
pub mod ops;
pub mod pin;
pub mod project;
pub mod status;
