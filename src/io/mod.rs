//! Input/output: dataset ingestion, artifact persistence, report export.

pub mod export;
pub mod ingest;
pub mod persist;

pub use export::*;
pub use ingest::*;
pub use persist::*;
