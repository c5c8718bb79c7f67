//! Reporting utilities: console summaries of ingestion and training.

pub mod format;

pub use format::*;
