//! Tabular data: CSV tables, seeded splits, and the synthetic dataset.

pub mod split;
pub mod synthetic;
pub mod table;

pub use split::*;
pub use synthetic::*;
pub use table::*;
