//! `student-score` library crate.
//!
//! The binary (`score`) is a thin wrapper around this library so that:
//!
//! - the training pipeline and the web handlers are testable without
//!   spawning processes
//! - training and serving share one definition of the artifacts

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logger;
pub mod math;
pub mod models;
pub mod predict;
pub mod report;
pub mod transform;
pub mod web;
