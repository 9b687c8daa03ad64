#![forbid(unsafe_code)]

//! Core data layer for the doselog health-metrics journal.
//!
//! This crate provides:
//! - Domain types (entries, partial changes, selectors)
//! - The entry store (CSV persistence, cached snapshot, write-through CRUD)
//! - Derived statistics (baseline change, weekly change, averages)
//! - Validation, configuration and logging setup

pub mod types;
pub mod error;
pub mod collection;
pub mod validation;
pub mod codec;
pub mod store;
pub mod stats;
pub mod titration;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use collection::EntryCollection;
pub use validation::Limits;
pub use codec::{export_csv, export_json, LoadReport};
pub use store::EntryStore;
pub use stats::{derive_stats, Stats, WeeklyChangePolicy};
pub use config::Config;
