//! Batch front end for the grid extraction engine.
//!
//! Scans a directory for NetCDF files, extracts each one under both
//! inclusion policies, writes `<stem>_all.json` / `<stem>_filtered.json`
//! (optionally `<stem>_filtered.png`) and summarizes the results.

pub mod batch;
pub mod config;
pub mod scan;
pub mod summary;
pub mod writer;

pub use batch::{BatchReport, BatchRunner, FileOutcome};
pub use config::NcPointsConfig;
pub use summary::{filter_ratio, inspect, InspectReport};
