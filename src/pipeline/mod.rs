// src/pipeline/mod.rs

//! Aggregation pipeline.
//!
//! - `batch`: fixed-size concurrent groups with configured delays
//! - `merge`: name-keyed course dedup map
//! - `aggregate`: the per-source program loop and the top-level run

pub mod aggregate;
pub mod batch;
pub mod merge;

pub use aggregate::{SourceOutcome, aggregate_source, run};
pub use batch::{BatchScheduler, SleepFn, tokio_sleep};
pub use merge::CourseMap;
