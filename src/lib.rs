// src/lib.rs

//! Katalog: university course catalog aggregator.
//!
//! Crawls two structurally different generations of a university's public
//! pages, extracts per-program course listings and merges them into one
//! deduplicated catalog keyed by normalized course name.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
