// src/storage/mod.rs

//! Result artifact persistence.

pub mod local;

pub use local::LocalStorage;
