// src/utils/mod.rs

//! Shared helpers.

pub mod text;
pub mod url;

pub use text::normalize_ws;
pub use url::resolve;
