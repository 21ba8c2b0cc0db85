// src/services/mod.rs

//! Scraping services: the HTTP fetcher, selector-based extraction and the
//! two per-generation source adapters.

pub mod adapter;
pub mod current;
pub mod extract;
pub mod fetcher;
pub mod legacy;

pub use adapter::SourceAdapter;
pub use current::CurrentAdapter;
pub use extract::SelectorChain;
pub use fetcher::Fetcher;
pub use legacy::LegacyAdapter;
