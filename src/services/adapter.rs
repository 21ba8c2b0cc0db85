// src/services/adapter.rs

//! Common capability interface over the two source generations.
//!
//! The pipeline is generic over this trait; the closed set of implementors
//! is [`LegacyAdapter`](crate::services::LegacyAdapter) and
//! [`CurrentAdapter`](crate::services::CurrentAdapter).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Course, ProgramRef, RawCourseRow};

/// One source generation's scraping capabilities.
#[async_trait]
pub trait SourceAdapter {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Enumerate the study program pages for this generation.
    ///
    /// Enumeration failures degrade to an empty list; a generation without
    /// reachable programs simply contributes nothing.
    async fn list_programs(&self) -> Vec<ProgramRef>;

    /// Parse one program's page into raw course rows.
    ///
    /// An unreachable or unparsable program page is an error at this level;
    /// the pipeline recovers it per program and moves on. Individual rows
    /// that cannot be resolved are dropped silently inside the adapter.
    async fn scrape_program(&self, program: &ProgramRef) -> Result<Vec<RawCourseRow>>;

    /// Best-effort per-course detail enrichment over the merged list.
    ///
    /// Default is a no-op; only the current format has detail pages.
    async fn enrich_courses(&self, _courses: &mut [Course]) {}
}
