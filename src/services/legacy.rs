// src/services/legacy.rs

//! Source adapter for the legacy (2018) site layout.
//!
//! Program pages are enumerated statically from configuration. A program
//! page groups its courses into tables whose captions classify the section
//! as mandatory or elective; each data row's first-column anchor carries the
//! course name and detail link. The legacy pages do not expose the course
//! code inline, so every row needs a follow-up fetch of its detail page,
//! which runs through the batch scheduler.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{CourseType, LegacyConfig, ProgramRef, RawCourseRow, SourceGeneration};
use crate::pipeline::batch::{BatchScheduler, SleepFn};
use crate::services::adapter::SourceAdapter;
use crate::services::extract::{SelectorChain, classify_section, element_text, parse_selector};
use crate::services::fetcher::Fetcher;
use crate::utils::resolve;

/// A parsed row awaiting its course code.
#[derive(Debug)]
struct PendingRow {
    name: String,
    link: String,
    course_type: CourseType,
}

/// Legacy-format source adapter.
pub struct LegacyAdapter {
    config: LegacyConfig,
    fetcher: Fetcher,
    scheduler: BatchScheduler,
    code_chain: SelectorChain,
    table_sel: Selector,
    row_sel: Selector,
    anchor_sel: Selector,
}

impl LegacyAdapter {
    pub fn new(config: &LegacyConfig, sleep: SleepFn) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(&config.http)?,
            scheduler: BatchScheduler::new(&config.batching, &config.delays, sleep),
            code_chain: SelectorChain::parse(&config.code_selectors)?,
            table_sel: parse_selector("table")?,
            row_sel: parse_selector("tr")?,
            anchor_sel: parse_selector("td a")?,
            config: config.clone(),
        })
    }

    /// Parse a program page body into rows still missing their codes.
    ///
    /// Rows without a usable first-column anchor are dropped; scraped data
    /// is expected to contain such noise.
    fn parse_rows(&self, body: &str) -> Vec<PendingRow> {
        let document = Html::parse_document(body);
        let mut rows = Vec::new();

        for table in document.select(&self.table_sel) {
            let Some(course_type) = classify_section(table, &self.config.markers) else {
                continue;
            };

            for row in table.select(&self.row_sel) {
                if let Some(pending) = self.parse_row(&row, course_type) {
                    rows.push(pending);
                }
            }
        }
        rows
    }

    fn parse_row(&self, row: &ElementRef<'_>, course_type: CourseType) -> Option<PendingRow> {
        let anchor = row.select(&self.anchor_sel).next()?;
        let name = element_text(&anchor);
        let href = anchor.value().attr("href")?;
        if name.is_empty() || href.is_empty() {
            return None;
        }

        Some(PendingRow {
            name,
            link: resolve(&self.config.base_url, href),
            course_type,
        })
    }

    /// Resolve the course code from a detail page body.
    fn extract_code(&self, body: &str) -> Option<String> {
        let document = Html::parse_document(body);
        self.code_chain.extract_first_in(&document)
    }
}

#[async_trait]
impl SourceAdapter for LegacyAdapter {
    fn name(&self) -> &'static str {
        "legacy"
    }

    async fn list_programs(&self) -> Vec<ProgramRef> {
        self.config
            .program_urls
            .iter()
            .zip(self.config.program_names.iter())
            .map(|(url, name)| ProgramRef {
                url: url.clone(),
                name: name.clone(),
            })
            .collect()
    }

    async fn scrape_program(&self, program: &ProgramRef) -> Result<Vec<RawCourseRow>> {
        let body = self
            .fetcher
            .fetch(&program.url)
            .await
            .ok_or_else(|| AppError::scrape(program.name.clone(), "program page unreachable"))?;

        let pending = self.parse_rows(&body);
        log::debug!(
            "[legacy] {}: {} rows, resolving codes",
            program.name,
            pending.len()
        );

        // One list page yields N rows, each needing its own follow-up fetch.
        let tasks: Vec<_> = pending
            .iter()
            .map(|row| {
                let link = row.link.clone();
                async move {
                    let body = self.fetcher.fetch(&link).await?;
                    self.extract_code(&body)
                }
            })
            .collect();
        let codes = self.scheduler.run_all(tasks).await;

        // Rows whose code never resolved are dropped, not reported.
        let rows: Vec<_> = pending
            .into_iter()
            .zip(codes)
            .filter_map(|(row, code)| {
                code.map(|code| RawCourseRow {
                    code,
                    name: row.name,
                    link: Some(row.link),
                    course_type: row.course_type,
                    level: None,
                    generation: SourceGeneration::Legacy,
                })
            })
            .collect();
        Ok(rows)
    }
}
