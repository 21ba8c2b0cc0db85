// src/services/current.rs

//! Source adapter for the current (2023) site layout.
//!
//! Programs are discovered from one index page. Program pages expose course
//! code and name inline, in mandatory tables and in tables following
//! "elective group" headings; rows from other catalog editions embedded on
//! the same page are filtered out by the code prefix. A per-course detail
//! page supplies semester, prerequisites, description and instructor names.

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{
    Course, CourseDetail, CourseType, CurrentConfig, ProgramRef, RawCourseRow, SourceGeneration,
};
use crate::pipeline::batch::{BatchScheduler, SleepFn};
use crate::services::adapter::SourceAdapter;
use crate::services::extract::{SelectorChain, classify_section, element_text, parse_selector};
use crate::services::fetcher::Fetcher;
use crate::utils::text::first_integer;
use crate::utils::{normalize_ws, resolve};

/// Anchor containers tried in order when discovering program links.
const PROGRAM_LINK_SELECTORS: &[&str] = &[
    "div.view-studiski-programi a",
    "div.field-name-field-study-programs a",
    "section.study-programs a",
    "main table td a",
];

// Detail pages put the course header fields at fixed table positions; the
// later candidates cover pages rendered without the header class.
const SEMESTER_SELECTORS: &[&str] = &[
    "table.course-header tr:nth-of-type(4) td:nth-of-type(3)",
    "table tr:nth-of-type(4) td:nth-of-type(3)",
    "table tr:nth-of-type(4) td:last-child",
];
const PROFESSOR_SELECTORS: &[&str] = &[
    "table.course-header tr:nth-of-type(6) td:nth-of-type(2)",
    "table tr:nth-of-type(6) td:nth-of-type(2)",
    "table tr:nth-of-type(6) td:last-child",
];
const PREREQUISITE_SELECTORS: &[&str] = &[
    "table.course-header tr:nth-of-type(7) td:nth-of-type(2)",
    "table tr:nth-of-type(7) td:nth-of-type(2)",
    "table tr:nth-of-type(7) td:last-child",
];
const DESCRIPTION_SELECTORS: &[&str] = &[
    "table.course-content tr:nth-of-type(2) td",
    "table tr:nth-of-type(9) td:last-child",
];

/// Current-format source adapter.
pub struct CurrentAdapter {
    config: CurrentConfig,
    fetcher: Fetcher,
    scheduler: BatchScheduler,
    level_re: Regex,
    professor_re: Regex,
    program_link_sels: Vec<Selector>,
    table_sel: Selector,
    row_sel: Selector,
    cell_sel: Selector,
    anchor_sel: Selector,
    semester_chain: SelectorChain,
    professor_chain: SelectorChain,
    prerequisite_chain: SelectorChain,
    description_chain: SelectorChain,
}

impl CurrentAdapter {
    pub fn new(config: &CurrentConfig, sleep: SleepFn) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(&config.http)?,
            scheduler: BatchScheduler::new(&config.batching, &config.delays, sleep),
            level_re: Self::build_level_re(&config.code_prefix)?,
            professor_re: Self::build_professor_re(
                &config.professors.titles,
                &config.professors.degree,
            )?,
            program_link_sels: PROGRAM_LINK_SELECTORS
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_>>()?,
            table_sel: parse_selector("table")?,
            row_sel: parse_selector("tr")?,
            cell_sel: parse_selector("td")?,
            anchor_sel: parse_selector("a")?,
            semester_chain: SelectorChain::parse(SEMESTER_SELECTORS)?,
            professor_chain: SelectorChain::parse(PROFESSOR_SELECTORS)?,
            prerequisite_chain: SelectorChain::parse(PREREQUISITE_SELECTORS)?,
            description_chain: SelectorChain::parse(DESCRIPTION_SELECTORS)?,
            config: config.clone(),
        })
    }

    /// Codes carry one of three numeric levels right after the generation
    /// prefix, e.g. "F23L2S005" is level 2.
    fn build_level_re(prefix: &str) -> Result<Regex> {
        Ok(Regex::new(&format!(
            "^{}L([123])",
            regex::escape(prefix)
        ))?)
    }

    /// Build the instructor-name recognizer from the configured title tokens.
    ///
    /// Longer titles go first so "assoc. prof." is found at its own start
    /// rather than at the embedded "prof.". Whitespace inside a title is
    /// matched loosely since cell text is flattened before splitting.
    fn build_professor_re(titles: &[String], degree: &str) -> Result<Regex> {
        let mut sorted: Vec<&String> = titles.iter().collect();
        sorted.sort_by_key(|t| std::cmp::Reverse(t.len()));

        let alternation = sorted
            .iter()
            .map(|title| {
                regex::escape(title)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");
        Ok(Regex::new(&format!(
            r"(?:{alternation})(?:\s*{})?",
            regex::escape(degree)
        ))?)
    }

    fn parse_program_links(&self, body: &str) -> Vec<ProgramRef> {
        let document = Html::parse_document(body);
        for selector in &self.program_link_sels {
            let mut programs = Vec::new();
            for anchor in document.select(selector) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                // Skip alternate-language variants of the same program.
                if href.contains("/en/") || href.ends_with("/en") {
                    continue;
                }
                let name = element_text(&anchor);
                if name.is_empty() {
                    continue;
                }
                let url = resolve(&self.config.base_url, href);
                if programs.iter().all(|p: &ProgramRef| p.url != url) {
                    programs.push(ProgramRef { url, name });
                }
            }
            if !programs.is_empty() {
                return programs;
            }
        }
        Vec::new()
    }

    /// Parse a program page into raw rows.
    ///
    /// Mandatory tables are identified by caption, elective tables by the
    /// nearest preceding "elective group" heading; in both cases columns are
    /// fixed (code first, then name).
    fn parse_program_page(&self, body: &str) -> Vec<RawCourseRow> {
        let document = Html::parse_document(body);
        let mut rows = Vec::new();

        for table in document.select(&self.table_sel) {
            let Some(course_type) = classify_section(table, &self.config.markers) else {
                continue;
            };

            for row in table.select(&self.row_sel) {
                if let Some(raw) = self.parse_course_row(&row, course_type) {
                    rows.push(raw);
                }
            }
        }
        rows
    }

    fn parse_course_row(
        &self,
        row: &ElementRef<'_>,
        course_type: CourseType,
    ) -> Option<RawCourseRow> {
        let cells: Vec<_> = row.select(&self.cell_sel).collect();
        if cells.len() < 2 {
            return None;
        }

        let code = element_text(&cells[0]);
        // Stray rows from another catalog edition share the page; only the
        // configured generation prefix is accepted.
        if !code.starts_with(&self.config.code_prefix) {
            return None;
        }

        let anchor = cells[1].select(&self.anchor_sel).next();
        let name = anchor
            .map(|a| element_text(&a))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| element_text(&cells[1]));
        if name.is_empty() {
            return None;
        }

        let link = anchor
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve(&self.config.base_url, href));
        let level = self
            .level_re
            .captures(&code)
            .map(|c| format!("L{}", &c[1]));

        Some(RawCourseRow {
            code,
            name,
            link,
            course_type,
            level,
            generation: SourceGeneration::Current,
        })
    }

    /// Fetch and parse one course detail page.
    ///
    /// `None` means the page was unreachable; extraction misses within a
    /// reachable page just leave the corresponding fields absent.
    pub async fn fetch_course_detail(&self, link: &str) -> Option<CourseDetail> {
        let body = self.fetcher.fetch(link).await?;
        Some(self.parse_detail(&body))
    }

    fn parse_detail(&self, body: &str) -> CourseDetail {
        let document = Html::parse_document(body);
        let root = document.root_element();

        CourseDetail {
            semester: self
                .semester_chain
                .extract_first(root)
                .and_then(|text| first_integer(&text)),
            professors: self
                .professor_chain
                .extract_first(root)
                .and_then(|text| self.split_professors(&text)),
            prerequisites: self
                .prerequisite_chain
                .extract_first_node(root)
                .map(|text| self.canonical_prerequisites(&text)),
            description: self
                .description_chain
                .extract_first(root)
                .filter(|text| text.chars().count() > self.config.min_description_len),
        }
    }

    /// Split a flattened instructor cell at each recognized title token.
    fn split_professors(&self, text: &str) -> Option<Vec<String>> {
        let flat = normalize_ws(text);
        let starts: Vec<usize> = self
            .professor_re
            .find_iter(&flat)
            .map(|m| m.start())
            .collect();
        if starts.is_empty() {
            return None;
        }

        let mut names = Vec::new();
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(flat.len());
            let name = flat[start..end]
                .trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .to_string();
            if !name.is_empty() {
                names.push(normalize_ws(&name));
            }
        }
        if names.is_empty() { None } else { Some(names) }
    }

    /// Map an explicitly empty, dash or native "none" cell to the canonical
    /// "none" literal; any other text is kept verbatim.
    fn canonical_prerequisites(&self, text: &str) -> String {
        let flat = normalize_ws(text);
        let is_none = flat.is_empty()
            || flat == "-"
            || flat == "–"
            || flat.to_lowercase() == self.config.none_literal.to_lowercase();
        if is_none {
            self.config.none_literal.clone()
        } else {
            flat
        }
    }
}

#[async_trait]
impl SourceAdapter for CurrentAdapter {
    fn name(&self) -> &'static str {
        "current"
    }

    async fn list_programs(&self) -> Vec<ProgramRef> {
        match self.fetcher.fetch(&self.config.index_url).await {
            Some(body) => self.parse_program_links(&body),
            None => {
                log::warn!("[current] program index unreachable");
                Vec::new()
            }
        }
    }

    async fn scrape_program(&self, program: &ProgramRef) -> Result<Vec<RawCourseRow>> {
        let body = self
            .fetcher
            .fetch(&program.url)
            .await
            .ok_or_else(|| AppError::scrape(program.name.clone(), "program page unreachable"))?;
        Ok(self.parse_program_page(&body))
    }

    /// Enrichment pass over the merged list: fetch each current-generation
    /// course's detail page through the batch scheduler and copy the
    /// extracted fields on. Always best-effort.
    ///
    /// Only links resolved from current-layout rows are fetched; a record
    /// whose link came from a legacy page has no structured detail table to
    /// read.
    async fn enrich_courses(&self, courses: &mut [Course]) {
        let targets: Vec<(usize, String)> = courses
            .iter()
            .enumerate()
            .filter(|(_, course)| course.link_generation == Some(SourceGeneration::Current))
            .filter_map(|(i, course)| course.link.clone().map(|link| (i, link)))
            .collect();

        let tasks: Vec<_> = targets
            .iter()
            .map(|(_, link)| {
                let link = link.clone();
                async move { self.fetch_course_detail(&link).await }
            })
            .collect();
        let details = self.scheduler.run_all(tasks).await;

        let mut enriched = 0usize;
        for ((index, _), detail) in targets.into_iter().zip(details) {
            if let Some(detail) = detail {
                detail.apply_to(&mut courses[index]);
                enriched += 1;
            }
        }
        log::info!("[current] enriched {enriched} of {} courses", courses.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProfessorConfig, SectionMarkers};
    use crate::pipeline::batch::tokio_sleep;

    fn adapter() -> CurrentAdapter {
        let config = CurrentConfig {
            base_url: "https://example.edu".to_string(),
            index_url: "https://example.edu/programs".to_string(),
            code_prefix: "F23".to_string(),
            min_description_len: 20,
            none_literal: "none".to_string(),
            professors: ProfessorConfig {
                titles: vec![
                    "assoc. prof.".to_string(),
                    "prof.".to_string(),
                    "assist.".to_string(),
                ],
                degree: "dr.".to_string(),
            },
            markers: SectionMarkers {
                mandatory: "mandatory".to_string(),
                elective: "elective".to_string(),
            },
            ..CurrentConfig::default()
        };
        CurrentAdapter::new(&config, tokio_sleep()).unwrap()
    }

    #[test]
    fn test_program_links_skip_english_variants() {
        let body = r#"
            <div class="view-studiski-programi">
              <a href="/mk/program/seis">SEIS</a>
              <a href="/en/program/seis">SEIS (en)</a>
              <a href="/mk/program/ks">KS</a>
              <a href="/mk/program/ks">KS duplicate</a>
            </div>
        "#;
        let programs = adapter().parse_program_links(body);
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].url, "https://example.edu/mk/program/seis");
        assert_eq!(programs[1].name, "KS");
    }

    #[test]
    fn test_program_links_fall_back_to_general_container() {
        let body = r#"
            <main><table><tr>
              <td><a href="/mk/program/pit">PIT</a></td>
            </tr></table></main>
        "#;
        let programs = adapter().parse_program_links(body);
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].name, "PIT");
    }

    #[test]
    fn test_parse_program_page_filters_by_prefix_and_parses_level() {
        let body = r#"
            <table>
              <caption>Mandatory courses, semester 1</caption>
              <tr><th>Code</th><th>Course</th></tr>
              <tr><td>F23L1S001</td><td><a href="/subject/1">Calculus</a></td></tr>
              <tr><td>F18L1S001</td><td><a href="/subject/9">Old Calculus</a></td></tr>
            </table>
            <h3>Elective group L2</h3>
            <table>
              <tr><td>F23L2S044</td><td>Game Development</td></tr>
            </table>
        "#;
        let rows = adapter().parse_program_page(body);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].code, "F23L1S001");
        assert_eq!(rows[0].name, "Calculus");
        assert_eq!(rows[0].link.as_deref(), Some("https://example.edu/subject/1"));
        assert_eq!(rows[0].course_type, CourseType::Mandatory);
        assert_eq!(rows[0].level.as_deref(), Some("L1"));

        assert_eq!(rows[1].code, "F23L2S044");
        assert_eq!(rows[1].course_type, CourseType::Elective);
        assert_eq!(rows[1].level.as_deref(), Some("L2"));
        assert!(rows[1].link.is_none());
    }

    fn detail_page(semester: &str, professors: &str, prerequisites: &str, description: &str) -> String {
        format!(
            r#"
            <table class="course-header">
              <tr><td>Code</td><td>F23L2S044</td><td>x</td></tr>
              <tr><td>Title</td><td>Game Development</td><td>x</td></tr>
              <tr><td>Credits</td><td>6</td><td>x</td></tr>
              <tr><td>Year/Semester</td><td>2</td><td>{semester}</td></tr>
              <tr><td>Hours</td><td>180</td><td>x</td></tr>
              <tr><td>Instructors</td><td>{professors}</td></tr>
              <tr><td>Prerequisites</td><td>{prerequisites}</td></tr>
            </table>
            <table class="course-content">
              <tr><td>Goals</td></tr>
              <tr><td>{description}</td></tr>
            </table>
            "#
        )
    }

    #[test]
    fn test_parse_detail_full() {
        let body = detail_page(
            "Semester: 3 (winter)",
            "prof. dr. Ana Petrova, assoc. prof. dr. Ivan Ivanov assist. Marko M.",
            "Structured Programming",
            "Students learn the full game production pipeline from design to release.",
        );
        let detail = adapter().parse_detail(&body);

        assert_eq!(detail.semester, Some(3));
        assert_eq!(
            detail.professors,
            Some(vec![
                "prof. dr. Ana Petrova".to_string(),
                "assoc. prof. dr. Ivan Ivanov".to_string(),
                "assist. Marko M.".to_string(),
            ])
        );
        assert_eq!(detail.prerequisites.as_deref(), Some("Structured Programming"));
        assert!(detail.description.is_some());
    }

    #[test]
    fn test_parse_detail_none_prerequisites_variants() {
        let adapter = adapter();
        for marker in ["", "-", "none", "NONE"] {
            let body = detail_page("1", "prof. dr. A B", marker, "short");
            let detail = adapter.parse_detail(&body);
            assert_eq!(detail.prerequisites.as_deref(), Some("none"), "marker {marker:?}");
        }
    }

    #[test]
    fn test_parse_detail_short_description_dropped() {
        let body = detail_page("1", "prof. dr. A B", "none", "placeholder");
        assert!(adapter().parse_detail(&body).description.is_none());
    }

    #[test]
    fn test_parse_detail_unstructured_page_is_empty() {
        let detail = adapter().parse_detail("<p>not a course page</p>");
        assert_eq!(detail, CourseDetail::default());
    }

    #[tokio::test]
    async fn test_enrich_skips_courses_with_legacy_links() {
        // Merged from both layouts but the surviving link is a legacy page:
        // no detail fetch is attempted and the record stays untouched.
        let mut courses = vec![Course::from_row(
            RawCourseRow {
                code: "F23L1S001".to_string(),
                name: "Algorithms".to_string(),
                link: Some("https://old.example.edu/subject/101".to_string()),
                course_type: CourseType::Mandatory,
                level: Some("L1".to_string()),
                generation: SourceGeneration::Legacy,
            },
            "CS",
        )];

        adapter().enrich_courses(&mut courses).await;

        assert!(courses[0].semester.is_none());
        assert!(courses[0].professors.is_none());
        assert!(courses[0].prerequisites.is_none());
        assert!(courses[0].description.is_none());
    }

    #[test]
    fn test_split_professors_requires_recognized_title() {
        let adapter = adapter();
        assert_eq!(adapter.split_professors("Ana Petrova, Ivan Ivanov"), None);
        assert_eq!(
            adapter.split_professors("  prof.\n dr.   Ana   Petrova "),
            Some(vec!["prof. dr. Ana Petrova".to_string()])
        );
    }
}
