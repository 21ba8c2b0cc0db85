// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Legacy (2018 layout) source settings
    #[serde(default)]
    pub legacy: LegacyConfig,

    /// Current (2023 layout) source settings
    #[serde(default)]
    pub current: CurrentConfig,

    /// Result artifact paths
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A load failure is fatal: there is no valid operating mode without
    /// configuration, so no default fallback is attempted here.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::config(format!(
                "Cannot read config file {:?}: {e}",
                path.as_ref()
            ))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if !self.legacy.enabled && !self.current.enabled {
            return Err(AppError::validation("No source generation enabled"));
        }
        if self.legacy.enabled {
            self.legacy.validate()?;
        }
        if self.current.enabled {
            self.current.validate()?;
        }
        if self.output.results_path.trim().is_empty() {
            return Err(AppError::validation("output.results_path is empty"));
        }
        if self.output.summary_path.trim().is_empty() {
            return Err(AppError::validation("output.summary_path is empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            legacy: LegacyConfig::default(),
            current: CurrentConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Legacy-generation source settings.
///
/// Program pages for this layout are enumerated statically; the two lists
/// are parallel (url[i] belongs to name[i]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Site origin used to absolutize relative links
    #[serde(default = "defaults::legacy_base_url")]
    pub base_url: String,

    /// Program page URLs, parallel to `program_names`
    #[serde(default)]
    pub program_urls: Vec<String>,

    /// Program display names, parallel to `program_urls`
    #[serde(default)]
    pub program_names: Vec<String>,

    /// Ordered selector fallback chain for the course code on detail pages.
    /// Class names vary across legacy pages, so the chain goes from most
    /// specific to most general.
    #[serde(default = "defaults::legacy_code_selectors")]
    pub code_selectors: Vec<String>,

    #[serde(default)]
    pub markers: SectionMarkers,

    #[serde(default)]
    pub delays: DelayConfig,

    #[serde(default)]
    pub batching: BatchingConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

impl LegacyConfig {
    fn validate(&self) -> Result<()> {
        if self.program_urls.is_empty() {
            return Err(AppError::validation("legacy.program_urls is empty"));
        }
        if self.program_urls.len() != self.program_names.len() {
            return Err(AppError::validation(
                "legacy.program_urls and legacy.program_names must have equal length",
            ));
        }
        if self.code_selectors.is_empty() {
            return Err(AppError::validation("legacy.code_selectors is empty"));
        }
        Url::parse(&self.base_url)?;
        for url in &self.program_urls {
            Url::parse(url)?;
        }
        self.http.validate("legacy")?;
        self.batching.validate("legacy")
    }
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            base_url: defaults::legacy_base_url(),
            program_urls: Vec::new(),
            program_names: Vec::new(),
            code_selectors: defaults::legacy_code_selectors(),
            markers: SectionMarkers::default(),
            delays: DelayConfig::default(),
            batching: BatchingConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Current-generation source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Site origin used to absolutize relative links
    #[serde(default = "defaults::current_base_url")]
    pub base_url: String,

    /// Index page listing all study programs
    #[serde(default = "defaults::current_index_url")]
    pub index_url: String,

    /// Course codes must start with this prefix to be accepted; rows from
    /// other catalog editions embedded on the same page are dropped.
    #[serde(default = "defaults::code_prefix")]
    pub code_prefix: String,

    /// Minimum description length; shorter cells are treated as placeholders
    #[serde(default = "defaults::min_description_len")]
    pub min_description_len: usize,

    /// Canonical literal stored when a course has no prerequisites
    #[serde(default = "defaults::none_literal")]
    pub none_literal: String,

    #[serde(default)]
    pub professors: ProfessorConfig,

    #[serde(default)]
    pub markers: SectionMarkers,

    #[serde(default)]
    pub delays: DelayConfig,

    #[serde(default)]
    pub batching: BatchingConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

impl CurrentConfig {
    fn validate(&self) -> Result<()> {
        if self.index_url.trim().is_empty() {
            return Err(AppError::validation("current.index_url is empty"));
        }
        if self.code_prefix.trim().is_empty() {
            return Err(AppError::validation("current.code_prefix is empty"));
        }
        if self.professors.titles.is_empty() {
            return Err(AppError::validation("current.professors.titles is empty"));
        }
        Url::parse(&self.base_url)?;
        Url::parse(&self.index_url)?;
        self.http.validate("current")?;
        self.batching.validate("current")
    }
}

impl Default for CurrentConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            base_url: defaults::current_base_url(),
            index_url: defaults::current_index_url(),
            code_prefix: defaults::code_prefix(),
            min_description_len: defaults::min_description_len(),
            none_literal: defaults::none_literal(),
            professors: ProfessorConfig::default(),
            markers: SectionMarkers::default(),
            delays: DelayConfig::default(),
            batching: BatchingConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Academic-title tokens used to split an instructor cell into names.
///
/// The catalog lists instructors in its native script; the recognizer is
/// configured rather than hardcoded so synthetic fixtures can test it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessorConfig {
    /// Title tokens, e.g. "проф.", "вон. проф.", "доц."
    #[serde(default = "defaults::professor_titles")]
    pub titles: Vec<String>,

    /// Degree marker following a title, e.g. "д-р"
    #[serde(default = "defaults::degree_marker")]
    pub degree: String,
}

impl Default for ProfessorConfig {
    fn default() -> Self {
        Self {
            titles: defaults::professor_titles(),
            degree: defaults::degree_marker(),
        }
    }
}

/// Literal markers identifying mandatory/elective sections in captions and
/// headings. Matching is case-insensitive substring containment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionMarkers {
    #[serde(default = "defaults::mandatory_marker")]
    pub mandatory: String,

    #[serde(default = "defaults::elective_marker")]
    pub elective: String,
}

impl Default for SectionMarkers {
    fn default() -> Self {
        Self {
            mandatory: defaults::mandatory_marker(),
            elective: defaults::elective_marker(),
        }
    }
}

/// Fixed inter-request delays acting as the crawl rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Delay after each sequential detail fetch, in milliseconds
    #[serde(default = "defaults::between_subjects_ms")]
    pub between_subjects_ms: u64,

    /// Delay between program pages, in milliseconds
    #[serde(default = "defaults::between_programs_ms")]
    pub between_programs_ms: u64,

    /// Delay between detail-fetch batches, in milliseconds
    #[serde(default = "defaults::between_batches_ms")]
    pub between_batches_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            between_subjects_ms: defaults::between_subjects_ms(),
            between_programs_ms: defaults::between_programs_ms(),
            between_batches_ms: defaults::between_batches_ms(),
        }
    }
}

/// Batched detail-fetch settings; batch size is the concurrency width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchingConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,
}

impl BatchingConfig {
    fn validate(&self, source: &str) -> Result<()> {
        if self.enabled && self.batch_size == 0 {
            return Err(AppError::validation(format!(
                "{source}.batching.batch_size must be > 0"
            )));
        }
        Ok(())
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            batch_size: defaults::batch_size(),
        }
    }
}

/// HTTP client settings for one source generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum redirects followed per request
    #[serde(default = "defaults::max_redirects")]
    pub max_redirects: usize,
}

impl HttpConfig {
    fn validate(&self, source: &str) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(AppError::validation(format!(
                "{source}.http.user_agent is empty"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::validation(format!(
                "{source}.http.timeout_secs must be > 0"
            )));
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_redirects: defaults::max_redirects(),
        }
    }
}

/// Result artifact paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Merged course list
    #[serde(default = "defaults::results_path")]
    pub results_path: String,

    /// Run summary with derived counts
    #[serde(default = "defaults::summary_path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: defaults::results_path(),
            summary_path: defaults::summary_path(),
        }
    }
}

mod defaults {
    pub fn enabled() -> bool {
        true
    }

    // HTTP defaults, headers chosen to look like a standard browser
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_redirects() -> usize {
        5
    }

    // Delay defaults
    pub fn between_subjects_ms() -> u64 {
        250
    }
    pub fn between_programs_ms() -> u64 {
        1000
    }
    pub fn between_batches_ms() -> u64 {
        1500
    }

    // Batching defaults
    pub fn batch_size() -> usize {
        10
    }

    // Legacy source defaults
    pub fn legacy_base_url() -> String {
        "https://www.finki.ukim.mk".into()
    }
    pub fn legacy_code_selectors() -> Vec<String> {
        vec![
            "div.field-name-field-subject-code .field-item".into(),
            "div.field-subject-code .field-item".into(),
            "div.field-name-field-code .field-item".into(),
            "span.course-code".into(),
            "table tr:nth-of-type(1) td:nth-of-type(2)".into(),
        ]
    }

    // Current source defaults
    pub fn current_base_url() -> String {
        "https://finki.ukim.mk".into()
    }
    pub fn current_index_url() -> String {
        "https://finki.ukim.mk/mk/dodiplomski-studii".into()
    }
    pub fn code_prefix() -> String {
        "F23".into()
    }
    pub fn min_description_len() -> usize {
        40
    }
    pub fn none_literal() -> String {
        "нема".into()
    }

    // Professor recognizer defaults (native-script academic titles)
    pub fn professor_titles() -> Vec<String> {
        vec![
            "ред. проф.".into(),
            "вон. проф.".into(),
            "проф.".into(),
            "доц.".into(),
            "асс.".into(),
        ]
    }
    pub fn degree_marker() -> String {
        "д-р".into()
    }

    // Section markers (native-script caption/heading literals)
    pub fn mandatory_marker() -> String {
        "задолжителни".into()
    }
    pub fn elective_marker() -> String {
        "изборни".into()
    }

    // Output defaults
    pub fn results_path() -> String {
        "output/results.json".into()
    }
    pub fn summary_path() -> String {
        "output/summary.json".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_programs() -> Config {
        let mut config = Config::default();
        config.legacy.program_urls = vec!["https://example.edu/cs".into()];
        config.legacy.program_names = vec!["CS".into()];
        config
    }

    #[test]
    fn validate_ok_with_programs() {
        assert!(config_with_programs().validate().is_ok());
    }

    #[test]
    fn validate_rejects_all_sources_disabled() {
        let mut config = config_with_programs();
        config.legacy.enabled = false;
        config.current.enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_mismatched_program_lists() {
        let mut config = config_with_programs();
        config.legacy.program_names.push("extra".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let mut config = config_with_programs();
        config.current.batching.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unparseable_program_url() {
        let mut config = config_with_programs();
        config.legacy.program_urls = vec!["not a url".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_skips_disabled_source() {
        let mut config = Config::default();
        config.legacy.enabled = false;
        // current has no static program list requirement
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [legacy]
            enabled = false

            [current]
            index_url = "https://example.edu/programs"
            code_prefix = "X9"
            "#,
        )
        .unwrap();
        assert!(!config.legacy.enabled);
        assert_eq!(config.current.code_prefix, "X9");
        assert_eq!(config.current.batching.batch_size, 10);
    }
}
