// src/services/extract.rs

//! Selector-based field extraction.
//!
//! The legacy site's markup is inconsistent across pages (class names vary),
//! so single selectors are brittle. [`SelectorChain`] tries an ordered list
//! of candidates, most specific first, and takes the first one that matches
//! a node with non-empty text.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{CourseType, SectionMarkers};
use crate::utils::normalize_ws;

/// An ordered fallback chain of CSS selectors.
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    /// Parse a list of selector strings, preserving order.
    pub fn parse<S: AsRef<str>>(sources: &[S]) -> Result<Self> {
        let selectors = sources
            .iter()
            .map(|s| parse_selector(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// Return the first non-empty trimmed text matched by the chain.
    ///
    /// A selector that matches a node whose text is empty does not win; the
    /// chain keeps going.
    pub fn extract_first(&self, root: ElementRef<'_>) -> Option<String> {
        for selector in &self.selectors {
            for element in root.select(selector) {
                let text = element_text(&element);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Convenience wrapper over a whole document.
    pub fn extract_first_in(&self, document: &Html) -> Option<String> {
        self.extract_first(document.root_element())
    }

    /// Return the text of the first matched node, even when it is empty.
    ///
    /// Used where an explicitly empty cell carries meaning (e.g. a
    /// prerequisites cell stating nothing means "none").
    pub fn extract_first_node(&self, root: ElementRef<'_>) -> Option<String> {
        for selector in &self.selectors {
            if let Some(element) = root.select(selector).next() {
                return Some(element_text(&element));
            }
        }
        None
    }
}

/// Parse one CSS selector.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Collect and whitespace-normalize an element's text content.
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// Classify a table as a mandatory or elective section.
///
/// Looks at the table's `<caption>` first, then at the nearest preceding
/// sibling heading. Matching is case-insensitive substring containment of
/// the configured marker literals.
pub fn classify_section(table: ElementRef<'_>, markers: &SectionMarkers) -> Option<CourseType> {
    let caption_sel = Selector::parse("caption").ok()?;
    let label = table
        .select(&caption_sel)
        .next()
        .map(|caption| element_text(&caption))
        .filter(|text| !text.is_empty())
        .or_else(|| preceding_heading(table))?;

    classify_label(&label, markers)
}

/// Classify a free-text section label against the markers.
pub fn classify_label(label: &str, markers: &SectionMarkers) -> Option<CourseType> {
    let lower = label.to_lowercase();
    if lower.contains(&markers.mandatory.to_lowercase()) {
        Some(CourseType::Mandatory)
    } else if lower.contains(&markers.elective.to_lowercase()) {
        Some(CourseType::Elective)
    } else {
        None
    }
}

/// Find the text of the nearest heading preceding an element.
fn preceding_heading(element: ElementRef<'_>) -> Option<String> {
    for sibling in element.prev_siblings() {
        if let Some(elem) = ElementRef::wrap(sibling) {
            if matches!(
                elem.value().name(),
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
            ) {
                let text = element_text(&elem);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> SectionMarkers {
        SectionMarkers {
            mandatory: "mandatory".to_string(),
            elective: "elective".to_string(),
        }
    }

    #[test]
    fn test_fallback_returns_first_matching_selector() {
        // Only the 3rd of 5 candidates matches: its text must win.
        let chain = SelectorChain::parse(&[
            "span.exact-code",
            "div.code-box",
            "td.code",
            "span.generic",
            "td",
        ])
        .unwrap();
        let document = Html::parse_document(
            "<table><tr><td class=\"code\">F23L101</td><td>Algorithms</td></tr></table>",
        );
        assert_eq!(
            chain.extract_first_in(&document),
            Some("F23L101".to_string())
        );
    }

    #[test]
    fn test_empty_text_does_not_win() {
        let chain = SelectorChain::parse(&["td.code", "td.name"]).unwrap();
        let document = Html::parse_document(
            "<table><tr><td class=\"code\">  </td><td class=\"name\">Databases</td></tr></table>",
        );
        assert_eq!(
            chain.extract_first_in(&document),
            Some("Databases".to_string())
        );
    }

    #[test]
    fn test_no_match_is_absent() {
        let chain = SelectorChain::parse(&["td.code"]).unwrap();
        let document = Html::parse_document("<p>nothing here</p>");
        assert_eq!(chain.extract_first_in(&document), None);
    }

    #[test]
    fn test_invalid_selector_is_error() {
        assert!(SelectorChain::parse(&["[[nope"]).is_err());
    }

    #[test]
    fn test_classify_by_caption() {
        let document = Html::parse_document(
            "<table><caption>Mandatory courses</caption><tr><td>x</td></tr></table>",
        );
        let table_sel = Selector::parse("table").unwrap();
        let table = document.select(&table_sel).next().unwrap();
        assert_eq!(
            classify_section(table, &markers()),
            Some(CourseType::Mandatory)
        );
    }

    #[test]
    fn test_classify_by_preceding_heading() {
        let document = Html::parse_document(
            "<div><h3>Elective group 2</h3><table><tr><td>x</td></tr></table></div>",
        );
        let table_sel = Selector::parse("table").unwrap();
        let table = document.select(&table_sel).next().unwrap();
        assert_eq!(
            classify_section(table, &markers()),
            Some(CourseType::Elective)
        );
    }

    #[test]
    fn test_classify_unknown_label() {
        assert_eq!(classify_label("Timetable", &markers()), None);
    }
}
