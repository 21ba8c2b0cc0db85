// src/utils/text.rs

//! Text normalization utilities.

/// Collapse all whitespace runs to single spaces and trim.
///
/// This is the canonical normalization applied to course names and study
/// program names before they are used as merge keys.
///
/// # Examples
/// ```
/// use katalog::utils::text::normalize_ws;
///
/// assert_eq!(normalize_ws("  Algorithms \n and\t Data Structures "), "Algorithms and Data Structures");
/// ```
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the first integer from a string, if any.
pub fn first_integer(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
