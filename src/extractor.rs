//! Verification-code extraction from message bodies.
//!
//! # Example
//!
//! ```
//! use mailcode::extractor::CodeExtractor;
//!
//! let extractor = CodeExtractor::new();
//! assert_eq!(extractor.extract("Your code is 123456."), Some("123456"));
//! assert_eq!(extractor.extract("no codes here"), None);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// A maximal run of exactly six digits, bounded by word boundaries.
///
/// The boundaries make 5-digit runs, 7-digit runs, and digits embedded in
/// longer alphanumeric tokens non-matches.
static SIX_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{6}\b").expect("valid regex"));

/// Extracts the first 6-digit verification code from free text.
///
/// Pure; no side effects. The first match wins, even when the text contains
/// several candidate runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeExtractor;

impl CodeExtractor {
    /// Creates a new extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns the first 6-digit token in `text`, or `None`.
    #[must_use]
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        SIX_DIGIT.find(text).map(|m| m.as_str())
    }
}
