//! Result of a verification-code retrieval attempt.
//!
//! Internally the outcome is a tagged enum so callers can tell "no code" apart
//! from a real code. The HTTP wire contract predates this crate and uses a
//! fixed placeholder instead; see [`SENTINEL_CODE`].

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Placeholder returned on the wire when no code could be retrieved.
///
/// This value is shaped exactly like a real 6-digit code, so callers relying
/// only on shape cannot distinguish the two. Kept for compatibility with
/// existing consumers of the `{"code": ...}` responses.
pub const SENTINEL_CODE: &str = "111111";

/// Outcome of one retrieval sequence.
///
/// Exactly one of these is observable per request: a real 6-digit code, or
/// [`NotFound`](CodeOutcome::NotFound). Upstream errors never surface as a
/// distinct outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeOutcome {
    /// A 6-digit code was extracted from a message body.
    Found(String),
    /// Authentication failed, attempts were exhausted, or a transport error
    /// occurred. Serializes as [`SENTINEL_CODE`].
    NotFound,
}

impl CodeOutcome {
    /// Returns the code to put on the wire, substituting the sentinel.
    #[must_use]
    pub fn wire_code(&self) -> &str {
        match self {
            CodeOutcome::Found(code) => code,
            CodeOutcome::NotFound => SENTINEL_CODE,
        }
    }

    /// Returns `true` if a real code was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, CodeOutcome::Found(_))
    }
}

impl From<Option<String>> for CodeOutcome {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(code) => CodeOutcome::Found(code),
            None => CodeOutcome::NotFound,
        }
    }
}

impl Serialize for CodeOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("CodeOutcome", 1)?;
        state.serialize_field("code", self.wire_code())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_keeps_code() {
        let outcome = CodeOutcome::Found("482913".into());
        assert!(outcome.is_found());
        assert_eq!(outcome.wire_code(), "482913");
    }

    #[test]
    fn test_not_found_maps_to_sentinel() {
        let outcome = CodeOutcome::NotFound;
        assert!(!outcome.is_found());
        assert_eq!(outcome.wire_code(), SENTINEL_CODE);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_string(&CodeOutcome::Found("482913".into())).unwrap();
        assert_eq!(json, r#"{"code":"482913"}"#);

        let json = serde_json::to_string(&CodeOutcome::NotFound).unwrap();
        assert_eq!(json, r#"{"code":"111111"}"#);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(
            CodeOutcome::from(Some("123456".to_string())),
            CodeOutcome::Found("123456".into())
        );
        assert_eq!(CodeOutcome::from(None), CodeOutcome::NotFound);
    }

    #[test]
    fn test_sentinel_is_code_shaped() {
        // The ambiguity is intentional wire behavior; lock it in.
        assert_eq!(SENTINEL_CODE.len(), 6);
        assert!(SENTINEL_CODE.chars().all(|c| c.is_ascii_digit()));
    }
}
