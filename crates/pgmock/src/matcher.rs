//! Satisfies-matching for bound parameters.
//!
//! A scripted expectation does not have to pin parameters with strict
//! equality. Each parameter position carries a [`ParamPattern`] allowing
//! literal values, regex matchers against string values, partial JSON
//! object matches, or a wildcard. This replaces the structural "satisfies"
//! comparison the mock would otherwise delegate to an assertion library.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use pgmock_core::Value;
use regex::Regex;

use crate::error::{ContentMismatch, MockError};

/// Thread-safe cache of compiled regex patterns.
///
/// Patterns are compiled lazily on first use and cached for the lifetime
/// of the program, so a pattern shared by many expectations compiles once.
struct RegexCache {
    cache: RwLock<HashMap<String, Regex>>,
}

impl RegexCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        // Fast path: check if already cached.
        // Use unwrap_or_else to recover from a poisoned lock.
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(regex) = cache.get(pattern) {
                return Ok(regex.clone());
            }
        }

        // Slow path: compile and cache.
        let regex = Regex::new(pattern)?;
        {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(pattern.to_string(), regex.clone());
        }
        Ok(regex)
    }
}

fn regex_cache() -> &'static RegexCache {
    static CACHE: OnceLock<RegexCache> = OnceLock::new();
    CACHE.get_or_init(RegexCache::new)
}

/// Check if a string matches a regex pattern.
///
/// Returns `false` if the pattern is invalid (logs a warning); parameter
/// matching should report a mismatch rather than panic.
fn matches_pattern(value: &str, pattern: &str) -> bool {
    match regex_cache().get_or_compile(pattern) {
        Ok(regex) => regex.is_match(value),
        Err(e) => {
            tracing::warn!(
                pattern = pattern,
                error = %e,
                "Invalid regex pattern in parameter matcher, treating as non-match"
            );
            false
        }
    }
}

/// A pattern one bound parameter must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamPattern {
    /// Matches any value at this position
    Any,
    /// Matches exactly this value
    Literal(Value),
    /// Matches a text value against a regex
    Matches(String),
    /// Matches a JSON value structurally: every key present in the pattern
    /// must exist in the actual object and match recursively; extra keys in
    /// the actual object are ignored
    Partial(serde_json::Value),
}

impl ParamPattern {
    /// Pattern matching a text parameter against a regex.
    pub fn matches(pattern: impl Into<String>) -> Self {
        ParamPattern::Matches(pattern.into())
    }

    /// Pattern matching a JSON parameter against a partial object.
    pub fn partial(pattern: serde_json::Value) -> Self {
        ParamPattern::Partial(pattern)
    }

    /// Check whether a value satisfies this pattern.
    pub fn is_satisfied_by(&self, actual: &Value) -> bool {
        match self {
            ParamPattern::Any => true,
            ParamPattern::Literal(expected) => expected == actual,
            ParamPattern::Matches(pattern) => actual
                .as_str()
                .is_some_and(|s| matches_pattern(s, pattern)),
            ParamPattern::Partial(expected) => match actual {
                Value::Json(actual) => json_partial_match(expected, actual),
                _ => false,
            },
        }
    }

    fn describe(&self) -> String {
        match self {
            ParamPattern::Any => "<any>".to_string(),
            ParamPattern::Literal(value) => format!("{value:?}"),
            ParamPattern::Matches(pattern) => format!("/{pattern}/"),
            ParamPattern::Partial(pattern) => pattern.to_string(),
        }
    }
}

impl From<Value> for ParamPattern {
    fn from(value: Value) -> Self {
        ParamPattern::Literal(value)
    }
}

impl From<&str> for ParamPattern {
    fn from(value: &str) -> Self {
        ParamPattern::Literal(Value::from(value))
    }
}

impl From<String> for ParamPattern {
    fn from(value: String) -> Self {
        ParamPattern::Literal(Value::from(value))
    }
}

impl From<i32> for ParamPattern {
    fn from(value: i32) -> Self {
        ParamPattern::Literal(Value::from(value))
    }
}

impl From<i64> for ParamPattern {
    fn from(value: i64) -> Self {
        ParamPattern::Literal(Value::from(value))
    }
}

impl From<bool> for ParamPattern {
    fn from(value: bool) -> Self {
        ParamPattern::Literal(Value::from(value))
    }
}

impl From<f64> for ParamPattern {
    fn from(value: f64) -> Self {
        ParamPattern::Literal(Value::from(value))
    }
}

/// Structural match of a partial JSON pattern against an actual JSON value.
///
/// Objects match when every pattern key exists in the actual object and
/// matches recursively. Arrays match elementwise with equal lengths.
/// Scalars match by equality.
fn json_partial_match(expected: &serde_json::Value, actual: &serde_json::Value) -> bool {
    match (expected, actual) {
        (serde_json::Value::Object(expected), serde_json::Value::Object(actual)) => expected
            .iter()
            .all(|(key, value)| actual.get(key).is_some_and(|a| json_partial_match(value, a))),
        (serde_json::Value::Array(expected), serde_json::Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected
                    .iter()
                    .zip(actual.iter())
                    .all(|(e, a)| json_partial_match(e, a))
        }
        (expected, actual) => expected == actual,
    }
}

/// Check a full parameter list against its scripted patterns.
///
/// The pattern list and the actual list must have the same length, and
/// every position must satisfy its pattern. The returned error names the
/// first offending position.
pub fn params_satisfy(actual: &[Value], patterns: &[ParamPattern]) -> Result<(), MockError> {
    if actual.len() != patterns.len() {
        return Err(ContentMismatch::ParamCount {
            expected: patterns.len(),
            actual: actual.len(),
        }
        .into());
    }
    for (index, (pattern, value)) in patterns.iter().zip(actual.iter()).enumerate() {
        if !pattern.is_satisfied_by(value) {
            return Err(ContentMismatch::Param {
                index,
                pattern: pattern.describe(),
                actual: format!("{value:?}"),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = ParamPattern::from("Fido");
        assert!(pattern.is_satisfied_by(&Value::from("Fido")));
        assert!(!pattern.is_satisfied_by(&Value::from("Rex")));
        assert!(!pattern.is_satisfied_by(&Value::Int(1)));
    }

    #[test]
    fn test_any_matches_everything() {
        assert!(ParamPattern::Any.is_satisfied_by(&Value::Null));
        assert!(ParamPattern::Any.is_satisfied_by(&Value::from("anything")));
    }

    #[test]
    fn test_regex_match() {
        let pattern = ParamPattern::matches("^Fi");
        assert!(pattern.is_satisfied_by(&Value::from("Fido")));
        assert!(!pattern.is_satisfied_by(&Value::from("Rex")));
        // Regex patterns only apply to text values
        assert!(!pattern.is_satisfied_by(&Value::Int(1)));
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        let pattern = ParamPattern::matches("(unclosed");
        assert!(!pattern.is_satisfied_by(&Value::from("(unclosed")));
    }

    #[test]
    fn test_partial_object_match() {
        let pattern = ParamPattern::partial(serde_json::json!({"name": "Fido"}));
        let actual = Value::Json(serde_json::json!({"id": 1, "name": "Fido"}));
        assert!(pattern.is_satisfied_by(&actual));

        let wrong = Value::Json(serde_json::json!({"id": 1, "name": "Rex"}));
        assert!(!pattern.is_satisfied_by(&wrong));

        let missing = Value::Json(serde_json::json!({"id": 1}));
        assert!(!pattern.is_satisfied_by(&missing));

        // Partial patterns only apply to JSON values
        assert!(!pattern.is_satisfied_by(&Value::from("Fido")));
    }

    #[test]
    fn test_partial_nested_and_arrays() {
        let pattern = ParamPattern::partial(serde_json::json!({
            "pet": {"name": "Fido"},
            "tags": ["good", "dog"],
        }));
        let actual = Value::Json(serde_json::json!({
            "pet": {"id": 1, "name": "Fido"},
            "tags": ["good", "dog"],
            "extra": true,
        }));
        assert!(pattern.is_satisfied_by(&actual));

        let short_array = Value::Json(serde_json::json!({
            "pet": {"name": "Fido"},
            "tags": ["good"],
        }));
        assert!(!pattern.is_satisfied_by(&short_array));
    }

    #[test]
    fn test_params_satisfy_reports_position() {
        let patterns = vec![ParamPattern::from(1i32), ParamPattern::matches("^Fi")];
        let ok = params_satisfy(&[Value::Int(1), Value::from("Fido")], &patterns);
        assert!(ok.is_ok());

        let err = params_satisfy(&[Value::Int(1), Value::from("Rex")], &patterns).unwrap_err();
        match err {
            MockError::Content(ContentMismatch::Param { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_params_satisfy_length_mismatch() {
        let patterns = vec![ParamPattern::Any];
        let err = params_satisfy(&[], &patterns).unwrap_err();
        assert_eq!(
            err,
            MockError::Content(ContentMismatch::ParamCount {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn test_empty_params_empty_patterns() {
        assert!(params_satisfy(&[], &[]).is_ok());
    }
}
