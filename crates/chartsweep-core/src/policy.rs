//! Version policy: which chart versions may be deleted

use regex::Regex;

use crate::error::{CoreError, Result};

/// Only development pre-releases are deletable unless configured otherwise
pub const DEFAULT_VERSION_PATTERN: &str = r"^0\.0\.0-dev$";

/// Compiled version pattern
///
/// Matching uses regex search semantics, so unanchored patterns match
/// anywhere in the version string. Anchor the pattern to require a full match.
#[derive(Debug, Clone)]
pub struct VersionPolicy {
    regex: Regex,
}

impl VersionPolicy {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| CoreError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    /// The pattern as given
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Check whether a version may be deleted
    pub fn matches(&self, version: &str) -> bool {
        self.regex.is_match(version)
    }
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_VERSION_PATTERN).expect("default pattern is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_table() {
        let cases = [
            ("0.0.0-dev", r"^0\.0\.0-dev$", true),
            ("1.2.3", r"^0\.0\.0-dev$", false),
            ("0.0.0-dev.1", r"^0\.0\.0-dev$", false),
            ("0.0.0-dev.1", r"^0\.0\.0-dev", true),
            ("1.0.0-dev", r"-dev$", true),
            ("1.0.0", r"dev", false),
        ];

        for (version, pattern, expected) in cases {
            let policy = VersionPolicy::new(pattern).unwrap();
            assert_eq!(
                policy.matches(version),
                expected,
                "matches({version:?}, {pattern:?})"
            );
        }
    }

    #[test]
    fn test_default_pattern() {
        let policy = VersionPolicy::default();
        assert_eq!(policy.pattern(), DEFAULT_VERSION_PATTERN);
        assert!(policy.matches("0.0.0-dev"));
        assert!(!policy.matches("0.1.0"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = VersionPolicy::new("(unclosed").unwrap_err();
        match err {
            CoreError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("Expected InvalidPattern, got {other:?}"),
        }
    }
}
