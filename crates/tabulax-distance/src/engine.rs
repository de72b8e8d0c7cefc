//! Normalizing distance engine.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::bounded::{BoundedDistance, bounded_chars};

/// Text normalization applied before comparing values.
///
/// The default compares raw values: case-sensitive, no trimming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceOptions {
    /// Compare lowercased text (Unicode lowercasing).
    pub normalize_case: bool,
    /// Trim both ends and collapse inner whitespace runs to one space.
    pub trim_whitespace: bool,
}

impl DistanceOptions {
    /// Case-insensitive, whitespace-insensitive comparison.
    pub fn lenient() -> Self {
        Self {
            normalize_case: true,
            trim_whitespace: true,
        }
    }
}

/// Edit distance with normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceEngine {
    options: DistanceOptions,
}

impl DistanceEngine {
    pub fn new(options: DistanceOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> DistanceOptions {
        self.options
    }

    /// Applies the configured normalization to a value.
    pub fn normalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(value);
        if self.options.trim_whitespace {
            let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
            if collapsed != value {
                out = Cow::Owned(collapsed);
            }
        }
        if self.options.normalize_case && out.chars().any(char::is_uppercase) {
            out = Cow::Owned(out.to_lowercase());
        }
        out
    }

    /// Bounded distance between two raw values after normalization.
    pub fn distance(&self, a: &str, b: &str, max: usize) -> BoundedDistance {
        let a: Vec<char> = self.normalize(a).chars().collect();
        let b: Vec<char> = self.normalize(b).chars().collect();
        bounded_chars(&a, &b, max)
    }

    /// Bounded distance between values already passed through
    /// [`normalize`](Self::normalize) and split into chars.
    pub fn distance_prepared(&self, a: &[char], b: &[char], max: usize) -> BoundedDistance {
        bounded_chars(a, b, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_raw() {
        let engine = DistanceEngine::default();
        assert_eq!(engine.normalize("  Ada  Lovelace "), "  Ada  Lovelace ");
        assert_eq!(engine.distance("Ada", "ada", 0), BoundedDistance::Exceeds);
    }

    #[test]
    fn test_lenient_normalization() {
        let engine = DistanceEngine::new(DistanceOptions::lenient());
        assert_eq!(engine.normalize("  Ada \t Lovelace "), "ada lovelace");
        assert_eq!(
            engine.distance(" ADA  LOVELACE", "ada lovelace", 0),
            BoundedDistance::Exact(0)
        );
    }

    #[test]
    fn test_normalize_borrows_when_unchanged() {
        let engine = DistanceEngine::new(DistanceOptions::lenient());
        assert!(matches!(engine.normalize("already clean"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unicode_lowercase() {
        let engine = DistanceEngine::new(DistanceOptions {
            normalize_case: true,
            trim_whitespace: false,
        });
        assert_eq!(engine.normalize("ÉCOLE"), "école");
    }
}
