use serde::{Deserialize, Serialize};

use crate::{ModelError, Result};

/// One source value paired with the target value it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationExample {
    pub source: String,
    pub target: String,
}

impl TransformationExample {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A validated, non-empty sequence of examples in caller order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExampleSet {
    examples: Vec<TransformationExample>,
}

impl ExampleSet {
    pub fn new(examples: Vec<TransformationExample>) -> Result<Self> {
        if examples.is_empty() {
            return Err(ModelError::EmptyExamples);
        }
        Ok(Self { examples })
    }

    /// Pairs two aligned columns of values.
    ///
    /// Mismatched lengths and empty columns are caller errors.
    pub fn from_columns<S, T>(source: Vec<S>, target: Vec<T>) -> Result<Self>
    where
        S: Into<String>,
        T: Into<String>,
    {
        if source.len() != target.len() {
            return Err(ModelError::LengthMismatch {
                source_len: source.len(),
                target_len: target.len(),
            });
        }
        Self::new(
            source
                .into_iter()
                .zip(target)
                .map(|(s, t)| TransformationExample::new(s, t))
                .collect(),
        )
    }

    /// Builds a set from `(source, target)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(s, t)| TransformationExample::new(s, t))
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[TransformationExample] {
        &self.examples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransformationExample> {
        self.examples.iter()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Always false: a validated set holds at least one example.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.examples.iter().map(|e| e.source.as_str())
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.examples.iter().map(|e| e.target.as_str())
    }
}

impl<'de> Deserialize<'de> for ExampleSet {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let examples = Vec::<TransformationExample>::deserialize(deserializer)?;
        Self::new(examples).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a ExampleSet {
    type Item = &'a TransformationExample;
    type IntoIter = std::slice::Iter<'a, TransformationExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_validates_lengths() {
        let err = ExampleSet::from_columns(vec!["a", "b"], vec!["A"]).unwrap_err();
        assert_eq!(
            err,
            ModelError::LengthMismatch {
                source_len: 2,
                target_len: 1
            }
        );
    }

    #[test]
    fn test_empty_rejected() {
        let err = ExampleSet::from_columns(Vec::<String>::new(), Vec::<String>::new()).unwrap_err();
        assert_eq!(err, ModelError::EmptyExamples);
        assert!(serde_json::from_str::<ExampleSet>("[]").is_err());
    }

    #[test]
    fn test_pairs_keep_order() {
        let set = ExampleSet::from_pairs([("a", "A"), ("b", "B")]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.sources().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(set.targets().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
