use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::numeric::format_number;

/// A scalar cell value.
///
/// Serialized untagged, so rows read and write as plain JSON objects
/// (`{"name": "Ada", "age": 36, "email": null}`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the textual form of the value, or None for null.
    ///
    /// Numbers use [`format_number`], so `5.0` reads as `"5"`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(Cow::Borrowed(if *value { "true" } else { "false" })),
            Self::Number(value) => Some(Cow::Owned(format_number(*value))),
            Self::Text(value) => Some(Cow::Borrowed(value)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_round_trip() {
        let values: Vec<CellValue> = serde_json::from_str(r#"[null, true, 3.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Number(3.5),
                CellValue::text("x"),
            ]
        );
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[null,true,3.5,"x"]"#);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(CellValue::Number(5.0).as_text().as_deref(), Some("5"));
        assert_eq!(CellValue::Null.as_text(), None);
        assert_eq!(CellValue::text("a b").to_string(), "a b");
    }
}
