//! Transformation categories.
//!
//! A category selects the execution strategy for a learned transformation.
//! The wire labels match the records written by the TabulaX web service
//! (`"String-based"`, `"Numerical"`, `"Algorithmic"`, `"General"`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Execution strategy class of a transformation.
///
/// The declaration order is the classification precedence: when several
/// deterministic categories could explain a set of examples, the earliest
/// one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransformationCategory {
    /// Target derived through arithmetic on parsed numbers.
    Numerical,

    /// Target derived using string primitives only (tokens, slices, case,
    /// literals, replacement, padding).
    #[serde(rename = "String-based", alias = "StringBased")]
    StringBased,

    /// Target derived through a closed-form procedure such as hashing,
    /// encoding or date arithmetic.
    Algorithmic,

    /// No deterministic program explains the examples; values are resolved
    /// through lookup and the external resolver at apply time.
    General,
}

impl TransformationCategory {
    /// All categories in classification precedence order.
    pub const ALL: [Self; 4] = [
        Self::Numerical,
        Self::StringBased,
        Self::Algorithmic,
        Self::General,
    ];

    /// Returns the wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numerical => "Numerical",
            Self::StringBased => "String-based",
            Self::Algorithmic => "Algorithmic",
            Self::General => "General",
        }
    }

    /// Returns true for categories that always carry executable code.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Self::General)
    }

    /// Returns true if join values should be compared numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numerical)
    }
}

impl fmt::Display for TransformationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransformationCategory {
    type Err = ModelError;

    /// Parses a wire label or variant name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "numerical" | "numeric" => Ok(Self::Numerical),
            "stringbased" | "string" => Ok(Self::StringBased),
            "algorithmic" => Ok(Self::Algorithmic),
            "general" => Ok(Self::General),
            _ => Err(ModelError::UnknownCategory(s.to_string())),
        }
    }
}
