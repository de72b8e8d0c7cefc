//! Persistable transformation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ExampleSet, ModelError, Result, TransformationCategory};

/// A learned transformation as stored by the external record store.
///
/// Field names follow the stored document layout, so records written by the
/// web service deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    #[serde(default, alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "transformationType")]
    pub category: TransformationCategory,

    #[serde(
        rename = "transformationCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,

    pub source_examples: Vec<String>,

    pub target_examples: Vec<String>,

    #[serde(default, alias = "user", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transformation {
    /// Checks the example alignment and the code/category invariant.
    pub fn validate(&self) -> Result<()> {
        self.examples()?;
        self.logic()?;
        Ok(())
    }

    /// Returns the execution logic carried by the record.
    pub fn logic(&self) -> Result<TransformationLogic> {
        TransformationLogic::from_parts(
            self.category,
            self.code.clone(),
            self.description.clone(),
        )
    }

    /// Returns the stored examples as a validated set.
    pub fn examples(&self) -> Result<ExampleSet> {
        ExampleSet::from_columns(self.source_examples.clone(), self.target_examples.clone())
    }
}

/// Execution logic of a transformation.
///
/// Deterministic categories always carry program text; `General` carries an
/// optional description consumed by the external resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformationLogic {
    StringBased(String),
    Numerical(String),
    Algorithmic(String),
    General(Option<String>),
}

impl TransformationLogic {
    /// Builds the logic from a category and its optional payloads.
    ///
    /// Blank code counts as missing.
    pub fn from_parts(
        category: TransformationCategory,
        code: Option<String>,
        description: Option<String>,
    ) -> Result<Self> {
        let code = code.filter(|c| !c.trim().is_empty());
        match (category, code) {
            (TransformationCategory::General, None) => Ok(Self::General(description)),
            (TransformationCategory::General, Some(_)) => Err(ModelError::UnexpectedCode),
            (category, None) => Err(ModelError::MissingCode { category }),
            (TransformationCategory::StringBased, Some(code)) => Ok(Self::StringBased(code)),
            (TransformationCategory::Numerical, Some(code)) => Ok(Self::Numerical(code)),
            (TransformationCategory::Algorithmic, Some(code)) => Ok(Self::Algorithmic(code)),
        }
    }

    pub fn category(&self) -> TransformationCategory {
        match self {
            Self::StringBased(_) => TransformationCategory::StringBased,
            Self::Numerical(_) => TransformationCategory::Numerical,
            Self::Algorithmic(_) => TransformationCategory::Algorithmic,
            Self::General(_) => TransformationCategory::General,
        }
    }

    /// Program text, for deterministic categories.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::StringBased(code) | Self::Numerical(code) | Self::Algorithmic(code) => {
                Some(code)
            }
            Self::General(_) => None,
        }
    }

    /// Resolver description, for `General`.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::General(description) => description.as_deref(),
            _ => None,
        }
    }
}
