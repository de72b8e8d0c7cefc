use thiserror::Error;

use crate::TransformationCategory;

/// Validation errors raised while building model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("example set is empty")]
    EmptyExamples,

    #[error(
        "source and target examples differ in length ({source_len} source values, {target_len} target values)"
    )]
    LengthMismatch { source_len: usize, target_len: usize },

    #[error("unknown transformation category: {0}")]
    UnknownCategory(String),

    #[error("{category} transformation requires code")]
    MissingCode { category: TransformationCategory },

    #[error("General transformation must not carry code")]
    UnexpectedCode,
}

pub type Result<T> = std::result::Result<T, ModelError>;
