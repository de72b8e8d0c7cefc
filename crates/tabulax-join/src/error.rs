//! Join validation errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JoinError {
    #[error("max distance must be a non-negative number, got {0}")]
    InvalidMaxDistance(f64),

    #[error("{side} column `{column}` is not present in any row")]
    MissingColumn { side: &'static str, column: String },

    #[error("target prefix is empty")]
    EmptyPrefix,
}

pub type Result<T> = std::result::Result<T, JoinError>;
