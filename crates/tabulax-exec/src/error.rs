//! Batch-level validation errors.
//!
//! Anything reported here stops the batch before a single row runs. Per-row
//! problems are never errors; they are recorded in the execution report.

use tabulax_model::ModelError;
use tabulax_synth::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("input column `{column}` is not present in any row")]
    MissingColumn { column: String },

    #[error("output column name is empty")]
    EmptyOutputColumn,

    #[error("invalid transformation record: {0}")]
    Model(#[from] ModelError),

    #[error("stored program does not parse: {0}")]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, ExecError>;
