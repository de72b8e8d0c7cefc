use thiserror::Error;

use tabulax_model::{ModelError, TransformationCategory};

/// Program text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at byte {offset}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// A program failed on one input value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("not an integer: {0:?}")]
    NotAnInteger(String),

    #[error("token index {index} out of range ({count} tokens)")]
    TokenIndex { index: i64, count: usize },

    #[error("empty pattern")]
    EmptyPattern,

    #[error("invalid base64 input")]
    InvalidBase64,

    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,

    #[error("luhn input must contain only digits: {0:?}")]
    InvalidLuhn(String),

    #[error("radix {0} outside 2..=36")]
    InvalidRadix(u32),

    #[error("{value:?} is not a base-{radix} number")]
    InvalidDigits { value: String, radix: u32 },

    #[error("{value:?} does not match date format {format:?}")]
    InvalidDate { value: String, format: String },

    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    #[error("result is not a finite number")]
    NonFinite,
}

/// Learning errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// No program reproducing every example was found within the budget.
    #[error("no {category} program reproduces all examples")]
    NoProgram { category: TransformationCategory },

    #[error(transparent)]
    Model(#[from] ModelError),
}
