//! TabulaX transformation learning.
//!
//! Turns a small set of source/target examples into executable logic:
//!
//! - **classify**: assigns a [`TransformationCategory`](tabulax_model::TransformationCategory)
//!   by finding a program that proves it
//! - **numeric**: least-squares fitting of arithmetic relationships
//! - **search**: bounded concatenation search over string and algorithmic atoms
//! - **dialect**: the restricted program language, with parser, printer and
//!   interpreter
//! - **learn**: orchestration, including the General fallback and its
//!   description

#![deny(unsafe_code)]

pub mod atoms;
pub mod classify;
pub mod dialect;
pub mod error;
pub mod learn;
pub mod numeric;
pub mod search;

pub use classify::{Classification, Classifier, classify};
pub use dialect::{Expr, Program, parse};
pub use error::{EvalError, ParseError, SynthesisError};
pub use learn::{LearnedTransformation, Synthesized, describe, learn, learn_with, synthesize};
pub use numeric::fit_numeric;
pub use search::{AtomLibrary, SearchBudget, search_program};
