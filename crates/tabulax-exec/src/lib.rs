//! TabulaX transformation executor.
//!
//! Applies a learned transformation to one column of a table and writes the
//! result to another. Code-bearing transformations run their stored program;
//! General transformations use example lookup and the external resolver.
//!
//! Rows are independent: a failing row gets a null output and an entry in
//! the report, and every other row still runs.

#![deny(unsafe_code)]

pub mod error;
pub mod executor;
mod general;
mod row;

pub use error::{ExecError, Result};
pub use executor::{ExecOptions, Executor, execute};
