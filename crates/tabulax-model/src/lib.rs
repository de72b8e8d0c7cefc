//! TabulaX data model.
//!
//! Types shared by every TabulaX crate:
//!
//! - **value / table**: scalar cells, rows and tables exchanged with callers
//! - **example**: validated source/target example pairs
//! - **category**: the execution strategy assigned to a transformation
//! - **transformation**: the persistable transformation record
//! - **outcome / join**: per-row execution outcomes and fuzzy join results
//! - **numeric**: the numeric parsing policy shared by synthesis and joins

#![deny(unsafe_code)]

pub mod category;
pub mod error;
pub mod example;
pub mod join;
pub mod numeric;
pub mod outcome;
pub mod table;
pub mod transformation;
pub mod value;

pub use category::TransformationCategory;
pub use error::{ModelError, Result};
pub use example::{ExampleSet, TransformationExample};
pub use join::{JoinCandidate, JoinResult};
pub use numeric::{format_number, parse_number};
pub use outcome::{ExecutionReport, FailureKind, Provenance, RowFailure, RowOutcome, RowStatus};
pub use table::{Row, Table};
pub use transformation::{Transformation, TransformationLogic};
pub use value::CellValue;
