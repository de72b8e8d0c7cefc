//! TabulaX fuzzy join.
//!
//! Matches each row of a source table, on a transformed column, to the
//! closest row of a target table. Distance follows the transformation
//! category: edit distance for text, absolute difference for numbers.
//!
//! ```
//! use tabulax_join::fuzzy_join;
//! use tabulax_model::{Table, TransformationCategory};
//!
//! let source = Table::from_column("name", ["Jon"]);
//! let target = Table::from_column("name", ["John", "Joan"]);
//! let joined =
//!     fuzzy_join(&source, &target, "name", "name", TransformationCategory::StringBased, 1.0)
//!         .unwrap();
//! assert_eq!(joined.matches[0].target_index, 0);
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod join;
pub mod options;

pub use error::{JoinError, Result};
pub use join::{DISTANCE_COLUMN, FuzzyJoiner, fuzzy_join};
pub use options::{JoinOptions, UnmatchedPolicy};
