//! Bounded edit distance for TabulaX.
//!
//! [`bounded_distance`] computes the Levenshtein distance between two strings,
//! compared by Unicode scalar value, and gives up as soon as the distance is
//! known to exceed a bound. [`DistanceEngine`] adds the normalization options
//! used by the fuzzy join.

pub mod bounded;
pub mod engine;

pub use bounded::{BoundedDistance, bounded_distance, levenshtein};
pub use engine::{DistanceEngine, DistanceOptions};
