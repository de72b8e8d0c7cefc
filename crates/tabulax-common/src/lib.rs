//! Shared utilities for TabulaX crates.
//!
//! This crate provides the row-parallel worker pool and the cooperative
//! cancellation token used by the executor and the fuzzy join.

pub mod cancel;
pub mod pool;

pub use cancel::CancellationToken;
pub use pool::{default_workers, effective_workers, parallel_map};
