//! CLI library components for TabulaX.

pub mod cli;
pub mod commands;
pub mod config;
pub mod io;
pub mod logging;
