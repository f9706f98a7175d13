//! Attendance tracker CLI library.
//!
//! This crate provides the CLI interface for the attendance tracker.

mod cli;
pub mod commands;
mod config;
mod error;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{ErrorReport, error_report};
