//! CLI subcommand implementations.

pub mod import;
pub mod stats;
pub mod status;
pub mod submit;
pub mod view;
