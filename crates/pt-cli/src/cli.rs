//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Session attendance tracker.
///
/// Records per-day attendance for training sessions and reports the
/// reconciled roster view and attendance statistics.
#[derive(Debug, Parser)]
#[command(name = "pt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show database location and row counts.
    Status,

    /// Seed sessions and participants from JSON lines on stdin.
    Import,

    /// Show the attendance of every roster participant for a session day.
    View {
        /// Session id.
        #[arg(long)]
        session: i64,

        /// Day to show (YYYY-MM-DD). Defaults to today while the session runs, else its first day.
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one participant's attendance for a session day.
    Get {
        /// Session id.
        #[arg(long)]
        session: i64,

        /// Participant id.
        #[arg(long)]
        participant: i64,

        /// Day (YYYY-MM-DD).
        #[arg(long)]
        day: NaiveDate,
    },

    /// Record a JSON array of attendance entries in one transaction.
    Submit {
        /// Read the batch from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show attendance statistics for a session.
    Stats {
        /// Session id.
        #[arg(long)]
        session: i64,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
