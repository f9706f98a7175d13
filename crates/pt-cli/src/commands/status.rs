//! Status command for showing the database location and row counts.

use std::io::Write;

use anyhow::{Context, Result};

use pt_db::Database;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config) -> Result<()> {
    let summary = db
        .summary()
        .with_context(|| format!("failed to read {}", config.database_path.display()))?;

    writeln!(writer, "Attendance tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Roster role: {}", config.roster_role)?;
    writeln!(writer, "Sessions: {}", summary.sessions)?;
    writeln!(writer, "Roster participants: {}", summary.roster)?;
    writeln!(writer, "Attendance records: {}", summary.records)?;

    Ok(())
}
