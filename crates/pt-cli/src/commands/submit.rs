//! Submit command: records a batch of attendance entries.
//!
//! The batch is a JSON array of
//! `{participant_id, session_formation_id, date_presence, status}` objects.
//! Field values are kept as raw JSON; wrong types surface as per-entry
//! validation errors.
//! Every entry is validated before anything is written; the whole batch is
//! then upserted in one transaction.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use pt_core::{AttendanceSubmission, SubmittedRecord};
use pt_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, file: Option<&Path>) -> Result<()> {
    let input = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    let entries = parse_batch(&input)?;
    let records = pt_core::submit_attendance(db, &entries)?;
    let response: Vec<SubmittedRecord> = records.iter().map(SubmittedRecord::from).collect();
    writeln!(writer, "{}", serde_json::to_string_pretty(&response)?)?;
    Ok(())
}

/// Parses a submission batch; a single object is accepted as a one-entry batch.
pub fn parse_batch(input: &str) -> Result<Vec<AttendanceSubmission>> {
    let value: serde_json::Value =
        serde_json::from_str(input.trim()).context("invalid JSON batch")?;
    let entries: Vec<AttendanceSubmission> = if value.is_array() {
        serde_json::from_value(value).context("invalid attendance batch")?
    } else {
        vec![serde_json::from_value(value).context("invalid attendance entry")?]
    };
    Ok(entries)
}
