//! Machine-readable error reports for failed commands.

use serde::Serialize;

use pt_core::{AttendanceError, EntryError};

/// Error body printed on stderr when an attendance operation fails.
#[derive(Debug, Serialize)]
pub struct ErrorReport<'a> {
    pub error: &'static str,
    pub status: u16,
    pub retryable: bool,
    pub message: String,
    #[serde(skip_serializing_if = "no_entries")]
    pub errors: &'a [EntryError],
}

fn no_entries(errors: &&[EntryError]) -> bool {
    errors.is_empty()
}

/// Builds a report when the failure is an [`AttendanceError`].
pub fn error_report(err: &anyhow::Error) -> Option<ErrorReport<'_>> {
    let attendance = err.downcast_ref::<AttendanceError>()?;
    Some(ErrorReport {
        error: attendance.kind(),
        status: attendance.status_code(),
        retryable: attendance.is_retryable(),
        message: attendance.to_string(),
        errors: attendance.entry_errors(),
    })
}
