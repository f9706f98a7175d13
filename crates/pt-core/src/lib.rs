//! Core domain logic for session attendance tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Date ranges: expanding a session into its attendance days
//! - Reconciliation: merging stored records with the roster into a day view
//! - Bulk submission: validating a whole batch before one atomic upsert
//! - Statistics: counting stored records and computing the attendance rate

mod dates;
pub mod directory;
mod error;
mod reconcile;
mod stats;
pub mod status;
#[cfg(test)]
mod test_support;
pub mod types;

pub use dates::{InvalidRange, default_day, expand_date_range, session_dates};
pub use directory::{AttendanceStore, ParticipantDirectory, SessionDirectory};
pub use error::{AttendanceError, BoxError, EntryError};
pub use reconcile::{
    AttendanceRow, AttendanceSubmission, AttendanceView, DATE_FORMAT, SubmittedRecord,
    lookup_attendance, submit_attendance, validate_submissions, view_attendance,
    view_attendance_at,
};
pub use stats::{AttendanceStats, attendance_rate, session_stats};
pub use status::{AttendanceStatus, UnknownStatus};
pub use types::{
    AttendanceKey, AttendanceRecord, AttendanceUpdate, Participant, ParticipantId, RecordId,
    Session, SessionId,
};
