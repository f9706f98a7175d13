//! Attendance statistics for a session.
//!
//! Counts come from stored records only. Participants who were never
//! submitted for a day are not counted as absent here, so the three counts
//! can sum to much less than the theoretical maximum.

use serde::Serialize;

use crate::dates::session_dates;
use crate::directory::{AttendanceStore, ParticipantDirectory, SessionDirectory};
use crate::error::AttendanceError;
use crate::status::AttendanceStatus;
use crate::types::SessionId;

/// Aggregated attendance figures for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStats {
    pub session_id: SessionId,
    pub total_days: usize,
    pub total_participants: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub justified_count: usize,
    /// Percentage of possible attendances marked present, two decimals.
    pub attendance_rate: f64,
}

impl AttendanceStats {
    /// Days times roster size.
    pub const fn total_possible(&self) -> usize {
        self.total_days * self.total_participants
    }
}

/// `present / total_possible * 100`, rounded to two decimals; zero when nothing is possible.
#[expect(
    clippy::cast_precision_loss,
    reason = "attendance counts stay far below 2^52"
)]
pub fn attendance_rate(present: usize, total_possible: usize) -> f64 {
    if total_possible == 0 {
        return 0.0;
    }
    let rate = present as f64 / total_possible as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Computes attendance statistics for a session.
pub fn session_stats<B>(
    backend: &B,
    session_id: SessionId,
) -> Result<AttendanceStats, AttendanceError>
where
    B: SessionDirectory + ParticipantDirectory + AttendanceStore,
{
    let session = backend
        .get_session(session_id)
        .map_err(AttendanceError::storage)?
        .ok_or(AttendanceError::SessionNotFound(session_id))?;

    let total_days = session_dates(&session)?.len();
    let total_participants = backend
        .list_trackable_participants()
        .map_err(AttendanceError::storage)?
        .len();

    let mut present_count = 0;
    let mut absent_count = 0;
    let mut justified_count = 0;
    for record in backend
        .list_by_session(session_id)
        .map_err(AttendanceError::storage)?
    {
        match record.status {
            AttendanceStatus::Present => present_count += 1,
            AttendanceStatus::Absent => absent_count += 1,
            AttendanceStatus::Justified => justified_count += 1,
        }
    }

    let attendance_rate = attendance_rate(present_count, total_days * total_participants);
    tracing::debug!(
        session_id = %session_id,
        total_days,
        total_participants,
        present_count,
        attendance_rate,
        "computed attendance stats"
    );

    Ok(AttendanceStats {
        session_id,
        total_days,
        total_participants,
        present_count,
        absent_count,
        justified_count,
        attendance_rate,
    })
}
