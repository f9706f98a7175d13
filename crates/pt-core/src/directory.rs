//! Collaborator seams: session and participant directories, attendance store.
//!
//! These traits let reconciliation and statistics run against different
//! backends (e.g., `Database` from pt-db, or in-memory test fixtures).
//! Every method may block on I/O.

use chrono::NaiveDate;

use crate::types::{
    AttendanceKey, AttendanceRecord, AttendanceUpdate, Participant, ParticipantId, Session,
    SessionId,
};

/// Read-only access to training sessions.
pub trait SessionDirectory {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolves a session by id.
    fn get_session(&self, id: SessionId) -> Result<Option<Session>, Self::Error>;
}

/// Read-only access to the trackable roster.
pub trait ParticipantDirectory {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolves a roster participant by id.
    fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, Self::Error>;

    /// Lists the whole trackable roster, ordered by display name.
    fn list_trackable_participants(&self) -> Result<Vec<Participant>, Self::Error>;
}

/// Keyed storage of attendance records.
///
/// Implementations do not check that sessions or participants exist.
pub trait AttendanceStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Point lookup by composite key. A missing key is `Ok(None)`.
    fn get(&self, key: &AttendanceKey) -> Result<Option<AttendanceRecord>, Self::Error>;

    /// All records of one session day.
    fn list_by_session_and_day(
        &self,
        session_id: SessionId,
        day: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, Self::Error>;

    /// All records of one session, across days.
    fn list_by_session(&self, session_id: SessionId) -> Result<Vec<AttendanceRecord>, Self::Error>;

    /// Inserts or overwrites one record per update, atomically.
    ///
    /// Updates are applied in order, so a later update to the same key wins.
    /// Returns the resulting records in input order. On error nothing is applied.
    fn upsert_many(
        &mut self,
        updates: &[AttendanceUpdate],
    ) -> Result<Vec<AttendanceRecord>, Self::Error>;
}
