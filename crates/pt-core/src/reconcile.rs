//! Attendance reconciliation and bulk submission.
//!
//! The store only holds records that were explicitly submitted. Reading a
//! session day merges those sparse records with the full roster, so every
//! roster participant gets exactly one row; participants without a record
//! are reported absent with no record id.
//!
//! The roster is organization-wide, not session-scoped: every session shows
//! the same participants.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dates::{default_day, session_dates};
use crate::directory::{AttendanceStore, ParticipantDirectory, SessionDirectory};
use crate::error::{AttendanceError, EntryError};
use crate::status::AttendanceStatus;
use crate::types::{
    AttendanceKey, AttendanceRecord, AttendanceUpdate, Participant, ParticipantId, RecordId,
    Session, SessionId,
};

/// Wire format of submitted dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One participant's attendance on one session day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRow {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub participant_email: String,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
    pub session_id: SessionId,
    /// `None` when the row was synthesized rather than read from the store.
    pub record_id: Option<RecordId>,
}

impl AttendanceRow {
    fn reconcile(
        participant: Participant,
        session_id: SessionId,
        day: NaiveDate,
        record: Option<&AttendanceRecord>,
    ) -> Self {
        Self {
            participant_id: participant.id,
            participant_name: participant.name,
            participant_email: participant.email,
            status: record.map_or(AttendanceStatus::Absent, |r| r.status),
            date: day,
            session_id,
            record_id: record.map(|r| r.id),
        }
    }
}

/// Complete attendance state of a session day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceView {
    pub attendance: Vec<AttendanceRow>,
    pub session: Session,
    pub session_dates: Vec<NaiveDate>,
    pub current_date: NaiveDate,
}

/// Builds the attendance view of a session day, defaulting the day from the local date.
pub fn view_attendance<B>(
    backend: &B,
    session_id: SessionId,
    day: Option<NaiveDate>,
) -> Result<AttendanceView, AttendanceError>
where
    B: SessionDirectory + ParticipantDirectory + AttendanceStore,
{
    view_attendance_at(backend, session_id, day, Local::now().date_naive())
}

/// Builds the attendance view of a session day.
///
/// A requested `day` is used as given, even outside the session's range.
/// Without one, `today` is used while the session runs, else its first day.
pub fn view_attendance_at<B>(
    backend: &B,
    session_id: SessionId,
    day: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<AttendanceView, AttendanceError>
where
    B: SessionDirectory + ParticipantDirectory + AttendanceStore,
{
    let session = resolve_session(backend, session_id)?;
    let current_date = day.unwrap_or_else(|| default_day(&session, today));
    let dates = session_dates(&session)?;

    let mut roster = backend
        .list_trackable_participants()
        .map_err(AttendanceError::storage)?;
    roster.sort_by(|a, b| a.name.cmp(&b.name));

    let records = backend
        .list_by_session_and_day(session_id, current_date)
        .map_err(AttendanceError::storage)?;
    let by_participant: HashMap<ParticipantId, &AttendanceRecord> = records
        .iter()
        .map(|record| (record.key.participant_id, record))
        .collect();

    tracing::debug!(
        session_id = %session_id,
        day = %current_date,
        roster = roster.len(),
        stored = records.len(),
        "reconciling attendance"
    );

    let attendance = roster
        .into_iter()
        .map(|participant| {
            let record = by_participant.get(&participant.id).copied();
            AttendanceRow::reconcile(participant, session_id, current_date, record)
        })
        .collect();

    Ok(AttendanceView {
        attendance,
        session,
        session_dates: dates,
        current_date,
    })
}

/// Looks up one participant's attendance on one session day.
///
/// Both the session and the participant must resolve. A missing record is
/// synthesized as absent.
pub fn lookup_attendance<B>(
    backend: &B,
    key: AttendanceKey,
) -> Result<AttendanceRow, AttendanceError>
where
    B: SessionDirectory + ParticipantDirectory + AttendanceStore,
{
    resolve_session(backend, key.session_id)?;
    let participant = backend
        .get_participant(key.participant_id)
        .map_err(AttendanceError::storage)?
        .ok_or(AttendanceError::ParticipantNotFound(key.participant_id))?;
    let record = backend.get(&key).map_err(AttendanceError::storage)?;
    Ok(AttendanceRow::reconcile(
        participant,
        key.session_id,
        key.day,
        record.as_ref(),
    ))
}

fn resolve_session<B: SessionDirectory>(
    backend: &B,
    session_id: SessionId,
) -> Result<Session, AttendanceError> {
    backend
        .get_session(session_id)
        .map_err(AttendanceError::storage)?
        .ok_or(AttendanceError::SessionNotFound(session_id))
}

/// One entry of a bulk attendance submission, as received.
///
/// Fields hold raw JSON so that missing or mistyped values are reported per
/// entry instead of failing the whole payload. `null` counts as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSubmission {
    #[serde(default)]
    pub participant_id: Option<Value>,
    #[serde(default)]
    pub session_formation_id: Option<Value>,
    #[serde(default)]
    pub date_presence: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
}

impl AttendanceSubmission {
    /// Builds a fully populated entry.
    #[must_use]
    pub fn new(participant_id: i64, session_id: i64, day: &str, status: &str) -> Self {
        Self {
            participant_id: Some(participant_id.into()),
            session_formation_id: Some(session_id.into()),
            date_presence: Some(day.into()),
            status: Some(status.into()),
        }
    }
}

fn integer_field(
    errors: &mut Vec<EntryError>,
    index: usize,
    field: &'static str,
    value: Option<&Value>,
) -> Option<i64> {
    match value {
        None => {
            errors.push(EntryError::new(index, field, "is required"));
            None
        }
        Some(value) => {
            let id = value.as_i64();
            if id.is_none() {
                errors.push(EntryError::new(
                    index,
                    field,
                    format!("expected an integer, got {value}"),
                ));
            }
            id
        }
    }
}

fn text_field<'a>(
    errors: &mut Vec<EntryError>,
    index: usize,
    field: &'static str,
    value: Option<&'a Value>,
) -> Option<&'a str> {
    match value {
        None => {
            errors.push(EntryError::new(index, field, "is required"));
            None
        }
        Some(value) => {
            let text = value.as_str();
            if text.is_none() {
                errors.push(EntryError::new(
                    index,
                    field,
                    format!("expected a string, got {value}"),
                ));
            }
            text
        }
    }
}

/// Response row for one processed submission entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedRecord {
    pub id: RecordId,
    pub participant_id: ParticipantId,
    pub status: AttendanceStatus,
}

impl From<&AttendanceRecord> for SubmittedRecord {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            id: record.id,
            participant_id: record.key.participant_id,
            status: record.status,
        }
    }
}

/// Validates every entry of a batch and converts it into store updates.
///
/// All entries are checked; the error lists every invalid field of every entry.
pub fn validate_submissions<B>(
    backend: &B,
    entries: &[AttendanceSubmission],
) -> Result<Vec<AttendanceUpdate>, AttendanceError>
where
    B: SessionDirectory + ParticipantDirectory,
{
    let mut known_sessions: HashMap<SessionId, bool> = HashMap::new();
    let mut known_participants: HashMap<ParticipantId, bool> = HashMap::new();
    let mut errors = Vec::new();
    let mut updates = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let raw_participant =
            integer_field(&mut errors, index, "participant_id", entry.participant_id.as_ref());
        let participant_id = match raw_participant.map(ParticipantId) {
            None => None,
            Some(id) => {
                let exists = match known_participants.get(&id) {
                    Some(exists) => *exists,
                    None => {
                        let exists = backend
                            .get_participant(id)
                            .map_err(AttendanceError::storage)?
                            .is_some();
                        known_participants.insert(id, exists);
                        exists
                    }
                };
                if !exists {
                    errors.push(EntryError::new(
                        index,
                        "participant_id",
                        format!("participant {id} not found"),
                    ));
                }
                exists.then_some(id)
            }
        };

        let raw_session = integer_field(
            &mut errors,
            index,
            "session_formation_id",
            entry.session_formation_id.as_ref(),
        );
        let session_id = match raw_session.map(SessionId) {
            None => None,
            Some(id) => {
                let exists = match known_sessions.get(&id) {
                    Some(exists) => *exists,
                    None => {
                        let exists = backend
                            .get_session(id)
                            .map_err(AttendanceError::storage)?
                            .is_some();
                        known_sessions.insert(id, exists);
                        exists
                    }
                };
                if !exists {
                    errors.push(EntryError::new(
                        index,
                        "session_formation_id",
                        format!("session {id} not found"),
                    ));
                }
                exists.then_some(id)
            }
        };

        let raw_day = text_field(&mut errors, index, "date_presence", entry.date_presence.as_ref());
        let day = raw_day.and_then(|raw| {
            NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .inspect_err(|err| {
                    errors.push(EntryError::new(
                        index,
                        "date_presence",
                        format!("invalid date {raw:?}: {err}"),
                    ));
                })
                .ok()
        });

        let raw_status = text_field(&mut errors, index, "status", entry.status.as_ref());
        let status = raw_status.and_then(|raw| {
            raw.parse::<AttendanceStatus>()
                .inspect_err(|err| {
                    errors.push(EntryError::new(index, "status", err.to_string()));
                })
                .ok()
        });

        if let (Some(participant_id), Some(session_id), Some(day), Some(status)) =
            (participant_id, session_id, day, status)
        {
            updates.push(AttendanceUpdate {
                key: AttendanceKey {
                    session_id,
                    participant_id,
                    day,
                },
                status,
            });
        }
    }

    if errors.is_empty() {
        Ok(updates)
    } else {
        Err(AttendanceError::ValidationFailed(errors))
    }
}

/// Validates a whole batch, then upserts it in one transaction.
///
/// Nothing is written unless every entry is valid. Returns the stored records
/// in input order; duplicate keys in a batch resolve to the last entry.
pub fn submit_attendance<B>(
    backend: &mut B,
    entries: &[AttendanceSubmission],
) -> Result<Vec<AttendanceRecord>, AttendanceError>
where
    B: SessionDirectory + ParticipantDirectory + AttendanceStore,
{
    let updates = match validate_submissions(&*backend, entries) {
        Ok(updates) => updates,
        Err(err) => {
            tracing::warn!(
                entries = entries.len(),
                invalid = err.entry_errors().len(),
                "rejected attendance batch"
            );
            return Err(err);
        }
    };

    if updates.is_empty() {
        return Ok(Vec::new());
    }

    let records = backend
        .upsert_many(&updates)
        .map_err(AttendanceError::transaction)?;
    tracing::info!(records = records.len(), "recorded attendance batch");
    Ok(records)
}
