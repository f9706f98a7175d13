//! In-memory backend used by unit tests.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::directory::{AttendanceStore, ParticipantDirectory, SessionDirectory};
use crate::types::{
    AttendanceKey, AttendanceRecord, AttendanceUpdate, Participant, ParticipantId, RecordId,
    Session, SessionId,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MemoryError(String);

#[derive(Debug)]
pub struct MemoryBackend {
    pub sessions: Vec<Session>,
    pub roster: Vec<Participant>,
    pub records: BTreeMap<AttendanceKey, AttendanceRecord>,
    pub next_id: i64,
    /// Makes `upsert_many` fail when a batch touches this participant.
    pub reject_participant: Option<ParticipantId>,
    pub now: DateTime<Utc>,
    pub upsert_calls: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            roster: Vec::new(),
            records: BTreeMap::new(),
            next_id: 1,
            reject_participant: None,
            now: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            upsert_calls: 0,
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn session(id: i64, start: &str, end: &str) -> Session {
    Session {
        id: SessionId(id),
        title: format!("Session {id}"),
        start_date: date(start),
        end_date: date(end),
    }
}

pub fn participant(id: i64, name: &str) -> Participant {
    Participant {
        id: ParticipantId(id),
        name: name.to_string(),
        email: format!("{}@example.org", name.to_lowercase()),
        role: "participant".to_string(),
    }
}

impl MemoryBackend {
    pub fn with(sessions: Vec<Session>, roster: Vec<Participant>) -> Self {
        Self {
            sessions,
            roster,
            ..Self::default()
        }
    }
}

impl SessionDirectory for MemoryBackend {
    type Error = MemoryError;

    fn get_session(&self, id: SessionId) -> Result<Option<Session>, Self::Error> {
        Ok(self.sessions.iter().find(|s| s.id == id).cloned())
    }
}

impl ParticipantDirectory for MemoryBackend {
    type Error = MemoryError;

    fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, Self::Error> {
        Ok(self.roster.iter().find(|p| p.id == id).cloned())
    }

    fn list_trackable_participants(&self) -> Result<Vec<Participant>, Self::Error> {
        let mut roster = self.roster.clone();
        roster.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(roster)
    }
}

impl AttendanceStore for MemoryBackend {
    type Error = MemoryError;

    fn get(&self, key: &AttendanceKey) -> Result<Option<AttendanceRecord>, Self::Error> {
        Ok(self.records.get(key).cloned())
    }

    fn list_by_session_and_day(
        &self,
        session_id: SessionId,
        day: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, Self::Error> {
        Ok(self
            .records
            .values()
            .filter(|r| r.key.session_id == session_id && r.key.day == day)
            .cloned()
            .collect())
    }

    fn list_by_session(&self, session_id: SessionId) -> Result<Vec<AttendanceRecord>, Self::Error> {
        Ok(self
            .records
            .values()
            .filter(|r| r.key.session_id == session_id)
            .cloned()
            .collect())
    }

    fn upsert_many(
        &mut self,
        updates: &[AttendanceUpdate],
    ) -> Result<Vec<AttendanceRecord>, Self::Error> {
        self.upsert_calls += 1;
        let mut staged = self.records.clone();
        let mut next_id = self.next_id;
        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            if Some(update.key.participant_id) == self.reject_participant {
                return Err(MemoryError(format!("constraint failed for {}", update.key)));
            }
            let record = staged
                .entry(update.key)
                .and_modify(|existing| {
                    existing.status = update.status;
                    existing.updated_at = self.now;
                })
                .or_insert_with(|| {
                    let id = RecordId(next_id);
                    next_id += 1;
                    AttendanceRecord {
                        id,
                        key: update.key,
                        status: update.status,
                        created_at: self.now,
                        updated_at: self.now,
                    }
                });
            results.push(record.clone());
        }
        self.records = staged;
        self.next_id = next_id;
        Ok(results)
    }
}
