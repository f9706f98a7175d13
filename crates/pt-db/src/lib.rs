//! Storage layer for session attendance.
//!
//! Provides persistence for sessions, participants and attendance records
//! using `rusqlite`. A single [`Database`] implements the session directory,
//! the participant directory and the attendance store.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization. Concurrent writers should
//! each open their own connection; `SQLite` serializes their transactions and the
//! last one to commit wins for overlapping keys.
//!
//! # Schema
//!
//! ## Date and Timestamp Format
//!
//! Calendar days are stored as TEXT in `YYYY-MM-DD` format, so lexicographic
//! ordering matches chronological ordering. Record timestamps are stored as
//! RFC 3339 UTC TEXT (e.g., `2024-01-15T10:30:00.000Z`).
//!
//! ## Attendance Identity
//!
//! `attendance` rows are unique per `(session_id, participant_id, day)`. The
//! integer `id` is a surrogate surfaced to clients only. There are no foreign
//! keys to `sessions` or `participants`: reference checks happen before a
//! batch reaches the store.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use pt_core::{
    AttendanceKey, AttendanceRecord, AttendanceStatus, AttendanceStore, AttendanceUpdate,
    DATE_FORMAT, InvalidRange, Participant, ParticipantDirectory, ParticipantId, RecordId, Session,
    SessionDirectory, SessionId, UnknownStatus,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

/// Role tag of the trackable roster unless configured otherwise.
pub const DEFAULT_ROSTER_ROLE: &str = "participant";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored calendar day could not be parsed.
    #[error("invalid date in {column}: {value}")]
    InvalidDate {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp for attendance record {record_id}: {value}")]
    InvalidTimestamp {
        record_id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored status is not a known attendance status.
    #[error("invalid status: {0}")]
    InvalidStatus(#[from] UnknownStatus),
    /// A session's start date falls after its end date.
    #[error(transparent)]
    InvalidRange(#[from] InvalidRange),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
    roster_role: String,
}

/// Row counts shown by `pt status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSummary {
    pub sessions: usize,
    pub roster: usize,
    pub records: usize,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            roster_role: DEFAULT_ROSTER_ROLE.to_string(),
        };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            roster_role: DEFAULT_ROSTER_ROLE.to_string(),
        };
        db.init()?;
        Ok(db)
    }

    /// Sets the participant role that makes up the trackable roster.
    #[must_use]
    pub fn with_roster_role(mut self, role: impl Into<String>) -> Self {
        self.roster_role = role.into();
        self
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                CHECK (start_date <= end_date)
            );

            CREATE TABLE IF NOT EXISTS participants (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                role TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_participants_role ON participants(role, name);

            -- Attendance table: one row per (session, participant, day)
            -- day: calendar date (e.g., '2024-01-15')
            -- status: 'present', 'absent' or 'justifie'
            CREATE TABLE IF NOT EXISTS attendance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                participant_id INTEGER NOT NULL,
                day TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('present', 'absent', 'justifie')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (session_id, participant_id, day)
            );

            CREATE INDEX IF NOT EXISTS idx_attendance_session_day ON attendance(session_id, day);
            ",
        )?;
        Ok(())
    }

    /// Inserts or replaces a session by id.
    pub fn upsert_session(&mut self, session: &Session) -> Result<(), DbError> {
        if session.start_date > session.end_date {
            return Err(InvalidRange {
                start: session.start_date,
                end: session.end_date,
            }
            .into());
        }
        self.conn.execute(
            "
            INSERT INTO sessions (id, title, start_date, end_date)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                start_date = excluded.start_date,
                end_date = excluded.end_date
            ",
            params![
                session.id.get(),
                session.title,
                format_date(session.start_date),
                format_date(session.end_date),
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces a participant by id.
    pub fn upsert_participant(&mut self, participant: &Participant) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO participants (id, name, email, role)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role
            ",
            params![
                participant.id.get(),
                participant.name,
                participant.email,
                participant.role,
            ],
        )?;
        Ok(())
    }

    /// Counts sessions, roster participants and stored attendance records.
    pub fn summary(&self) -> Result<StoreSummary, DbError> {
        let sessions: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        let roster: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM participants WHERE role = ?",
            [&self.roster_role],
            |row| row.get(0),
        )?;
        let records: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM attendance", [], |row| row.get(0))?;
        Ok(StoreSummary {
            sessions: count(sessions),
            roster: count(roster),
            records: count(records),
        })
    }

    /// Upserts a batch of attendance updates in one transaction.
    ///
    /// Updates run in input order, so the last update for a key wins. If any
    /// statement fails the transaction is rolled back and nothing is written.
    pub fn upsert_many_at(
        &mut self,
        updates: &[AttendanceUpdate],
        now: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, DbError> {
        let now = format_timestamp(now);
        let tx = self.conn.transaction()?;
        let mut records = Vec::with_capacity(updates.len());
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO attendance
                    (session_id, participant_id, day, status, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                ON CONFLICT(session_id, participant_id, day) DO UPDATE SET
                    status = excluded.status,
                    updated_at = excluded.updated_at
                RETURNING id, session_id, participant_id, day, status, created_at, updated_at
                ",
            )?;
            for update in updates {
                let row = stmt
                    .query_row(
                        params![
                            update.key.session_id.get(),
                            update.key.participant_id.get(),
                            format_date(update.key.day),
                            update.status.as_str(),
                            now,
                        ],
                        AttendanceRow::from_row,
                    )
                    .inspect_err(|err| {
                        tracing::warn!(
                            key = %update.key,
                            error = %err,
                            "attendance upsert failed, rolling back"
                        );
                    })?;
                records.push(row.into_record()?);
            }
        }
        tx.commit()?;
        tracing::debug!(records = records.len(), "committed attendance batch");
        Ok(records)
    }

    fn query_attendance(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<AttendanceRecord>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, AttendanceRow::from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

impl SessionDirectory for Database {
    type Error = DbError;

    fn get_session(&self, id: SessionId) -> Result<Option<Session>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, start_date, end_date FROM sessions WHERE id = ?",
                [id.get()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, title, start_date, end_date)) = row else {
            return Ok(None);
        };
        Ok(Some(Session {
            id: SessionId(id),
            title,
            start_date: parse_date(&start_date, "sessions.start_date")?,
            end_date: parse_date(&end_date, "sessions.end_date")?,
        }))
    }
}

impl ParticipantDirectory for Database {
    type Error = DbError;

    fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, DbError> {
        let participant = self
            .conn
            .query_row(
                "SELECT id, name, email, role FROM participants WHERE id = ? AND role = ?",
                params![id.get(), self.roster_role],
                participant_from_row,
            )
            .optional()?;
        Ok(participant)
    }

    fn list_trackable_participants(&self) -> Result<Vec<Participant>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, email, role
            FROM participants
            WHERE role = ?
            ORDER BY name ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([&self.roster_role], participant_from_row)?;
        let mut roster = Vec::new();
        for row in rows {
            roster.push(row?);
        }
        tracing::debug!(role = %self.roster_role, count = roster.len(), "loaded roster");
        Ok(roster)
    }
}

impl AttendanceStore for Database {
    type Error = DbError;

    fn get(&self, key: &AttendanceKey) -> Result<Option<AttendanceRecord>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT id, session_id, participant_id, day, status, created_at, updated_at
                FROM attendance
                WHERE session_id = ? AND participant_id = ? AND day = ?
                ",
                params![
                    key.session_id.get(),
                    key.participant_id.get(),
                    format_date(key.day),
                ],
                AttendanceRow::from_row,
            )
            .optional()?;
        row.map(AttendanceRow::into_record).transpose()
    }

    fn list_by_session_and_day(
        &self,
        session_id: SessionId,
        day: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, DbError> {
        self.query_attendance(
            "
            SELECT id, session_id, participant_id, day, status, created_at, updated_at
            FROM attendance
            WHERE session_id = ? AND day = ?
            ORDER BY participant_id ASC
            ",
            params![session_id.get(), format_date(day)],
        )
    }

    fn list_by_session(&self, session_id: SessionId) -> Result<Vec<AttendanceRecord>, DbError> {
        self.query_attendance(
            "
            SELECT id, session_id, participant_id, day, status, created_at, updated_at
            FROM attendance
            WHERE session_id = ?
            ORDER BY day ASC, participant_id ASC
            ",
            [session_id.get()],
        )
    }

    fn upsert_many(
        &mut self,
        updates: &[AttendanceUpdate],
    ) -> Result<Vec<AttendanceRecord>, DbError> {
        self.upsert_many_at(updates, Utc::now())
    }
}

/// Raw `attendance` row before parsing dates and status.
#[derive(Debug)]
struct AttendanceRow {
    id: i64,
    session_id: i64,
    participant_id: i64,
    day: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl AttendanceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            participant_id: row.get(2)?,
            day: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<AttendanceRecord, DbError> {
        Ok(AttendanceRecord {
            id: RecordId(self.id),
            key: AttendanceKey {
                session_id: SessionId(self.session_id),
                participant_id: ParticipantId(self.participant_id),
                day: parse_date(&self.day, "attendance.day")?,
            },
            status: self.status.parse::<AttendanceStatus>()?,
            created_at: parse_timestamp(&self.created_at, self.id)?,
            updated_at: parse_timestamp(&self.updated_at, self.id)?,
        })
    }
}

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: ParticipantId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
    })
}

fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, column: &'static str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| DbError::InvalidDate {
        column,
        value: value.to_string(),
        source,
    })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str, record_id: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::InvalidTimestamp {
            record_id,
            value: value.to_string(),
            source,
        })
}

fn count(value: i64) -> usize {
    usize::try_from(value).unwrap_or_default()
}
