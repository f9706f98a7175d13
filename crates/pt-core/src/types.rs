//! Core type definitions for sessions, participants and attendance records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::status::AttendanceStatus;

/// Generates an integer ID newtype with common trait implementations.
macro_rules! define_int_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw integer value.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_int_id!(
    /// Identifier of a training session owned by the session directory.
    SessionId
);

define_int_id!(
    /// Identifier of a participant owned by the participant directory.
    ParticipantId
);

define_int_id!(
    /// Storage surrogate of an attendance record.
    ///
    /// Only surfaced to clients; business logic keys records by [`AttendanceKey`].
    RecordId
);

/// A scheduled training session. Read-only to the attendance core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A member of the organization-wide trackable roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Composite identity of an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttendanceKey {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub day: NaiveDate,
}

impl fmt::Display for AttendanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session {} / participant {} / {}",
            self.session_id, self.participant_id, self.day
        )
    }
}

/// A stored attendance record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub key: AttendanceKey,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated write targeting one composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceUpdate {
    pub key: AttendanceKey,
    pub status: AttendanceStatus,
}
