//! Import command for seeding sessions and participants into the local `SQLite` store.
//!
//! Reads JSON lines from stdin, one record per line:
//!
//! ```text
//! {"kind":"session","id":7,"title":"Soudure","start_date":"2024-01-01","end_date":"2024-01-03"}
//! {"kind":"participant","id":1,"name":"Amine","email":"amine@example.org"}
//! ```
//!
//! Records are upserted by id. A participant without `role` gets the
//! configured roster role.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use pt_core::{Participant, ParticipantId, Session, SessionId};
use pt_db::Database;

/// Counts of imported records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub sessions: usize,
    pub participants: usize,
}

pub fn run(db: &mut Database, default_role: &str) -> Result<ImportSummary> {
    let stdin = io::stdin();
    let records = parse_records(stdin.lock(), default_role)?;
    apply(db, &records)
}

/// A directory record ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRecord {
    Session(Session),
    Participant(Participant),
}

pub fn apply(db: &mut Database, records: &[DirectoryRecord]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for record in records {
        match record {
            DirectoryRecord::Session(session) => {
                db.upsert_session(session)
                    .with_context(|| format!("failed to import session {}", session.id))?;
                summary.sessions += 1;
            }
            DirectoryRecord::Participant(participant) => {
                db.upsert_participant(participant)
                    .with_context(|| format!("failed to import participant {}", participant.id))?;
                summary.participants += 1;
            }
        }
    }
    tracing::debug!(
        sessions = summary.sessions,
        participants = summary.participants,
        "imported directory records"
    );
    Ok(summary)
}

fn parse_records<R: BufRead>(reader: R, default_role: &str) -> Result<Vec<DirectoryRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: ImportRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        let record = parsed
            .into_record(default_role)
            .with_context(|| format!("invalid record on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ImportRecord {
    Session {
        id: i64,
        title: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    Participant {
        id: i64,
        name: String,
        #[serde(default)]
        email: String,
        #[serde(default)]
        role: Option<String>,
    },
}

impl ImportRecord {
    fn into_record(self, default_role: &str) -> Result<DirectoryRecord> {
        match self {
            Self::Session {
                id,
                title,
                start_date,
                end_date,
            } => {
                if start_date > end_date {
                    anyhow::bail!(
                        "session {id} starts on {start_date} after it ends on {end_date}"
                    );
                }
                Ok(DirectoryRecord::Session(Session {
                    id: SessionId(id),
                    title,
                    start_date,
                    end_date,
                }))
            }
            Self::Participant {
                id,
                name,
                email,
                role,
            } => {
                if name.trim().is_empty() {
                    anyhow::bail!("missing name");
                }
                let role = role
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| default_role.to_string());
                Ok(DirectoryRecord::Participant(Participant {
                    id: ParticipantId(id),
                    name,
                    email,
                    role,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use pt_core::ParticipantDirectory;

    const INPUT: &str = r#"
{"kind":"session","id":7,"title":"Soudure","start_date":"2024-01-01","end_date":"2024-01-03"}
{"kind":"participant","id":1,"name":"Amine","email":"amine@example.org"}
{"kind":"participant","id":2,"name":"Farid","email":"farid@example.org","role":"formateur"}
"#;

    #[test]
    fn parse_records_applies_default_role() {
        let records = parse_records(Cursor::new(INPUT), "participant").unwrap();
        assert_eq!(records.len(), 3);
        let DirectoryRecord::Participant(amine) = &records[1] else {
            panic!("expected participant");
        };
        assert_eq!(amine.role, "participant");
        let DirectoryRecord::Participant(farid) = &records[2] else {
            panic!("expected participant");
        };
        assert_eq!(farid.role, "formateur");
    }

    #[test]
    fn parse_records_rejects_inverted_session() {
        let input = r#"{"kind":"session","id":1,"title":"x","start_date":"2024-01-05","end_date":"2024-01-01"}"#;
        let err = parse_records(Cursor::new(input), "participant").unwrap_err();
        assert!(err.to_string().contains("invalid record on line 1"));
    }

    #[test]
    fn parse_records_rejects_unknown_kind() {
        let input = r#"{"kind":"region","id":1}"#;
        let err = parse_records(Cursor::new(input), "participant").unwrap_err();
        assert!(err.to_string().contains("invalid JSON on line 1"));
    }

    #[test]
    fn apply_seeds_directories() {
        let mut db = Database::open_in_memory().unwrap();
        let records = parse_records(Cursor::new(INPUT), "participant").unwrap();
        let summary = apply(&mut db, &records).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                sessions: 1,
                participants: 2,
            }
        );
        let roster = db.list_trackable_participants().unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Amine");
    }
}
