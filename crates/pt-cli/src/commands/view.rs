//! View command: the reconciled attendance of a session day.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use pt_core::{AttendanceKey, AttendanceView, ParticipantId, SessionId};
use pt_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    session_id: i64,
    day: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let view = pt_core::view_attendance(db, SessionId(session_id), day)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&view)?)?;
    } else {
        write_view(writer, &view)?;
    }
    Ok(())
}

/// Prints a single participant's row for one day as JSON.
pub fn run_lookup<W: Write>(
    writer: &mut W,
    db: &Database,
    session_id: i64,
    participant_id: i64,
    day: NaiveDate,
) -> Result<()> {
    let row = pt_core::lookup_attendance(
        db,
        AttendanceKey {
            session_id: SessionId(session_id),
            participant_id: ParticipantId(participant_id),
            day,
        },
    )?;
    writeln!(writer, "{}", serde_json::to_string_pretty(&row)?)?;
    Ok(())
}

/// Human-readable rendering of a view.
pub fn write_view<W: Write>(writer: &mut W, view: &AttendanceView) -> Result<()> {
    let session = &view.session;
    writeln!(
        writer,
        "Session {}: {} ({} to {})",
        session.id, session.title, session.start_date, session.end_date
    )?;
    match view
        .session_dates
        .iter()
        .position(|day| *day == view.current_date)
    {
        Some(idx) => writeln!(
            writer,
            "Day: {} ({} of {})",
            view.current_date,
            idx + 1,
            view.session_dates.len()
        )?,
        None => writeln!(writer, "Day: {} (outside session)", view.current_date)?,
    }
    writeln!(writer)?;

    if view.attendance.is_empty() {
        writeln!(writer, "No participants on the roster.")?;
        return Ok(());
    }

    writeln!(writer, "{:>4}  {:<24}  {:<9}  Record", "ID", "Participant", "Status")?;
    for row in &view.attendance {
        let record = row
            .record_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        writeln!(
            writer,
            "{:>4}  {:<24}  {:<9}  {}",
            row.participant_id.get(),
            row.participant_name,
            row.status.as_str(),
            record
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use pt_core::{AttendanceRow, AttendanceStatus, RecordId, Session};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(id: i64, name: &str, status: AttendanceStatus, record: Option<i64>) -> AttendanceRow {
        AttendanceRow {
            participant_id: ParticipantId(id),
            participant_name: name.to_string(),
            participant_email: format!("{}@example.org", name.to_lowercase()),
            status,
            date: date("2024-01-02"),
            session_id: SessionId(7),
            record_id: record.map(RecordId),
        }
    }

    fn view(attendance: Vec<AttendanceRow>, current: &str) -> AttendanceView {
        AttendanceView {
            attendance,
            session: Session {
                id: SessionId(7),
                title: "Soudure TIG".to_string(),
                start_date: date("2024-01-01"),
                end_date: date("2024-01-03"),
            },
            session_dates: vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")],
            current_date: date(current),
        }
    }

    #[test]
    fn renders_rows_with_synthesized_records() {
        let view = view(
            vec![
                row(1, "Amine", AttendanceStatus::Present, Some(12)),
                row(2, "Zoe", AttendanceStatus::Absent, None),
            ],
            "2024-01-02",
        );
        let mut output = Vec::new();
        write_view(&mut output, &view).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Session 7: Soudure TIG (2024-01-01 to 2024-01-03)
        Day: 2024-01-02 (2 of 3)

          ID  Participant               Status     Record
           1  Amine                     present    12
           2  Zoe                       absent     -
        ");
    }

    #[test]
    fn renders_empty_roster() {
        let view = view(Vec::new(), "2024-02-10");
        let mut output = Vec::new();
        write_view(&mut output, &view).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Day: 2024-02-10 (outside session)"));
        assert!(output.contains("No participants on the roster."));
    }
}
