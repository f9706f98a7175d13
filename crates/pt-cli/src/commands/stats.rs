//! Stats command: attendance figures for a session.

use std::io::Write;

use anyhow::Result;
use pt_core::{AttendanceStats, SessionId};
use pt_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, session_id: i64, json: bool) -> Result<()> {
    let stats = pt_core::session_stats(db, SessionId(session_id))?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        write_stats(writer, &stats)?;
    }
    Ok(())
}

/// Human-readable rendering of session statistics.
pub fn write_stats<W: Write>(writer: &mut W, stats: &AttendanceStats) -> Result<()> {
    writeln!(writer, "Session {} attendance", stats.session_id)?;
    writeln!(writer, "Days:          {}", stats.total_days)?;
    writeln!(writer, "Participants:  {}", stats.total_participants)?;
    writeln!(writer, "Possible:      {}", stats.total_possible())?;
    writeln!(writer, "Present:       {}", stats.present_count)?;
    writeln!(writer, "Absent:        {}", stats.absent_count)?;
    writeln!(writer, "Justified:     {}", stats.justified_count)?;
    writeln!(writer, "Rate:          {:.2}%", stats.attendance_rate)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn renders_stats() {
        let stats = AttendanceStats {
            session_id: SessionId(7),
            total_days: 3,
            total_participants: 2,
            present_count: 1,
            absent_count: 0,
            justified_count: 0,
            attendance_rate: pt_core::attendance_rate(1, 6),
        };
        let mut output = Vec::new();
        write_stats(&mut output, &stats).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Session 7 attendance
        Days:          3
        Participants:  2
        Possible:      6
        Present:       1
        Absent:        0
        Justified:     0
        Rate:          16.67%
        ");
    }
}
