//! Session date range expansion.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::Session;

/// The start date of a range falls after its end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid date range: {start} is after {end}")]
pub struct InvalidRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Expands `[start, end]` into every calendar day, inclusive and ascending.
///
/// No weekday or holiday filtering is applied.
pub fn expand_date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, InvalidRange> {
    if start > end {
        return Err(InvalidRange { start, end });
    }
    Ok(start.iter_days().take_while(|day| *day <= end).collect())
}

/// The attendance days of a session.
pub fn session_dates(session: &Session) -> Result<Vec<NaiveDate>, InvalidRange> {
    expand_date_range(session.start_date, session.end_date)
}

/// Picks the day to show when the caller did not ask for one.
///
/// Today if the session is running, otherwise the session's first day.
pub fn default_day(session: &Session, today: NaiveDate) -> NaiveDate {
    if (session.start_date..=session.end_date).contains(&today) {
        today
    } else {
        session.start_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::SessionId;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn session(start: &str, end: &str) -> Session {
        Session {
            id: SessionId(1),
            title: "Soudure".to_string(),
            start_date: date(start),
            end_date: date(end),
        }
    }

    #[test]
    fn expands_inclusive_range_without_gaps() {
        let days = expand_date_range(date("2024-02-27"), date("2024-03-02")).unwrap();
        assert_eq!(
            days,
            vec![
                date("2024-02-27"),
                date("2024-02-28"),
                date("2024-02-29"),
                date("2024-03-01"),
                date("2024-03-02"),
            ]
        );
    }

    #[test]
    fn length_matches_day_difference() {
        let start = date("2023-12-15");
        for offset in [0_i64, 1, 6, 30, 365] {
            let end = start + chrono::Duration::days(offset);
            let days = expand_date_range(start, end).unwrap();
            assert_eq!(i64::try_from(days.len()).unwrap(), offset + 1);
            assert!(days.windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
            assert_eq!(days.first(), Some(&start));
            assert_eq!(days.last(), Some(&end));
        }
    }

    #[test]
    fn single_day_range() {
        let days = expand_date_range(date("2024-01-01"), date("2024-01-01")).unwrap();
        assert_eq!(days, vec![date("2024-01-01")]);
    }

    #[test]
    fn inverted_range_fails() {
        let err = expand_date_range(date("2024-01-03"), date("2024-01-01")).unwrap_err();
        assert_eq!(
            err,
            InvalidRange {
                start: date("2024-01-03"),
                end: date("2024-01-01"),
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid date range: 2024-01-03 is after 2024-01-01"
        );
    }

    #[test]
    fn default_day_is_today_while_session_runs() {
        let s = session("2024-01-01", "2024-01-05");
        assert_eq!(default_day(&s, date("2024-01-01")), date("2024-01-01"));
        assert_eq!(default_day(&s, date("2024-01-03")), date("2024-01-03"));
        assert_eq!(default_day(&s, date("2024-01-05")), date("2024-01-05"));
    }

    #[test]
    fn default_day_falls_back_to_start_outside_session() {
        let s = session("2024-01-01", "2024-01-05");
        assert_eq!(default_day(&s, date("2023-12-31")), date("2024-01-01"));
        assert_eq!(default_day(&s, date("2024-06-01")), date("2024-01-01"));
    }
}
