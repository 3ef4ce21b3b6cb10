//! Date window for call log queries

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;
use crate::AppResult;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting `end < start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if end < start {
            return Err(AppError::InvalidDateWindow(format!(
                "end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` dates
    pub fn parse(start: &str, end: &str) -> AppResult<Self> {
        Self::new(parse_day(start)?, parse_day(end)?)
    }

    /// Parse a `YYYY-MM-DD - YYYY-MM-DD` range as written into spreadsheet cells
    pub fn parse_range(text: &str) -> Option<Self> {
        let (start, end) = text.trim().split_once(" - ")?;
        Self::parse(start, end).ok()
    }

    /// First instant of the window
    pub fn start_bound(&self) -> NaiveDateTime {
        self.start.and_time(chrono::NaiveTime::MIN)
    }

    /// First instant after the window
    pub fn end_bound(&self) -> NaiveDateTime {
        self.end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end)
            .and_time(chrono::NaiveTime::MIN)
    }

    pub fn contains(&self, at: &NaiveDateTime) -> bool {
        *at >= self.start_bound() && *at < self.end_bound()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn parse_day(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| AppError::InvalidDateWindow(format!("'{}': {}", s.trim(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_rejects_reversed_dates() {
        let result = DateWindow::parse("2024-02-01", "2024-01-01");
        assert!(matches!(result, Err(AppError::InvalidDateWindow(_))));
    }

    #[test]
    fn test_window_bounds_are_inclusive_days() {
        let window = DateWindow::parse("2024-01-01", "2024-01-31").unwrap();
        let last_second = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let next_day = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert!(window.contains(&window.start_bound()));
        assert!(window.contains(&last_second));
        assert!(!window.contains(&next_day));
        assert_eq!(window.end_bound(), next_day);
    }

    #[test]
    fn test_parse_range() {
        let window = DateWindow::parse_range(" 2024-01-01 - 2024-01-31 ").unwrap();
        assert_eq!(window.to_string(), "2024-01-01 - 2024-01-31");

        assert!(DateWindow::parse_range("2024-01-05").is_none());
        assert!(DateWindow::parse_range("2024-01-31 - 2024-01-01").is_none());
        assert!(DateWindow::parse_range("yesterday - today").is_none());
    }
}
