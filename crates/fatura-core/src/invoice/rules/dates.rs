//! Date parsing for invoice fields.
//!
//! Meter reading dates are printed as `DD/MM` without a year. They are resolved
//! against the current calendar year, so readings that span a year boundary
//! (a December reading parsed in January) come out one year off.

use chrono::{Datelike, Local, NaiveDate};

use super::patterns::{DAY_MONTH, READING_DATES};

/// Month abbreviations as printed in the invoice reference field.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

/// Meter reading dates of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingDates {
    /// Previous reading.
    pub last_reading: Option<NaiveDate>,
    /// Current reading.
    pub reading: Option<NaiveDate>,
    /// Days between the previous and the current reading.
    pub days_to_read: u32,
    /// Scheduled next reading.
    pub next_reading: Option<NaiveDate>,
}

/// Parse the reading dates line, resolving dates in the current year.
pub fn parse_reading_dates(line: &str) -> Option<ReadingDates> {
    parse_reading_dates_in_year(line, Local::now().year())
}

/// Parse `DD/MM DD/MM D` anywhere in the line; the line's last five
/// characters are the next reading date.
pub fn parse_reading_dates_in_year(line: &str, year: i32) -> Option<ReadingDates> {
    let caps = READING_DATES.captures(line)?;
    let days_to_read = caps[3].parse().ok()?;

    let line = line.trim_end();
    let tail_start = line
        .char_indices()
        .rev()
        .nth(4)
        .map(|(i, _)| i)
        .unwrap_or(0);

    Some(ReadingDates {
        last_reading: parse_day_month(&caps[1], year),
        reading: parse_day_month(&caps[2], year),
        days_to_read,
        next_reading: parse_day_month(&line[tail_start..], year),
    })
}

/// Parse `DD/MM` in the given year.
pub fn parse_day_month(s: &str, year: i32) -> Option<NaiveDate> {
    let caps = DAY_MONTH.captures(s.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a full `DD/MM/YYYY` date.
pub fn parse_full_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok()
}

/// Two-digit month number for an abbreviation such as `MAR`.
pub fn month_number(abbreviation: &str) -> Option<u32> {
    let abbreviation = abbreviation.trim();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(abbreviation))
        .map(|i| i as u32 + 1)
}

/// Abbreviation for a month number in `1..=12`.
pub fn month_abbreviation(month: u32) -> Option<&'static str> {
    let index = month.checked_sub(1)? as usize;
    MONTH_ABBREVIATIONS.get(index).copied()
}
