use chrono::{Months, NaiveDate};

use crate::errors::{LedgerError, Result};

/// advance a date by whole calendar months.
///
/// The day of month is kept where the target month has it and clamped to
/// that month's last day otherwise, so Jan 31 + 1 month is Feb 28 (or 29).
/// Each offset is taken from the original date, never chained.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LedgerError::InvalidDate {
            message: format!("{} plus {} months is out of range", date, months),
        })
}

/// parse an ISO `YYYY-MM-DD` date as sent by the form
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::MissingStartDate);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|e| LedgerError::InvalidDate {
        message: format!("{:?}: {}", trimmed, e),
    })
}
