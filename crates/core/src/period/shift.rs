//! Calendar offsets between period starts.
//!
//! Copying a period moves its planned transactions by the same calendar distance as
//! the start date moved: whole months first, then the leftover days. Month addition
//! clamps to the last day of shorter months, so Jan 31 plus one month is Feb 28/29.

use chrono::{Days, Months, NaiveDate};

use crate::ledger::LedgerError;

/// A signed distance of whole months plus days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarOffset {
    /// Whole months.
    pub months: i32,
    /// Remaining days after the months are applied.
    pub days: i64,
}

fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let magnitude = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

impl CalendarOffset {
    /// Offset such that `from + offset == to`.
    ///
    /// # Errors
    ///
    /// Returns `DateOutOfRange` if month arithmetic leaves the calendar.
    pub fn between(from: NaiveDate, to: NaiveDate) -> Result<Self, LedgerError> {
        use chrono::Datelike;

        let mut months = (to.year() - from.year()) * 12 + to.month().cast_signed()
            - from.month().cast_signed();
        loop {
            let anchored = add_months(from, months).ok_or(LedgerError::DateOutOfRange(from))?;
            if to >= from && anchored > to {
                months -= 1;
            } else if to < from && anchored < to {
                months += 1;
            } else {
                let days = (to - anchored).num_days();
                return Ok(Self { months, days });
            }
        }
    }

    /// Moves `date` by this offset.
    ///
    /// # Errors
    ///
    /// Returns `DateOutOfRange` if the result is not representable.
    pub fn apply(self, date: NaiveDate) -> Result<NaiveDate, LedgerError> {
        add_months(date, self.months)
            .and_then(|d| add_days(d, self.days))
            .ok_or(LedgerError::DateOutOfRange(date))
    }
}
