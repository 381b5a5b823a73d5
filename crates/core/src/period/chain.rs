//! Period chain resolution.

use chrono::NaiveDate;
use kasa_shared::types::BudgetPeriodId;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// The date range of a budget period. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSpan {
    /// Period identity.
    pub id: BudgetPeriodId,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
}

impl PeriodSpan {
    /// True if `date` falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Rejects ranges whose start is after their end.
///
/// # Errors
///
/// Returns `InvalidDateRange`.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), LedgerError> {
    if start > end {
        return Err(LedgerError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Finds the period immediately before `current` among same-account `candidates`.
///
/// Candidates must end strictly before `current` starts. The latest `end_date` wins;
/// on a tie the highest id wins.
#[must_use]
pub fn previous_period<'a>(
    current: &PeriodSpan,
    candidates: &'a [PeriodSpan],
) -> Option<&'a PeriodSpan> {
    candidates
        .iter()
        .filter(|c| c.id != current.id && c.end_date < current.start_date)
        .max_by_key(|c| (c.end_date, c.id))
}

/// Finds the period whose range contains `date`.
///
/// Overlaps are not prevented, so the latest `start_date` wins, then the highest id.
#[must_use]
pub fn covering_period(date: NaiveDate, candidates: &[PeriodSpan]) -> Option<&PeriodSpan> {
    candidates
        .iter()
        .filter(|c| c.contains(date))
        .max_by_key(|c| (c.start_date, c.id))
}
