//! Budget period ranges.
//!
//! - Chain resolution: which period precedes another, which period covers a date
//! - Date shifting used when a period is copied

pub mod chain;
pub mod shift;

pub use chain::{PeriodSpan, covering_period, previous_period, validate_range};
pub use shift::CalendarOffset;
