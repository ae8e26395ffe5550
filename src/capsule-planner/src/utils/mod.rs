//! Small deterministic helpers shared by the schedule, countdown and valuation modules.

pub mod calendar;
pub mod format;
