//! UTC calendar-month arithmetic (day-of-month clamped, no drift).
//!
//! - add_months(t, k) = t's date moved k calendar months, day clamped to the last valid day
//! - time of day and offset are preserved

use time::{util::days_in_year_month, Date, Month, OffsetDateTime};

use crate::errors::ScheduleError;

pub fn add_months(start: OffsetDateTime, months: u32) -> Result<OffsetDateTime, ScheduleError> {
    let date = start.date();
    let base = i64::from(date.year()) * 12 + i64::from(u8::from(date.month())) - 1;
    let next = base
        .checked_add(i64::from(months))
        .ok_or(ScheduleError::OutOfRange)?;

    let year = i32::try_from(next.div_euclid(12)).map_err(|_| ScheduleError::OutOfRange)?;
    let month = u8::try_from(next.rem_euclid(12) + 1)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or(ScheduleError::OutOfRange)?;

    let day = date.day().min(days_in_year_month(year, month));
    let date = Date::from_calendar_date(year, month, day).map_err(|_| ScheduleError::OutOfRange)?;
    Ok(start.replace_date(date))
}

/// Whole calendar months from `from` to `to` (0 when `to` is not after `from`).
pub fn months_between(from: OffsetDateTime, to: OffsetDateTime) -> u32 {
    if to <= from {
        return 0;
    }
    let index = |t: OffsetDateTime| i64::from(t.year()) * 12 + i64::from(u8::from(t.month()));
    let mut months = u32::try_from(index(to) - index(from)).unwrap_or(0);
    // One step back is enough: k - 1 months lands in the month before `to`.
    if months > 0 && add_months(from, months).map_or(true, |t| t > to) {
        months -= 1;
    }
    months
}
