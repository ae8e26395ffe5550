//! Input validation.
//!
//! Pure checks of raw input strings; "now" is always passed in. Each check maps to the
//! field-level [`InputError`] the presentation layer shows next to the field.

use capsule_types::Beneficiary;
use time::{Date, Month, OffsetDateTime};

use crate::{
    draft::{CapsuleDraft, ValidatedDraft},
    errors::{InputError, ValidationErrors},
    schedule::{self, PeriodType},
};

/// `0x` + 40 hex characters.
pub const ADDRESS_LENGTH: usize = 42;

/// Parse `mm/dd/yyyy` into UTC midnight of that day; it must be strictly after `now`.
pub fn validate_date(raw: &str, now: OffsetDateTime) -> Result<OffsetDateTime, InputError> {
    let date = parse_date(raw).ok_or(InputError::DateFormat)?;
    let instant = date.midnight().assume_utc();
    if instant <= now {
        return Err(InputError::PastDate);
    }
    Ok(instant)
}

fn parse_date(raw: &str) -> Option<Date> {
    let mut parts = raw.trim().split('/');
    let (month, day, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let numeric = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !numeric(month, 1, 2) || !numeric(day, 1, 2) || !numeric(year, 4, 4) {
        return None;
    }

    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok()
}

/// Length-only: anything exactly 42 characters long is accepted.
pub fn validate_address(raw: &str) -> Result<Beneficiary, InputError> {
    if raw.chars().count() != ADDRESS_LENGTH {
        return Err(InputError::AddressFormat);
    }
    Ok(Beneficiary::new_unchecked(raw))
}

/// Number of staggered periods: a whole number of at least 2.
///
/// The input is read as a number first, so `"1.0"` is a single period and `"-0.5"` is out of
/// range; only then must it be whole and fit in a `u32`.
pub fn validate_periods(raw: &str) -> Result<u32, InputError> {
    let raw = raw.trim();
    // Blank input counts as zero.
    if raw.is_empty() {
        return Err(InputError::PeriodRange);
    }
    let periods: f64 = raw.parse().map_err(|_| InputError::PeriodFormat)?;
    if periods.is_nan() {
        return Err(InputError::PeriodFormat);
    }
    if periods <= 0.0 {
        return Err(InputError::PeriodRange);
    }
    if periods == 1.0 {
        return Err(InputError::SinglePeriod);
    }
    if periods.fract() != 0.0 || periods > f64::from(u32::MAX) {
        return Err(InputError::PeriodFormat);
    }
    Ok(periods as u32)
}

/// Run every check over `draft`, collecting all field errors.
pub fn validate(draft: &CapsuleDraft, now: OffsetDateTime) -> Result<ValidatedDraft, ValidationErrors> {
    let date = validate_date(&draft.distribution_date, now);
    let beneficiary = validate_address(&draft.beneficiary);
    let periods = match draft.period_type {
        PeriodType::Immediate => Ok(1),
        PeriodType::Staggered => validate_periods(&draft.period_count),
    };

    let (start, beneficiary, periods) = match (date, beneficiary, periods) {
        (Ok(start), Ok(beneficiary), Ok(periods)) => (start, beneficiary, periods),
        (date, beneficiary, periods) => {
            return Err(ValidationErrors {
                date: date.err(),
                beneficiary: beneficiary.err(),
                periods: periods.err(),
            })
        }
    };

    let schedule = schedule::calculate(draft.period_type, draft.frequency, periods, start)
        .map_err(|_| ValidationErrors {
            periods: Some(InputError::SinglePeriod),
            ..ValidationErrors::default()
        })?;

    Ok(ValidatedDraft {
        beneficiary,
        schedule,
        frequency: draft.frequency,
        assets: draft.assets.clone(),
        adding_assets_allowed: draft.adding_assets_allowed,
    })
}
