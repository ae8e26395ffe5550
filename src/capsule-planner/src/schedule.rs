//! Release schedule calculation.
//!
//! Release N (1-based) happens at `start + (N - 1) * period`. Calendar steps (monthly, annually)
//! are computed from the start date each time and clamp to the last day of shorter months, so a
//! schedule starting on the 31st releases on the 31st whenever the month has one.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{errors::ScheduleError, utils::calendar::add_months};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    #[default]
    Immediate,
    Staggered,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Annually,
}

impl Frequency {
    /// Nominal period length in seconds, as handed to the capsule contract.
    pub fn period_size(self) -> u64 {
        match self {
            Frequency::Daily => SECONDS_PER_DAY,
            Frequency::Weekly => 7 * SECONDS_PER_DAY,
            Frequency::Monthly => 30 * SECONDS_PER_DAY,
            Frequency::Annually => 365 * SECONDS_PER_DAY,
        }
    }

    /// `start` advanced by `steps` periods.
    pub fn advance(self, start: OffsetDateTime, steps: u32) -> Result<OffsetDateTime, ScheduleError> {
        match self {
            Frequency::Daily => start
                .checked_add(Duration::days(i64::from(steps)))
                .ok_or(ScheduleError::OutOfRange),
            Frequency::Weekly => start
                .checked_add(Duration::weeks(i64::from(steps)))
                .ok_or(ScheduleError::OutOfRange),
            Frequency::Monthly => add_months(start, steps),
            Frequency::Annually => {
                let months = steps.checked_mul(12).ok_or(ScheduleError::OutOfRange)?;
                add_months(start, months)
            }
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PeriodType::Immediate => "immediate",
            PeriodType::Staggered => "staggered",
        })
    }
}

impl FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(PeriodType::Immediate),
            "staggered" => Ok(PeriodType::Staggered),
            other => Err(format!("unknown distribution type `{other}`")),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Annually => "annually",
        })
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "annually" => Ok(Frequency::Annually),
            other => Err(format!("unknown distribution frequency `{other}`")),
        }
    }
}

/// How the capsule's holdings are released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Distribution {
    /// Everything on the start date.
    Immediate,
    /// `periods` equal releases, `frequency` apart. Always at least 2.
    Staggered { frequency: Frequency, periods: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistributionSchedule {
    start: OffsetDateTime,
    distribution: Distribution,
}

impl DistributionSchedule {
    pub fn immediate(start: OffsetDateTime) -> Self {
        Self {
            start,
            distribution: Distribution::Immediate,
        }
    }

    pub fn staggered(
        start: OffsetDateTime,
        frequency: Frequency,
        periods: u32,
    ) -> Result<Self, ScheduleError> {
        if periods < 2 {
            return Err(ScheduleError::TooFewPeriods(periods));
        }
        Ok(Self {
            start,
            distribution: Distribution::Staggered { frequency, periods },
        })
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn period_type(&self) -> PeriodType {
        match self.distribution {
            Distribution::Immediate => PeriodType::Immediate,
            Distribution::Staggered { .. } => PeriodType::Staggered,
        }
    }

    pub fn period_count(&self) -> u32 {
        match self.distribution {
            Distribution::Immediate => 1,
            Distribution::Staggered { periods, .. } => periods,
        }
    }

    pub fn frequency(&self) -> Option<Frequency> {
        match self.distribution {
            Distribution::Immediate => None,
            Distribution::Staggered { frequency, .. } => Some(frequency),
        }
    }

    /// Instant of release `n` (1-based).
    pub fn release_instant(&self, n: u32) -> Result<OffsetDateTime, ScheduleError> {
        if n == 0 || n > self.period_count() {
            return Err(ScheduleError::OutOfRange);
        }
        match self.distribution {
            Distribution::Immediate => Ok(self.start),
            Distribution::Staggered { frequency, .. } => frequency.advance(self.start, n - 1),
        }
    }

    pub fn release_instants(&self) -> Result<Vec<OffsetDateTime>, ScheduleError> {
        (1..=self.period_count())
            .map(|n| self.release_instant(n))
            .collect()
    }

    pub fn final_release(&self) -> Result<OffsetDateTime, ScheduleError> {
        self.release_instant(self.period_count())
    }
}

/// Build the schedule for validated user choices.
///
/// Immediate ignores `frequency` and `period_count` entirely.
pub fn calculate(
    period_type: PeriodType,
    frequency: Frequency,
    period_count: u32,
    start: OffsetDateTime,
) -> Result<DistributionSchedule, ScheduleError> {
    match period_type {
        PeriodType::Immediate => Ok(DistributionSchedule::immediate(start)),
        PeriodType::Staggered => DistributionSchedule::staggered(start, frequency, period_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_immediate_forces_single_period() {
        let start = datetime!(2030-05-01 0:00 UTC);
        let schedule = calculate(PeriodType::Immediate, Frequency::Weekly, 12, start).unwrap();
        assert_eq!(schedule.period_count(), 1);
        assert_eq!(schedule.frequency(), None);
        assert_eq!(schedule.release_instants().unwrap(), vec![start]);
    }

    #[test]
    fn test_staggered_rejects_single_period() {
        let start = datetime!(2030-05-01 0:00 UTC);
        assert_eq!(
            calculate(PeriodType::Staggered, Frequency::Daily, 1, start),
            Err(ScheduleError::TooFewPeriods(1))
        );
        assert_eq!(
            calculate(PeriodType::Staggered, Frequency::Daily, 0, start),
            Err(ScheduleError::TooFewPeriods(0))
        );
    }

    #[test]
    fn test_monthly_releases() {
        let start = datetime!(2030-03-15 0:00 UTC);
        let schedule = calculate(PeriodType::Staggered, Frequency::Monthly, 4, start).unwrap();
        assert_eq!(
            schedule.release_instants().unwrap(),
            vec![
                datetime!(2030-03-15 0:00 UTC),
                datetime!(2030-04-15 0:00 UTC),
                datetime!(2030-05-15 0:00 UTC),
                datetime!(2030-06-15 0:00 UTC),
            ]
        );
    }

    #[test]
    fn test_monthly_month_end_clamps_from_start() {
        let start = datetime!(2030-01-31 0:00 UTC);
        let schedule = calculate(PeriodType::Staggered, Frequency::Monthly, 3, start).unwrap();
        assert_eq!(
            schedule.release_instants().unwrap(),
            vec![
                datetime!(2030-01-31 0:00 UTC),
                datetime!(2030-02-28 0:00 UTC),
                datetime!(2030-03-31 0:00 UTC),
            ]
        );
    }

    #[test]
    fn test_daily_weekly_annually() {
        let start = datetime!(2032-02-29 0:00 UTC);

        let daily = calculate(PeriodType::Staggered, Frequency::Daily, 2, start).unwrap();
        assert_eq!(daily.final_release().unwrap(), datetime!(2032-03-01 0:00 UTC));

        let weekly = calculate(PeriodType::Staggered, Frequency::Weekly, 3, start).unwrap();
        assert_eq!(weekly.final_release().unwrap(), datetime!(2032-03-14 0:00 UTC));

        let annually = calculate(PeriodType::Staggered, Frequency::Annually, 2, start).unwrap();
        assert_eq!(annually.final_release().unwrap(), datetime!(2033-02-28 0:00 UTC));
    }

    #[test]
    fn test_release_instant_bounds() {
        let start = datetime!(2030-01-01 0:00 UTC);
        let schedule = calculate(PeriodType::Staggered, Frequency::Daily, 2, start).unwrap();
        assert_eq!(schedule.release_instant(0), Err(ScheduleError::OutOfRange));
        assert_eq!(schedule.release_instant(3), Err(ScheduleError::OutOfRange));
    }

    #[test]
    fn test_period_sizes() {
        assert_eq!(Frequency::Daily.period_size(), 86_400);
        assert_eq!(Frequency::Weekly.period_size(), 604_800);
        assert_eq!(Frequency::Monthly.period_size(), 2_592_000);
        assert_eq!(Frequency::Annually.period_size(), 31_536_000);
    }

    #[test]
    fn test_parse_choices() {
        assert_eq!("Staggered".parse::<PeriodType>(), Ok(PeriodType::Staggered));
        assert_eq!("annually".parse::<Frequency>(), Ok(Frequency::Annually));
        assert!("fortnightly".parse::<Frequency>().is_err());
    }
}
