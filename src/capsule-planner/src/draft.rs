use capsule_types::{Asset, Beneficiary, CreateCapsuleRequest};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    errors::{ScheduleError, ValidationErrors},
    schedule::{DistributionSchedule, Frequency, PeriodType},
    validation,
};

/// Raw, user-entered state of a capsule that has not been created yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapsuleDraft {
    pub period_type: PeriodType,
    /// `mm/dd/yyyy`, as typed.
    pub distribution_date: String,
    /// Only read for staggered capsules.
    pub frequency: Frequency,
    /// Only read for staggered capsules.
    pub period_count: String,
    pub beneficiary: String,
    /// Insertion order is approval order.
    pub assets: Vec<Asset>,
    pub adding_assets_allowed: bool,
}

impl Default for CapsuleDraft {
    fn default() -> Self {
        Self {
            period_type: PeriodType::default(),
            distribution_date: String::new(),
            frequency: Frequency::default(),
            period_count: String::new(),
            beneficiary: String::new(),
            assets: Vec::new(),
            adding_assets_allowed: true,
        }
    }
}

impl CapsuleDraft {
    pub fn validate(&self, now: OffsetDateTime) -> Result<ValidatedDraft, ValidationErrors> {
        validation::validate(self, now)
    }
}

/// A draft that passed every input check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedDraft {
    pub beneficiary: Beneficiary,
    pub schedule: DistributionSchedule,
    /// Frequency as selected, even for immediate capsules (the contract still takes a period size).
    pub frequency: Frequency,
    pub assets: Vec<Asset>,
    pub adding_assets_allowed: bool,
}

impl ValidatedDraft {
    pub fn into_request(self) -> Result<CreateCapsuleRequest, ScheduleError> {
        let period_size = self
            .schedule
            .frequency()
            .unwrap_or(self.frequency)
            .period_size();
        let distribution_date = u64::try_from(self.schedule.start().unix_timestamp())
            .map_err(|_| ScheduleError::OutOfRange)?;

        Ok(CreateCapsuleRequest {
            beneficiary: self.beneficiary,
            distribution_date,
            period_size,
            period_count: self.schedule.period_count(),
            assets: self.assets,
            adding_assets_allowed: self.adding_assets_allowed,
        })
    }
}
