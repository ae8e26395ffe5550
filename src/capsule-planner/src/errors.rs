use std::fmt;

use alloy_primitives::Address;
use capsule_types::{AssetError, AssetId, OracleError};
use thiserror::Error;

use crate::approvals::ApprovalStatus;

/// A single field-level input problem, displayed inline next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Incorrect Date format")]
    DateFormat,
    #[error("Date must be in future")]
    PastDate,
    #[error("Invalid Address")]
    AddressFormat,
    #[error("Invalid Number")]
    PeriodFormat,
    #[error("Periods must be a positive number")]
    PeriodRange,
    #[error("For only one period, use an Immediate Capsule")]
    SinglePeriod,
}

/// Every field-level error of a draft at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub date: Option<InputError>,
    pub beneficiary: Option<InputError>,
    pub periods: Option<InputError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.beneficiary.is_none() && self.periods.is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, InputError)> + '_ {
        [
            ("date", self.date),
            ("beneficiary", self.beneficiary),
            ("periods", self.periods),
        ]
        .into_iter()
        .filter_map(|(field, err)| err.map(|e| (field, e)))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, err) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {err}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors building a distribution schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("a staggered schedule needs at least 2 periods, got {0}")]
    TooFewPeriods(u32),
    #[error("release date out of range")]
    OutOfRange,
}

/// A transition the approval state machine refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("no approval record for {0}")]
    UnknownAsset(Address),
    #[error("{token} is {actual:?}, expected {expected}")]
    InvalidTransition {
        token: Address,
        actual: ApprovalStatus,
        expected: &'static str,
    },
    #[error("approval for {0} is still pending")]
    AlreadyPending(Address),
    #[error("{0} is not the next asset to approve")]
    NotOffered(Address),
}

/// Errors surfaced by the creation flow's action entry points.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("capsule draft is invalid: {0}")]
    Invalid(ValidationErrors),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("{0} asset(s) still need approval")]
    ApprovalsOutstanding(usize),
    #[error("a transaction is already in flight")]
    Busy,
    #[error("capsule already created")]
    AlreadyComplete,
    #[error(transparent)]
    Orchestrator(#[from] ApprovalError),
    #[error("approval failed: {0}")]
    Approval(String),
    #[error("capsule creation failed: {0}")]
    Creation(String),
}

/// Why a valuation is showing the placeholder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("oracle returned an unusable value: {0}")]
    InvalidValue(f64),
}

/// Errors encoding contract calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("no token metadata for {0}")]
    UnknownToken(AssetId),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("native value overflows uint256")]
    ValueOverflow,
}

/// Errors loading a token list.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed parsing token list: {0}")]
    Parse(#[from] serde_json::Error),
}
