use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::asset::Asset;

/// A capsule as reported by the contract layer (read side only).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capsule {
    pub id: U256,
    pub beneficiary: Address,
    #[serde(with = "time::serde::rfc3339")]
    pub distribution_date: OffsetDateTime,
    pub assets: Vec<Asset>,
    /// Everything claimable has already been withdrawn.
    pub empty: bool,
}

impl Capsule {
    /// A capsule opens at its distribution date (inclusive).
    pub fn is_open(&self, now: OffsetDateTime) -> bool {
        now >= self.distribution_date
    }
}
