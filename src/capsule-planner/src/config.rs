//! Planner configuration.

use std::time::Duration;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::valuation::PLACEHOLDER;

/// Allowance granted by an approval: effectively unlimited for any realistic deposit.
pub fn default_approval_amount() -> U256 {
    U256::from(9_999_999_999_999_999_999_999_999_999u128)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Allowance requested in each approval transaction.
    pub approval_amount: U256,
    /// Maximum number of non-zero units shown by the countdown.
    pub countdown_units: usize,
    /// Countdown refresh interval.
    pub tick_interval_ms: u64,
    /// Shown instead of a USD value until the oracle answers.
    pub valuation_placeholder: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            approval_amount: default_approval_amount(),
            countdown_units: 2,
            tick_interval_ms: 1_000,
            valuation_placeholder: PLACEHOLDER.to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
