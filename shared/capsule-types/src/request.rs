use std::{fmt, str::FromStr};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{asset::Asset, errors::AssetError};

/// Beneficiary as entered by the user.
///
/// Input validation is length-only, so this may hold a 42-character string that is not hex;
/// [`Beneficiary::to_address`] is where it becomes a real address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Beneficiary(String);

impl Beneficiary {
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_address(&self) -> Result<Address, AssetError> {
        Address::from_str(&self.0).map_err(|_| AssetError::InvalidBeneficiary(self.0.clone()))
    }
}

impl fmt::Display for Beneficiary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Arguments of the vault-creation call handed to the contract layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCapsuleRequest {
    pub beneficiary: Beneficiary,
    /// First release, unix seconds.
    pub distribution_date: u64,
    /// Seconds between releases.
    pub period_size: u64,
    pub period_count: u32,
    pub assets: Vec<Asset>,
    pub adding_assets_allowed: bool,
}
