use std::{fmt, str::FromStr};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::AssetError;

/// Symbol (and textual identifier) of the chain's native asset.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Identifies a fungible token by contract address, or the native asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetId {
    Native,
    Token(Address),
}

impl AssetId {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetId::Native)
    }

    /// Contract address for ERC-20 assets; `None` for the native asset.
    pub fn token_address(&self) -> Option<Address> {
        match self {
            AssetId::Native => None,
            AssetId::Token(address) => Some(*address),
        }
    }
}

impl FromStr for AssetId {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NATIVE_SYMBOL) {
            return Ok(AssetId::Native);
        }
        if !s.starts_with("0x") && !s.starts_with("0X") {
            return Err(AssetError::InvalidToken(s.to_string()));
        }
        Address::from_str(s)
            .map(AssetId::Token)
            .map_err(|_| AssetError::InvalidToken(s.to_string()))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Native => f.write_str(NATIVE_SYMBOL),
            AssetId::Token(address) => write!(f, "{address}"),
        }
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An amount of a single asset, held as the decimal string the user entered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAsset")]
pub struct Asset {
    pub token: AssetId,
    pub amount: String,
}

#[derive(Deserialize)]
struct RawAsset {
    token: AssetId,
    amount: String,
}

impl TryFrom<RawAsset> for Asset {
    type Error = AssetError;

    fn try_from(raw: RawAsset) -> Result<Self, Self::Error> {
        Asset::new(raw.token, raw.amount)
    }
}

impl Asset {
    pub fn new(token: AssetId, amount: impl Into<String>) -> Result<Self, AssetError> {
        let amount = amount.into();
        if !is_decimal(&amount) {
            return Err(AssetError::InvalidAmount(amount));
        }
        Ok(Self { token, amount })
    }

    pub fn native(amount: impl Into<String>) -> Result<Self, AssetError> {
        Self::new(AssetId::Native, amount)
    }

    pub fn is_native(&self) -> bool {
        self.token.is_native()
    }

    /// Convert the decimal amount into integer base units (eg wei for 18 decimals).
    pub fn base_units(&self, decimals: u8) -> Result<U256, AssetError> {
        let (int_part, frac_part) = match self.amount.split_once('.') {
            Some((i, f)) => (i, f),
            None => (self.amount.as_str(), ""),
        };
        if frac_part.len() > decimals as usize {
            return Err(AssetError::TooManyDecimals {
                amount: self.amount.clone(),
                decimals,
            });
        }
        let mut digits = String::with_capacity(int_part.len() + decimals as usize);
        digits.push_str(int_part);
        digits.push_str(frac_part);
        digits.extend(std::iter::repeat('0').take(decimals as usize - frac_part.len()));

        U256::from_str_radix(&digits, 10).map_err(|_| AssetError::AmountOverflow(self.amount.clone()))
    }
}

/// `digits` or `digits.digits`; no sign, no exponent.
fn is_decimal(s: &str) -> bool {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.map_or(true, all_digits)
}

/// Token reference data, as published by the token registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: AssetId,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl Token {
    pub fn native() -> Self {
        Self {
            address: AssetId::Native,
            name: "Ether".to_string(),
            symbol: NATIVE_SYMBOL.to_string(),
            decimals: 18,
            logo_uri: Some(
                "https://assets.coingecko.com/coins/images/279/thumb/ethereum.png?1595348880"
                    .to_string(),
            ),
        }
    }
}
