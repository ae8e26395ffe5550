use thiserror::Error;

use crate::asset::AssetId;

/// Errors constructing or converting assets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("invalid token identifier `{0}`")]
    InvalidToken(String),
    #[error("invalid amount `{0}`: expected a non-negative decimal number")]
    InvalidAmount(String),
    #[error("amount `{amount}` has more than {decimals} decimal places")]
    TooManyDecimals { amount: String, decimals: u8 },
    #[error("amount `{0}` does not fit in 256 bits")]
    AmountOverflow(String),
    #[error("beneficiary `{0}` is not a hex-encoded address")]
    InvalidBeneficiary(String),
}

/// Errors reported by the wallet/contract execution layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// No wallet is connected.
    #[error("wallet not connected")]
    NotConnected,
    /// The signer refused to sign/submit.
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The underlying call failed.
    #[error("contract call failed: {0}")]
    CallFailed(String),
}

/// Errors reported by the price oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("price oracle unavailable: {0}")]
    Unavailable(String),
    #[error("no USD price for {0}")]
    MissingPrice(AssetId),
}
