use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::{
    asset::{Asset, AssetId, Token},
    errors::{ContractError, OracleError},
    request::CreateCapsuleRequest,
    tx::TxHandle,
};

/// Wallet/contract execution layer.
///
/// The spender of every allowance is the capsule contract, which the implementation knows.
#[async_trait]
pub trait ContractLayer: Send + Sync {
    /// Whether the capsule contract may already move `token` on the user's behalf.
    async fn query_allowance(&self, token: Address) -> Result<bool, ContractError>;

    /// Submit `approve(capsule, amount)` on `token`.
    async fn submit_approval(&self, token: Address, amount: U256)
        -> Result<TxHandle, ContractError>;

    async fn submit_capsule_creation(
        &self,
        request: CreateCapsuleRequest,
    ) -> Result<TxHandle, ContractError>;
}

/// USD price oracle.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn usd_valuation(&self, assets: &[Asset]) -> Result<f64, OracleError>;
}

/// Token metadata lookup.
pub trait TokenRegistry {
    fn lookup(&self, id: &AssetId) -> Option<Token>;

    /// Display symbol, falling back to the identifier itself for unknown tokens.
    fn symbol(&self, id: &AssetId) -> String {
        self.lookup(id)
            .map(|token| token.symbol)
            .unwrap_or_else(|| id.to_string())
    }
}
