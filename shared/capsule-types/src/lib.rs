//! Shared types for the capsule planner (client-side core and tooling).
//!
//! The planner never talks to a chain, an oracle or a token list directly; it consumes the
//! collaborator traits in [`collaborators`] and exchanges the data types defined here.

pub mod asset;
pub mod capsule;
pub mod collaborators;
pub mod errors;
pub mod request;
pub mod tx;

pub use asset::{Asset, AssetId, Token, NATIVE_SYMBOL};
pub use capsule::Capsule;
pub use collaborators::{ContractLayer, PriceOracle, TokenRegistry};
pub use errors::{AssetError, ContractError, OracleError};
pub use request::{Beneficiary, CreateCapsuleRequest};
pub use tx::{TxEvent, TxHandle};
