//! Solidity ABI for the calls the contract layer executes on the planner's behalf.
//!
//! Encoding lives here so hosts (and the CLI) submit exactly what the planner validated.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use capsule_types::{AssetId, CreateCapsuleRequest, Token, TokenRegistry};

use crate::errors::AbiError;

sol! {
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface ICapsule {
        function createCapsule(
            address beneficiary,
            uint256 distributionDate,
            uint256 periodSize,
            uint256 periodCount,
            address[] tokens,
            uint256[] values,
            bool addingAssetsAllowed
        ) external payable returns (uint256);
    }
}

/// Calldata plus the native value to attach.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedCall {
    pub data: Vec<u8>,
    pub value: U256,
}

pub fn encode_allowance(owner: Address, spender: Address) -> Vec<u8> {
    IERC20::allowanceCall { owner, spender }.abi_encode()
}

pub fn encode_approve(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

/// Encode `createCapsule`; native amounts become the call value, token amounts are converted
/// to base units with the registry's decimals.
pub fn encode_create_capsule<R>(
    request: &CreateCapsuleRequest,
    registry: &R,
) -> Result<EncodedCall, AbiError>
where
    R: TokenRegistry + ?Sized,
{
    let beneficiary = request.beneficiary.to_address()?;
    let mut tokens = Vec::new();
    let mut values = Vec::new();
    let mut value = U256::ZERO;

    for asset in &request.assets {
        match asset.token {
            AssetId::Native => {
                let wei = asset.base_units(Token::native().decimals)?;
                value = value.checked_add(wei).ok_or(AbiError::ValueOverflow)?;
            }
            AssetId::Token(address) => {
                let token = registry
                    .lookup(&asset.token)
                    .ok_or(AbiError::UnknownToken(asset.token))?;
                tokens.push(address);
                values.push(asset.base_units(token.decimals)?);
            }
        }
    }

    let call = ICapsule::createCapsuleCall {
        beneficiary,
        distributionDate: U256::from(request.distribution_date),
        periodSize: U256::from(request.period_size),
        periodCount: U256::from(request.period_count),
        tokens,
        values,
        addingAssetsAllowed: request.adding_assets_allowed,
    };
    Ok(EncodedCall {
        data: call.abi_encode(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TokenList;
    use capsule_types::{Asset, Beneficiary};

    const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
    const BENEFICIARY: &str = "0x07d48BDBA7975f0DAF73BD5b85A2E3Ff87ffb24e";

    fn dai_list() -> TokenList {
        TokenList::new(vec![Token {
            address: DAI.parse().unwrap(),
            name: "Dai".into(),
            symbol: "DAI".into(),
            decimals: 18,
            logo_uri: None,
        }])
    }

    fn request(assets: Vec<Asset>) -> CreateCapsuleRequest {
        CreateCapsuleRequest {
            beneficiary: Beneficiary::new_unchecked(BENEFICIARY),
            distribution_date: 1_893_456_000,
            period_size: 2_592_000,
            period_count: 4,
            assets,
            adding_assets_allowed: true,
        }
    }

    #[test]
    fn test_erc20_selectors() {
        let approve = encode_approve(Address::ZERO, U256::MAX);
        assert_eq!(&approve[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(approve.len(), 4 + 32 * 2);

        let allowance = encode_allowance(Address::ZERO, Address::ZERO);
        assert_eq!(&allowance[..4], &[0xdd, 0x62, 0xed, 0x3e]);
    }

    #[test]
    fn test_create_capsule_round_trip() {
        let assets = vec![
            Asset::native("0.5").unwrap(),
            Asset::new(DAI.parse().unwrap(), "100").unwrap(),
        ];
        let encoded = encode_create_capsule(&request(assets), &dai_list()).unwrap();
        assert_eq!(encoded.value, U256::from(500_000_000_000_000_000u128));
        assert_eq!(&encoded.data[..4], ICapsule::createCapsuleCall::SELECTOR.as_slice());

        let decoded = ICapsule::createCapsuleCall::abi_decode(&encoded.data, true).unwrap();
        assert_eq!(decoded.beneficiary, BENEFICIARY.parse::<Address>().unwrap());
        assert_eq!(decoded.periodCount, U256::from(4u64));
        assert_eq!(decoded.tokens, vec![DAI.parse::<Address>().unwrap()]);
        assert_eq!(
            decoded.values,
            vec![U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64))]
        );
        assert!(decoded.addingAssetsAllowed);
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let stray: AssetId = "0x0000000000000000000000000000000000000001".parse().unwrap();
        let assets = vec![Asset::new(stray, "1").unwrap()];
        assert_eq!(
            encode_create_capsule(&request(assets), &TokenList::default()),
            Err(AbiError::UnknownToken(stray))
        );
    }

    #[test]
    fn test_non_hex_beneficiary_is_rejected_at_encoding() {
        let mut req = request(vec![]);
        req.beneficiary = Beneficiary::new_unchecked("z".repeat(42));
        assert!(matches!(
            encode_create_capsule(&req, &TokenList::default()),
            Err(AbiError::Asset(_))
        ));
    }
}
