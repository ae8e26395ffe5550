//! Scripted collaborators for unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use capsule_types::{
    Asset, ContractError, ContractLayer, CreateCapsuleRequest, OracleError, PriceOracle, TxEvent,
    TxHandle,
};

#[derive(Default)]
struct ContractState {
    allowances: HashMap<Address, bool>,
    /// Approvals that confirm on-chain but leave the allowance untouched.
    ineffective: HashSet<Address>,
    allowance_queries: Vec<Address>,
    approvals: Vec<(Address, U256)>,
    creations: Vec<CreateCapsuleRequest>,
    fail_next_approval: Option<String>,
    fail_next_creation: Option<String>,
    reject_next_submission: Option<ContractError>,
}

/// Contract layer whose transactions settle immediately: `Submitted` then `Confirmed`
/// (or `Failed` when scripted to).
#[derive(Default)]
pub struct MockContract {
    state: Mutex<ContractState>,
    nonce: Mutex<u8>,
}

impl MockContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowance(self, token: Address, approved: bool) -> Self {
        self.state.lock().unwrap().allowances.insert(token, approved);
        self
    }

    pub fn with_ineffective_approval(self, token: Address) -> Self {
        self.state.lock().unwrap().ineffective.insert(token);
        self
    }

    pub fn fail_next_approval(&self, reason: &str) {
        self.state.lock().unwrap().fail_next_approval = Some(reason.to_string());
    }

    pub fn fail_next_creation(&self, reason: &str) {
        self.state.lock().unwrap().fail_next_creation = Some(reason.to_string());
    }

    pub fn reject_next_submission(&self, err: ContractError) {
        self.state.lock().unwrap().reject_next_submission = Some(err);
    }

    pub fn allowance_queries(&self) -> Vec<Address> {
        self.state.lock().unwrap().allowance_queries.clone()
    }

    pub fn approvals(&self) -> Vec<(Address, U256)> {
        self.state.lock().unwrap().approvals.clone()
    }

    pub fn creations(&self) -> Vec<CreateCapsuleRequest> {
        self.state.lock().unwrap().creations.clone()
    }

    fn settle(&self, failure: Option<String>) -> TxHandle {
        let hash = {
            let mut nonce = self.nonce.lock().unwrap();
            *nonce += 1;
            TxHash::repeat_byte(*nonce)
        };
        let (sender, handle) = TxHandle::channel();
        sender.send(TxEvent::Submitted(hash)).unwrap();
        match failure {
            Some(reason) => sender.send(TxEvent::Failed(reason)).unwrap(),
            None => sender.send(TxEvent::Confirmed(hash)).unwrap(),
        }
        handle
    }
}

#[async_trait]
impl ContractLayer for MockContract {
    async fn query_allowance(&self, token: Address) -> Result<bool, ContractError> {
        let mut state = self.state.lock().unwrap();
        state.allowance_queries.push(token);
        Ok(state.allowances.get(&token).copied().unwrap_or(false))
    }

    async fn submit_approval(
        &self,
        token: Address,
        amount: U256,
    ) -> Result<TxHandle, ContractError> {
        let failure = {
            let mut state = self.state.lock().unwrap();
            if let Some(err) = state.reject_next_submission.take() {
                return Err(err);
            }
            state.approvals.push((token, amount));
            let failure = state.fail_next_approval.take();
            if failure.is_none() && !state.ineffective.contains(&token) {
                state.allowances.insert(token, true);
            }
            failure
        };
        Ok(self.settle(failure))
    }

    async fn submit_capsule_creation(
        &self,
        request: CreateCapsuleRequest,
    ) -> Result<TxHandle, ContractError> {
        let failure = {
            let mut state = self.state.lock().unwrap();
            if let Some(err) = state.reject_next_submission.take() {
                return Err(err);
            }
            state.creations.push(request);
            state.fail_next_creation.take()
        };
        Ok(self.settle(failure))
    }
}

pub struct MockOracle {
    result: Result<f64, OracleError>,
}

impl MockOracle {
    pub fn new(result: Result<f64, OracleError>) -> Self {
        Self { result }
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn usd_valuation(&self, _assets: &[Asset]) -> Result<f64, OracleError> {
        self.result.clone()
    }
}
