//! Capsule creation session.
//!
//! Validates the draft, computes the schedule, drives token approvals one at a time, and finally
//! submits the vault-creation transaction. All mutating entry points take `&mut self`, so a
//! session never has two transactions in flight.

use std::sync::Arc;

use alloy_primitives::{Address, TxHash};
use capsule_types::{Asset, ContractLayer, PriceOracle, TokenRegistry, TxEvent, TxHandle};
use tracing::{debug, info, warn};

use crate::{
    approvals::{ApprovalOrchestrator, ApprovalRecord, ApprovalStatus},
    clock::{Clock, SystemClock},
    config::PlannerConfig,
    draft::{CapsuleDraft, ValidatedDraft},
    errors::{FlowError, ValidationErrors},
    schedule::{DistributionSchedule, Frequency, PeriodType},
    valuation::ValuationSnapshot,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    Drafting,
    /// Terminal: the capsule now lives in the contract layer.
    Complete { tx_hash: TxHash },
}

/// The single action the user can take next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextAction {
    /// Input is invalid.
    Disabled,
    /// A transaction or allowance query is in flight.
    Loading,
    Approve { token: Address, symbol: String },
    Create,
    Complete,
}

pub struct CapsuleCreationFlow<C, R> {
    contract: C,
    registry: R,
    clock: Arc<dyn Clock>,
    config: PlannerConfig,
    draft: CapsuleDraft,
    approvals: ApprovalOrchestrator,
    valuation: ValuationSnapshot,
    loading: bool,
    state: FlowState,
}

impl<C, R> CapsuleCreationFlow<C, R>
where
    C: ContractLayer,
    R: TokenRegistry,
{
    pub fn new(contract: C, registry: R, config: PlannerConfig) -> Self {
        Self {
            contract,
            registry,
            clock: Arc::new(SystemClock),
            valuation: ValuationSnapshot::from_config(&config),
            config,
            draft: CapsuleDraft::default(),
            approvals: ApprovalOrchestrator::new(),
            loading: false,
            state: FlowState::Drafting,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    pub fn draft(&self) -> &CapsuleDraft {
        &self.draft
    }

    pub fn approvals(&self) -> &[ApprovalRecord] {
        self.approvals.records()
    }

    pub fn valuation(&self) -> &ValuationSnapshot {
        &self.valuation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, FlowState::Complete { .. })
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn set_period_type(&mut self, period_type: PeriodType) {
        self.draft.period_type = period_type;
    }

    pub fn set_distribution_date(&mut self, raw: impl Into<String>) {
        self.draft.distribution_date = raw.into();
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.draft.frequency = frequency;
    }

    pub fn set_period_count(&mut self, raw: impl Into<String>) {
        self.draft.period_count = raw.into();
    }

    pub fn set_beneficiary(&mut self, raw: impl Into<String>) {
        self.draft.beneficiary = raw.into();
    }

    pub fn set_adding_assets_allowed(&mut self, allowed: bool) {
        self.draft.adding_assets_allowed = allowed;
    }

    /// Replace the working set; only newly added tokens have their allowance queried.
    pub async fn set_assets(&mut self, assets: Vec<Asset>) -> Result<(), FlowError> {
        self.ensure_drafting()?;
        self.draft.assets = assets;
        let to_check = self.approvals.sync_assets(&self.draft.assets);
        for token in to_check {
            let approved = self.contract.query_allowance(token).await;
            self.approvals.on_allowance(token, approved)?;
        }
        Ok(())
    }

    /// Re-query allowances of every asset that is not yet approved.
    pub async fn refresh_approvals(&mut self) -> Result<(), FlowError> {
        for token in self.approvals.needs_refresh() {
            self.approvals.mark_checking(token)?;
            let approved = self.contract.query_allowance(token).await;
            self.approvals.on_allowance(token, approved)?;
        }
        Ok(())
    }

    /// Re-value the working set. Oracle failures only show up in the snapshot.
    pub async fn refresh_valuation<O>(&mut self, oracle: &O)
    where
        O: PriceOracle + ?Sized,
    {
        self.valuation.refresh(oracle, &self.draft.assets).await;
    }

    fn validated(&self) -> Result<ValidatedDraft, ValidationErrors> {
        self.draft.validate(self.clock.now())
    }

    pub fn validation_errors(&self) -> ValidationErrors {
        self.validated().err().unwrap_or_default()
    }

    pub fn schedule(&self) -> Option<DistributionSchedule> {
        self.validated().ok().map(|v| v.schedule)
    }

    pub fn next_action(&self) -> NextAction {
        if self.is_complete() {
            return NextAction::Complete;
        }
        if self.loading {
            return NextAction::Loading;
        }
        if self.validated().is_err() {
            return NextAction::Disabled;
        }
        if let Some(record) = self.approvals.offered() {
            let symbol = self.registry.symbol(&record.asset.token);
            if let Some(token) = record.asset.token.token_address() {
                return NextAction::Approve { token, symbol };
            }
        }
        if self.approvals.all_approved() {
            NextAction::Create
        } else {
            NextAction::Loading
        }
    }

    /// Approve the offered token for the capsule contract and wait for the result.
    pub async fn request_approval(&mut self, token: Address) -> Result<(), FlowError> {
        self.ensure_drafting()?;
        if self.loading {
            return Err(FlowError::Busy);
        }
        self.approvals.begin(token)?;

        let amount = self.config.approval_amount;
        let mut handle = match self.contract.submit_approval(token, amount).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%token, %err, "approval submission rejected");
                self.approvals
                    .on_tx_event(token, &TxEvent::Failed(err.to_string()))?;
                self.approvals.acknowledge_failure(token)?;
                return Err(FlowError::Approval(err.to_string()));
            }
        };

        loop {
            let event = next_event(&mut handle).await;
            self.approvals.on_tx_event(token, &event)?;
            match event {
                TxEvent::Submitted(hash) => {
                    info!(%token, %hash, "approval submitted");
                    self.loading = true;
                }
                TxEvent::Confirmed(hash) => {
                    info!(%token, %hash, "approval confirmed");
                    let approved = self.contract.query_allowance(token).await;
                    let status = self.approvals.on_allowance(token, approved);
                    self.loading = false;
                    if status? != ApprovalStatus::Approved {
                        warn!(%token, "allowance still missing after confirmed approval");
                    }
                    return Ok(());
                }
                TxEvent::Failed(reason) => {
                    warn!(%token, %reason, "approval failed");
                    self.loading = false;
                    self.approvals.acknowledge_failure(token)?;
                    return Err(FlowError::Approval(reason));
                }
            }
        }
    }

    /// Submit the vault-creation transaction. On failure the draft is kept for a retry.
    pub async fn create_capsule(&mut self) -> Result<TxHash, FlowError> {
        self.ensure_drafting()?;
        if self.loading {
            return Err(FlowError::Busy);
        }
        let validated = self.validated().map_err(FlowError::Invalid)?;
        if !self.approvals.all_approved() {
            return Err(FlowError::ApprovalsOutstanding(self.approvals.outstanding()));
        }
        let request = validated.into_request()?;
        debug!(?request, "creating capsule");

        self.loading = true;
        let mut handle = match self.contract.submit_capsule_creation(request).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%err, "capsule creation rejected");
                self.loading = false;
                return Err(FlowError::Creation(err.to_string()));
            }
        };

        loop {
            match next_event(&mut handle).await {
                TxEvent::Submitted(hash) => info!(%hash, "capsule creation submitted"),
                TxEvent::Confirmed(tx_hash) => {
                    info!(%tx_hash, "capsule created");
                    self.loading = false;
                    self.state = FlowState::Complete { tx_hash };
                    return Ok(tx_hash);
                }
                TxEvent::Failed(reason) => {
                    warn!(%reason, "capsule creation failed");
                    self.loading = false;
                    return Err(FlowError::Creation(reason));
                }
            }
        }
    }

    fn ensure_drafting(&self) -> Result<(), FlowError> {
        match self.state {
            FlowState::Drafting => Ok(()),
            FlowState::Complete { .. } => Err(FlowError::AlreadyComplete),
        }
    }
}

/// A handle that closes before a terminal event counts as a failure.
async fn next_event(handle: &mut TxHandle) -> TxEvent {
    handle
        .next_event()
        .await
        .unwrap_or_else(|| TxEvent::Failed("transaction dropped before confirmation".to_string()))
}
