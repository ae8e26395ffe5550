//! Per-asset spend-approval state machine.
//!
//! ```text
//! Unknown -> Checking -> Approved
//!                     -> Unapproved -> Pending -> Checking (confirmed)
//!                                              -> Failed -> Unapproved (acknowledged)
//! ```
//!
//! Approvals are strictly sequential: only the first asset (in insertion order) that still needs
//! approval is ever offered. Nothing is offered while a transaction is pending, and nothing past
//! an asset that is still being checked or whose failure has not been acknowledged.

use alloy_primitives::{Address, TxHash};
use capsule_types::{Asset, AssetId, ContractError, TxEvent};
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::ApprovalError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ApprovalStatus {
    Unknown,
    Checking,
    Approved,
    Unapproved,
    Pending,
    /// The approval transaction failed. Held until [`ApprovalOrchestrator::acknowledge_failure`]
    /// puts the asset back to `Unapproved`; the reason stays in `last_error`.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovalRecord {
    pub asset: Asset,
    pub status: ApprovalStatus,
    /// Hash of the latest approval transaction, once submitted.
    pub tx_hash: Option<TxHash>,
    pub last_error: Option<String>,
}

impl ApprovalRecord {
    fn new(asset: Asset) -> Self {
        let status = if asset.is_native() {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Unknown
        };
        Self {
            asset,
            status,
            tx_hash: None,
            last_error: None,
        }
    }

    fn token_address(&self) -> Option<Address> {
        self.asset.token.token_address()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ApprovalOrchestrator {
    records: Vec<ApprovalRecord>,
}

impl ApprovalOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ApprovalRecord] {
        &self.records
    }

    pub fn status(&self, id: &AssetId) -> Option<ApprovalStatus> {
        self.records
            .iter()
            .find(|r| r.asset.token == *id)
            .map(|r| r.status)
    }

    /// Reconcile records with the working set.
    ///
    /// Existing records keep their status; new tokens move to `Checking` and are returned so the
    /// caller can query their allowance. Duplicate tokens keep the first occurrence.
    pub fn sync_assets(&mut self, assets: &[Asset]) -> Vec<Address> {
        let mut previous = std::mem::take(&mut self.records);
        let mut to_check = Vec::new();

        for asset in assets {
            if self.records.iter().any(|r| r.asset.token == asset.token) {
                continue;
            }
            let record = match previous.iter().position(|r| r.asset.token == asset.token) {
                Some(i) => {
                    let mut existing = previous.swap_remove(i);
                    existing.asset = asset.clone();
                    existing
                }
                None => {
                    let mut record = ApprovalRecord::new(asset.clone());
                    if let Some(token) = record.token_address() {
                        debug!(%token, "new asset, checking allowance");
                        record.status = ApprovalStatus::Checking;
                        to_check.push(token);
                    }
                    record
                }
            };
            self.records.push(record);
        }

        to_check
    }

    /// Tokens whose allowance should be re-queried: neither approved nor pending.
    pub fn needs_refresh(&self) -> Vec<Address> {
        self.records
            .iter()
            .filter(|r| !matches!(r.status, ApprovalStatus::Approved | ApprovalStatus::Pending))
            .filter_map(ApprovalRecord::token_address)
            .collect()
    }

    pub fn mark_checking(&mut self, token: Address) -> Result<(), ApprovalError> {
        let record = self.record_mut(token)?;
        match record.status {
            ApprovalStatus::Unknown
            | ApprovalStatus::Checking
            | ApprovalStatus::Unapproved
            | ApprovalStatus::Failed => {
                record.status = ApprovalStatus::Checking;
                Ok(())
            }
            actual => Err(ApprovalError::InvalidTransition {
                token,
                actual,
                expected: "Unknown, Unapproved or Failed",
            }),
        }
    }

    /// Apply an allowance query result to a `Checking` record.
    ///
    /// A failed query leaves the asset `Unapproved` so the user can still approve it.
    pub fn on_allowance(
        &mut self,
        token: Address,
        result: Result<bool, ContractError>,
    ) -> Result<ApprovalStatus, ApprovalError> {
        let record = self.record_mut(token)?;
        if record.status != ApprovalStatus::Checking {
            return Err(ApprovalError::InvalidTransition {
                token,
                actual: record.status,
                expected: "Checking",
            });
        }

        record.status = match result {
            Ok(true) => ApprovalStatus::Approved,
            Ok(false) => ApprovalStatus::Unapproved,
            Err(err) => {
                warn!(%token, %err, "allowance query failed");
                record.last_error = Some(err.to_string());
                ApprovalStatus::Unapproved
            }
        };
        debug!(%token, status = ?record.status, "allowance resolved");
        Ok(record.status)
    }

    /// The record currently offered for approval, if any.
    ///
    /// An earlier asset that is `Checking` or `Failed` blocks every later one.
    pub fn offered(&self) -> Option<&ApprovalRecord> {
        if self.pending().is_some() {
            return None;
        }
        for record in &self.records {
            match record.status {
                ApprovalStatus::Unapproved => return Some(record),
                ApprovalStatus::Checking | ApprovalStatus::Failed => return None,
                _ => {}
            }
        }
        None
    }

    pub fn pending(&self) -> Option<&ApprovalRecord> {
        self.records
            .iter()
            .find(|r| r.status == ApprovalStatus::Pending)
    }

    /// `Unapproved -> Pending` for the offered token.
    pub fn begin(&mut self, token: Address) -> Result<(), ApprovalError> {
        if let Some(pending) = self.pending().and_then(ApprovalRecord::token_address) {
            return Err(ApprovalError::AlreadyPending(pending));
        }
        let offered = self.offered().and_then(ApprovalRecord::token_address);
        if offered != Some(token) {
            self.record_mut(token)?;
            return Err(ApprovalError::NotOffered(token));
        }

        let record = self.record_mut(token)?;
        record.status = ApprovalStatus::Pending;
        record.tx_hash = None;
        record.last_error = None;
        Ok(())
    }

    /// Feed a lifecycle event of `token`'s approval transaction.
    pub fn on_tx_event(
        &mut self,
        token: Address,
        event: &TxEvent,
    ) -> Result<ApprovalStatus, ApprovalError> {
        let record = self.record_mut(token)?;
        if record.status != ApprovalStatus::Pending {
            return Err(ApprovalError::InvalidTransition {
                token,
                actual: record.status,
                expected: "Pending",
            });
        }

        match event {
            TxEvent::Submitted(hash) => record.tx_hash = Some(*hash),
            TxEvent::Confirmed(hash) => {
                record.tx_hash = Some(*hash);
                record.status = ApprovalStatus::Checking;
            }
            TxEvent::Failed(reason) => {
                record.last_error = Some(reason.clone());
                record.status = ApprovalStatus::Failed;
            }
        }
        Ok(record.status)
    }

    /// `Failed -> Unapproved` once the failure has been shown; `last_error` is kept.
    pub fn acknowledge_failure(&mut self, token: Address) -> Result<(), ApprovalError> {
        let record = self.record_mut(token)?;
        if record.status != ApprovalStatus::Failed {
            return Err(ApprovalError::InvalidTransition {
                token,
                actual: record.status,
                expected: "Failed",
            });
        }
        record.status = ApprovalStatus::Unapproved;
        Ok(())
    }

    /// Records that are not `Approved` yet.
    pub fn outstanding(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status != ApprovalStatus::Approved)
            .count()
    }

    pub fn all_approved(&self) -> bool {
        self.outstanding() == 0
    }

    fn record_mut(&mut self, token: Address) -> Result<&mut ApprovalRecord, ApprovalError> {
        let id = AssetId::Token(token);
        self.records
            .iter_mut()
            .find(|r| r.asset.token == id)
            .ok_or(ApprovalError::UnknownAsset(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn asset(byte: u8) -> Asset {
        Asset::new(AssetId::Token(token(byte)), "10").unwrap()
    }

    /// [A, B] unapproved plus native C, allowances already resolved.
    fn orchestrator_abc() -> ApprovalOrchestrator {
        let mut orchestrator = ApprovalOrchestrator::new();
        let to_check =
            orchestrator.sync_assets(&[asset(0xa), asset(0xb), Asset::native("1").unwrap()]);
        assert_eq!(to_check, vec![token(0xa), token(0xb)]);
        for t in to_check {
            orchestrator.on_allowance(t, Ok(false)).unwrap();
        }
        orchestrator
    }

    fn offered_token(orchestrator: &ApprovalOrchestrator) -> Option<Address> {
        orchestrator.offered().and_then(|r| r.token_address())
    }

    #[test]
    fn test_native_is_always_approved() {
        let mut orchestrator = ApprovalOrchestrator::new();
        let to_check = orchestrator.sync_assets(&[Asset::native("3").unwrap()]);
        assert!(to_check.is_empty());
        assert_eq!(orchestrator.status(&AssetId::Native), Some(ApprovalStatus::Approved));
        assert!(orchestrator.all_approved());
        assert!(orchestrator.offered().is_none());
    }

    #[test]
    fn test_sequential_approval_in_insertion_order() {
        let mut orchestrator = orchestrator_abc();
        assert_eq!(offered_token(&orchestrator), Some(token(0xa)));
        assert!(!orchestrator.all_approved());

        // B cannot jump the queue.
        assert_eq!(orchestrator.begin(token(0xb)), Err(ApprovalError::NotOffered(token(0xb))));

        orchestrator.begin(token(0xa)).unwrap();
        assert!(orchestrator.offered().is_none());
        assert_eq!(
            orchestrator.begin(token(0xb)),
            Err(ApprovalError::AlreadyPending(token(0xa)))
        );

        let hash = TxHash::repeat_byte(1);
        orchestrator.on_tx_event(token(0xa), &TxEvent::Submitted(hash)).unwrap();
        assert_eq!(
            orchestrator.on_tx_event(token(0xa), &TxEvent::Confirmed(hash)),
            Ok(ApprovalStatus::Checking)
        );
        assert_eq!(orchestrator.on_allowance(token(0xa), Ok(true)), Ok(ApprovalStatus::Approved));

        assert_eq!(offered_token(&orchestrator), Some(token(0xb)));
        assert!(!orchestrator.all_approved());

        orchestrator.begin(token(0xb)).unwrap();
        orchestrator.on_tx_event(token(0xb), &TxEvent::Confirmed(hash)).unwrap();
        orchestrator.on_allowance(token(0xb), Ok(true)).unwrap();

        assert!(orchestrator.offered().is_none());
        assert!(orchestrator.all_approved());
    }

    #[test]
    fn test_failed_approval_is_retryable() {
        let mut orchestrator = orchestrator_abc();
        orchestrator.begin(token(0xa)).unwrap();
        assert_eq!(
            orchestrator.on_tx_event(token(0xa), &TxEvent::Failed("user denied".into())),
            Ok(ApprovalStatus::Failed)
        );

        // B stays behind A until A's failure is acknowledged.
        assert!(orchestrator.offered().is_none());
        assert_eq!(orchestrator.begin(token(0xb)), Err(ApprovalError::NotOffered(token(0xb))));
        assert_eq!(orchestrator.begin(token(0xa)), Err(ApprovalError::NotOffered(token(0xa))));

        orchestrator.acknowledge_failure(token(0xa)).unwrap();
        assert_eq!(
            orchestrator.status(&AssetId::Token(token(0xa))),
            Some(ApprovalStatus::Unapproved)
        );
        let record = orchestrator.offered().unwrap();
        assert_eq!(record.token_address(), Some(token(0xa)));
        assert_eq!(record.last_error.as_deref(), Some("user denied"));

        orchestrator.begin(token(0xa)).unwrap();
        assert_eq!(orchestrator.status(&AssetId::Token(token(0xa))), Some(ApprovalStatus::Pending));
        assert_eq!(orchestrator.pending().unwrap().last_error, None);
    }

    #[test]
    fn test_confirmed_asset_being_checked_blocks_later_ones() {
        let mut orchestrator = orchestrator_abc();
        orchestrator.begin(token(0xa)).unwrap();
        orchestrator
            .on_tx_event(token(0xa), &TxEvent::Confirmed(TxHash::repeat_byte(2)))
            .unwrap();
        assert_eq!(orchestrator.status(&AssetId::Token(token(0xa))), Some(ApprovalStatus::Checking));

        assert!(orchestrator.offered().is_none());
        assert_eq!(orchestrator.begin(token(0xb)), Err(ApprovalError::NotOffered(token(0xb))));

        // The allowance did not stick: A is offered again, still ahead of B.
        orchestrator.on_allowance(token(0xa), Ok(false)).unwrap();
        assert_eq!(offered_token(&orchestrator), Some(token(0xa)));
        assert_eq!(orchestrator.status(&AssetId::Token(token(0xb))), Some(ApprovalStatus::Unapproved));
    }

    #[test]
    fn test_acknowledge_requires_failed() {
        let mut orchestrator = orchestrator_abc();
        assert!(matches!(
            orchestrator.acknowledge_failure(token(0xa)),
            Err(ApprovalError::InvalidTransition { expected: "Failed", .. })
        ));
    }

    #[test]
    fn test_adding_asset_only_checks_new_one() {
        let mut orchestrator = orchestrator_abc();
        orchestrator.begin(token(0xa)).unwrap();

        let to_check = orchestrator.sync_assets(&[
            asset(0xa),
            asset(0xb),
            Asset::native("1").unwrap(),
            asset(0xc),
        ]);
        assert_eq!(to_check, vec![token(0xc)]);
        assert_eq!(orchestrator.status(&AssetId::Token(token(0xa))), Some(ApprovalStatus::Pending));
        assert_eq!(orchestrator.status(&AssetId::Token(token(0xb))), Some(ApprovalStatus::Unapproved));
        assert_eq!(orchestrator.status(&AssetId::Token(token(0xc))), Some(ApprovalStatus::Checking));
    }

    #[test]
    fn test_removed_assets_are_dropped_and_duplicates_collapse() {
        let mut orchestrator = orchestrator_abc();
        let to_check = orchestrator.sync_assets(&[asset(0xb), asset(0xb)]);
        assert!(to_check.is_empty());
        assert_eq!(orchestrator.records().len(), 1);
        assert_eq!(offered_token(&orchestrator), Some(token(0xb)));
    }

    #[test]
    fn test_refresh_skips_approved() {
        let mut orchestrator = ApprovalOrchestrator::new();
        orchestrator.sync_assets(&[asset(0xa), asset(0xb)]);
        orchestrator.on_allowance(token(0xa), Ok(true)).unwrap();
        orchestrator.on_allowance(token(0xb), Ok(false)).unwrap();

        for _ in 0..2 {
            let targets = orchestrator.needs_refresh();
            assert_eq!(targets, vec![token(0xb)]);
            for t in targets {
                orchestrator.mark_checking(t).unwrap();
                orchestrator.on_allowance(t, Ok(false)).unwrap();
            }
            assert_eq!(
                orchestrator.status(&AssetId::Token(token(0xa))),
                Some(ApprovalStatus::Approved)
            );
        }
    }

    #[test]
    fn test_allowance_query_error_leaves_unapproved() {
        let mut orchestrator = ApprovalOrchestrator::new();
        orchestrator.sync_assets(&[asset(0xa)]);
        let status = orchestrator
            .on_allowance(token(0xa), Err(ContractError::NotConnected))
            .unwrap();
        assert_eq!(status, ApprovalStatus::Unapproved);
        assert_eq!(
            orchestrator.records()[0].last_error.as_deref(),
            Some("wallet not connected")
        );
    }

    #[test]
    fn test_rejected_transitions() {
        let mut orchestrator = orchestrator_abc();
        assert!(matches!(
            orchestrator.on_allowance(token(0xa), Ok(true)),
            Err(ApprovalError::InvalidTransition { expected: "Checking", .. })
        ));
        assert!(matches!(
            orchestrator.on_tx_event(token(0xa), &TxEvent::Confirmed(TxHash::ZERO)),
            Err(ApprovalError::InvalidTransition { expected: "Pending", .. })
        ));
        assert_eq!(
            orchestrator.begin(token(0xf)),
            Err(ApprovalError::UnknownAsset(token(0xf)))
        );
    }
}
