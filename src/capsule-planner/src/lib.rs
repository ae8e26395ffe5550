//! Client-side planner for time capsules.
//!
//! A capsule locks a bundle of assets and releases them to a beneficiary, either all at once or
//! over a number of equally spaced periods. This crate validates what the user typed, turns it
//! into a concrete release schedule, walks every token through its spend approval one at a time,
//! and only then hands the creation call to the contract layer.

pub mod abi;
pub mod approvals;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod draft;
pub mod errors;
pub mod flow;
pub mod registry;
pub mod schedule;
pub mod utils;
pub mod validation;
pub mod valuation;

#[cfg(test)]
mod testing;

pub use approvals::{ApprovalOrchestrator, ApprovalRecord, ApprovalStatus};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::PlannerConfig;
pub use countdown::{capsule_visual, remaining, CapsuleVisual, CountdownClock, CountdownState};
pub use draft::{CapsuleDraft, ValidatedDraft};
pub use errors::{FlowError, InputError, ValidationErrors};
pub use flow::{CapsuleCreationFlow, FlowState, NextAction};
pub use registry::TokenList;
pub use schedule::{calculate, Distribution, DistributionSchedule, Frequency, PeriodType};
pub use valuation::ValuationSnapshot;
