//! Shared-expense ledger: aggregation, transfer planning, settlement
//! lifecycle and reconciliation. Everything here is pure and synchronous;
//! locking and persistence live in the service layer.

pub mod aggregator;
pub mod planner;
pub mod settlements;
pub mod snapshot;
pub mod validator;

pub use aggregator::LedgerAggregator;
pub use planner::TransferPlanner;
pub use settlements::{ConfirmOutcome, SettlementTracker};
pub use snapshot::LedgerSnapshot;
pub use validator::{CurrencyBalance, Reconciliation, ReconciliationValidator};
