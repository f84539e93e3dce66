use crate::core::errors::LedgerError;
use crate::core::models::{Expense, Settlement, Trip, TripAudit};
use async_trait::async_trait;

/// A single balance-affecting write, applied together with the trip's new
/// revision.
#[derive(Clone, Debug)]
pub enum LedgerChange {
    SaveExpense(Expense),
    DeleteExpense(String),
    SaveSettlement(Settlement),
    DeleteSettlement(String),
}

/// Persistence for trips and their ledger records.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_trip(&self, trip: Trip) -> Result<(), LedgerError>;
    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, LedgerError>;
    async fn get_expenses(&self, trip_id: &str) -> Result<Vec<Expense>, LedgerError>;
    async fn get_settlements(&self, trip_id: &str) -> Result<Vec<Settlement>, LedgerError>;
    /// Applies `change` and stores `trip` as one all-or-nothing write.
    /// Deleted settlement ids are remembered.
    async fn commit(&self, trip: Trip, change: LedgerChange) -> Result<(), LedgerError>;
    async fn is_settlement_deleted(&self, settlement_id: &str) -> Result<bool, LedgerError>;
    async fn save_trip_audit(&self, audit: TripAudit) -> Result<(), LedgerError>;
    async fn get_trip_audits(&self, trip_id: &str) -> Result<Vec<TripAudit>, LedgerError>;
}

pub mod in_memory;
