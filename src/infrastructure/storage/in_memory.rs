use crate::core::errors::LedgerError;
use crate::core::models::{Expense, Settlement, Trip, TripAudit};
use crate::infrastructure::storage::{LedgerChange, Storage};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    trips: Arc<RwLock<HashMap<String, Trip>>>,
    expenses: Arc<RwLock<HashMap<String, Expense>>>,
    settlements: Arc<RwLock<HashMap<String, Settlement>>>,
    deleted_settlements: Arc<RwLock<HashSet<String>>>,
    trip_audits: Arc<RwLock<HashMap<String, Vec<TripAudit>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_trip(&self, trip: Trip) -> Result<(), LedgerError> {
        let mut trips = self.trips.write().await;
        trips.insert(trip.id.clone(), trip);
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, LedgerError> {
        let trips = self.trips.read().await;
        Ok(trips.get(trip_id).cloned())
    }

    async fn get_expenses(&self, trip_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.values().filter(|e| e.trip_id == trip_id).cloned().collect())
    }

    async fn get_settlements(&self, trip_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        let settlements = self.settlements.read().await;
        Ok(settlements.values().filter(|s| s.trip_id == trip_id).cloned().collect())
    }

    async fn commit(&self, trip: Trip, change: LedgerChange) -> Result<(), LedgerError> {
        // Locks are taken in a fixed order and nothing is awaited once the
        // first write happens.
        let mut trips = self.trips.write().await;
        let mut expenses = self.expenses.write().await;
        let mut settlements = self.settlements.write().await;
        let mut deleted = self.deleted_settlements.write().await;

        match change {
            LedgerChange::SaveExpense(expense) => {
                expenses.insert(expense.id.clone(), expense);
            }
            LedgerChange::DeleteExpense(expense_id) => {
                expenses
                    .remove(&expense_id)
                    .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.clone()))?;
            }
            LedgerChange::SaveSettlement(settlement) => {
                settlements.insert(settlement.id.clone(), settlement);
            }
            LedgerChange::DeleteSettlement(settlement_id) => {
                settlements
                    .remove(&settlement_id)
                    .ok_or_else(|| LedgerError::SettlementNotFound(settlement_id.clone()))?;
                deleted.insert(settlement_id);
            }
        }
        trips.insert(trip.id.clone(), trip);
        Ok(())
    }

    async fn is_settlement_deleted(&self, settlement_id: &str) -> Result<bool, LedgerError> {
        let deleted = self.deleted_settlements.read().await;
        Ok(deleted.contains(settlement_id))
    }

    async fn save_trip_audit(&self, audit: TripAudit) -> Result<(), LedgerError> {
        let mut trip_audits = self.trip_audits.write().await;
        trip_audits.entry(audit.trip_id.clone()).or_default().push(audit);
        Ok(())
    }

    async fn get_trip_audits(&self, trip_id: &str) -> Result<Vec<TripAudit>, LedgerError> {
        let trip_audits = self.trip_audits.read().await;
        Ok(trip_audits.get(trip_id).cloned().unwrap_or_default())
    }
}
