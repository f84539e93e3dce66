use crate::core::errors::LedgerError;
use crate::core::models::{Expense, Settlement, Trip};
use crate::core::money::Currency;
use std::collections::BTreeSet;

/// Consistent view of one trip's expenses and settlements, read under the
/// trip lock. Mutations are applied to a copy and reconciled before anything
/// is persisted.
#[derive(Clone, Debug)]
pub struct LedgerSnapshot {
    pub trip: Trip,
    pub expenses: Vec<Expense>,
    pub settlements: Vec<Settlement>,
}

impl LedgerSnapshot {
    pub fn new(trip: Trip, expenses: Vec<Expense>, settlements: Vec<Settlement>) -> Self {
        LedgerSnapshot {
            trip,
            expenses,
            settlements,
        }
    }

    /// Every currency that appears on an expense or settlement.
    pub fn currencies(&self) -> BTreeSet<Currency> {
        self.expenses
            .iter()
            .map(|e| e.currency.clone())
            .chain(self.settlements.iter().map(|s| s.currency.clone()))
            .collect()
    }

    /// Picks the currency a computation runs in. An explicit request always
    /// wins; otherwise the trip must use a single currency.
    pub fn resolve_currency(&self, requested: Option<Currency>) -> Result<Currency, LedgerError> {
        if let Some(currency) = requested {
            return Ok(currency);
        }
        let currencies = self.currencies();
        let mut iter = currencies.iter();
        match (iter.next(), iter.next()) {
            (None, _) => Ok(self.trip.default_currency.clone()),
            (Some(only), None) => Ok(only.clone()),
            _ => Err(LedgerError::MixedCurrency(
                currencies.iter().map(|c| c.code().to_string()).collect(),
            )),
        }
    }

    pub fn expense(&self, expense_id: &str) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == expense_id)
    }

    pub fn settlement(&self, settlement_id: &str) -> Option<&Settlement> {
        self.settlements.iter().find(|s| s.id == settlement_id)
    }

    pub fn expenses_in<'a>(&'a self, currency: &'a Currency) -> impl Iterator<Item = &'a Expense> + 'a {
        self.expenses.iter().filter(move |e| &e.currency == currency)
    }

    pub fn settlements_in<'a>(&'a self, currency: &'a Currency) -> impl Iterator<Item = &'a Settlement> + 'a {
        self.settlements.iter().filter(move |s| &s.currency == currency)
    }

    /// Inserts the expense, replacing any existing one with the same id.
    pub fn with_expense(&self, expense: Expense) -> Self {
        let mut next = self.clone();
        next.expenses.retain(|e| e.id != expense.id);
        next.expenses.push(expense);
        next
    }

    pub fn without_expense(&self, expense_id: &str) -> Self {
        let mut next = self.clone();
        next.expenses.retain(|e| e.id != expense_id);
        next
    }

    /// Inserts the settlement, replacing any existing one with the same id.
    pub fn with_settlement(&self, settlement: Settlement) -> Self {
        let mut next = self.clone();
        next.settlements.retain(|s| s.id != settlement.id);
        next.settlements.push(settlement);
        next
    }

    pub fn without_settlement(&self, settlement_id: &str) -> Self {
        let mut next = self.clone();
        next.settlements.retain(|s| s.id != settlement_id);
        next
    }
}
