use crate::core::errors::LedgerError;
use crate::core::ledger::aggregator::LedgerAggregator;
use crate::core::ledger::settlements::SettlementTracker;
use crate::core::ledger::snapshot::LedgerSnapshot;
use crate::core::models::{Expense, NetPosition, Trip};
use crate::core::money::{Currency, MAX_AMOUNT, MAX_WEIGHT};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Effective positions for one currency after a successful reconciliation.
/// `paid` and `owed` are the rounded expense totals; `net` already includes
/// confirmed settlements.
#[derive(Clone, Debug)]
pub struct CurrencyBalance {
    pub currency: Currency,
    pub positions: Vec<NetPosition>,
}

/// Authoritative read model for a trip. Commits check it before writing and
/// balance reads are served from it.
#[derive(Clone, Debug)]
pub struct Reconciliation {
    pub trip_id: String,
    pub balances: Vec<CurrencyBalance>,
}

impl Reconciliation {
    pub fn positions(&self, currency: &Currency) -> Option<&[NetPosition]> {
        self.balances
            .iter()
            .find(|b| &b.currency == currency)
            .map(|b| b.positions.as_slice())
    }
}

pub struct ReconciliationValidator;

impl ReconciliationValidator {
    /// Recomputes every currency of the snapshot from scratch and checks the
    /// sum-zero invariant. A violation is a bug and is reported as
    /// `InternalConsistency`.
    pub fn reconcile(snapshot: &LedgerSnapshot) -> Result<Reconciliation, LedgerError> {
        let balances = snapshot
            .currencies()
            .into_iter()
            .map(|currency| {
                let positions = Self::reconcile_currency(snapshot, &currency)?;
                Ok(CurrencyBalance { currency, positions })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        debug!(trip_id = %snapshot.trip.id, currencies = balances.len(), "reconciled trip ledger");
        Ok(Reconciliation {
            trip_id: snapshot.trip.id.clone(),
            balances,
        })
    }

    fn reconcile_currency(snapshot: &LedgerSnapshot, currency: &Currency) -> Result<Vec<NetPosition>, LedgerError> {
        let members = snapshot.trip.member_ids();
        let raw = LedgerAggregator::raw_positions(&members, snapshot.expenses_in(currency), currency)?;
        let raw_sum = LedgerAggregator::net_sum(&raw);
        if raw_sum.abs() >= currency.epsilon() {
            return Err(Self::violation(
                &snapshot.trip.id,
                format!("raw net positions in {} sum to {}", currency, raw_sum),
            ));
        }

        let materialized = LedgerAggregator::materialize(&raw, currency);
        let effective = LedgerAggregator::apply_confirmed(&materialized, snapshot.settlements_in(currency), currency);
        let effective_sum = LedgerAggregator::net_sum(&effective);
        if !effective_sum.is_zero() {
            return Err(Self::violation(
                &snapshot.trip.id,
                format!("effective net positions in {} sum to {}", currency, effective_sum),
            ));
        }
        Ok(effective)
    }

    /// Rejects a settlement claim above the current outstanding debt.
    pub fn check_no_overpayment(
        snapshot: &LedgerSnapshot,
        from: &str,
        to: &str,
        amount: Decimal,
        currency: &Currency,
    ) -> Result<(), LedgerError> {
        let outstanding = SettlementTracker::outstanding_debt(snapshot, from, to, currency)?;
        if amount > outstanding {
            warn!(
                trip_id = %snapshot.trip.id,
                from = from,
                to = to,
                requested = %amount,
                outstanding = %outstanding,
                "rejected overpayment"
            );
            return Err(LedgerError::Overpayment {
                requested: amount,
                outstanding,
            });
        }
        Ok(())
    }

    pub fn validate_amount(field: &str, amount: Decimal, currency: &Currency) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if amount > Decimal::from(MAX_AMOUNT) {
            return Err(LedgerError::invalid_input(
                field,
                "Amount Too Large",
                format!("Amount cannot exceed {}", MAX_AMOUNT),
            ));
        }
        if !currency.is_representable(amount) {
            return Err(LedgerError::invalid_input(
                field,
                "Invalid Amount",
                format!(
                    "Amount cannot have more than {} decimal places in {}",
                    currency.minor_units(),
                    currency
                ),
            ));
        }
        Ok(())
    }

    /// Structural checks on an expense before it may enter the ledger.
    pub fn validate_expense(trip: &Trip, expense: &Expense) -> Result<(), LedgerError> {
        Self::validate_amount("amount", expense.amount, &expense.currency)?;
        if !trip.is_member(&expense.payer_id) {
            return Err(LedgerError::InvalidParticipant(expense.payer_id.clone()));
        }
        if expense.shares.is_empty() {
            return Err(LedgerError::EmptyShares);
        }

        let mut seen = HashSet::new();
        for share in &expense.shares {
            if !seen.insert(share.user_id.as_str()) {
                return Err(LedgerError::DuplicateShare(share.user_id.clone()));
            }
            if !trip.is_member(&share.user_id) {
                return Err(LedgerError::InvalidParticipant(share.user_id.clone()));
            }
            if share.weight <= Decimal::ZERO || share.weight > Decimal::from(MAX_WEIGHT) {
                return Err(LedgerError::invalid_input(
                    "weight",
                    "Invalid Weight",
                    format!("Share weight must be greater than 0 and at most {}", MAX_WEIGHT),
                ));
            }
        }
        Ok(())
    }

    fn violation(trip_id: &str, message: String) -> LedgerError {
        error!(trip_id = trip_id, "ledger invariant violated: {}", message);
        LedgerError::InternalConsistency(message)
    }
}
