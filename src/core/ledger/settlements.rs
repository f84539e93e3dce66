use crate::core::errors::LedgerError;
use crate::core::ledger::aggregator::LedgerAggregator;
use crate::core::ledger::snapshot::LedgerSnapshot;
use crate::core::ledger::validator::ReconciliationValidator;
use crate::core::models::{NewSettlement, Settlement, SettlementStatus, Trip};
use crate::core::money::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Result of a confirm call. Confirming twice is not an error.
#[derive(Clone, Debug)]
pub enum ConfirmOutcome {
    Confirmed(Settlement),
    AlreadyConfirmed(Settlement),
}

/// Lifecycle of recorded payments: `Pending -> Confirmed` or
/// `Pending -> deleted`. Confirmed settlements are never reopened or removed.
pub struct SettlementTracker;

impl SettlementTracker {
    /// How much `from` can still claim to have paid `to` in `currency`.
    ///
    /// Bounded by both what `from` owes and what `to` is owed on the
    /// effective balance. Pending claims already recorded against either
    /// side reserve that capacity, so two claims cannot settle one debt.
    pub fn outstanding_debt(
        snapshot: &LedgerSnapshot,
        from: &str,
        to: &str,
        currency: &Currency,
    ) -> Result<Decimal, LedgerError> {
        let positions = LedgerAggregator::effective_positions(
            &snapshot.trip.member_ids(),
            snapshot.expenses_in(currency),
            snapshot.settlements_in(currency),
            currency,
        )?;
        let net_of = |user: &str| {
            positions
                .iter()
                .find(|p| p.user_id == user)
                .map(|p| p.net)
                .unwrap_or(Decimal::ZERO)
        };

        let pending = snapshot.settlements_in(currency).filter(|s| s.is_pending());
        let (pending_out, pending_in) = pending.fold((Decimal::ZERO, Decimal::ZERO), |(out, inc), s| {
            (
                if s.from_user_id == from { out + s.amount } else { out },
                if s.to_user_id == to { inc + s.amount } else { inc },
            )
        });

        let debtor_capacity = (-net_of(from) - pending_out).max(Decimal::ZERO);
        let creditor_capacity = (net_of(to) - pending_in).max(Decimal::ZERO);
        Ok(debtor_capacity.min(creditor_capacity))
    }

    /// Builds a pending settlement for the acting user, rejecting anything
    /// above the outstanding debt between the pair.
    pub fn create(
        snapshot: &LedgerSnapshot,
        acting_user: &str,
        request: NewSettlement,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<Settlement, LedgerError> {
        if request.from_user_id == request.to_user_id {
            return Err(LedgerError::SelfSettlement);
        }
        for party in [&request.from_user_id, &request.to_user_id] {
            if !snapshot.trip.is_member(party) {
                return Err(LedgerError::InvalidParticipant(party.clone()));
            }
        }
        if request.from_user_id != acting_user {
            return Err(LedgerError::Forbidden(format!(
                "user {} cannot record a payment on behalf of {}",
                acting_user, request.from_user_id
            )));
        }
        if let Some(expected) = request.expected_revision {
            if expected != snapshot.trip.revision {
                return Err(LedgerError::StaleBalance {
                    expected,
                    actual: snapshot.trip.revision,
                });
            }
        }

        ReconciliationValidator::check_no_overpayment(
            snapshot,
            &request.from_user_id,
            &request.to_user_id,
            request.amount,
            &currency,
        )?;

        Ok(Settlement {
            id: Uuid::new_v4().to_string(),
            trip_id: snapshot.trip.id.clone(),
            from_user_id: request.from_user_id,
            to_user_id: request.to_user_id,
            amount: request.amount,
            currency,
            status: SettlementStatus::Pending,
            proof: request.proof,
            created_by: acting_user.to_string(),
            created_at: now,
            confirmed_at: None,
        })
    }

    /// Only the receiver may confirm. A second confirmation returns the
    /// stored settlement untouched, including its proof.
    ///
    /// Outstanding debt is not re-checked here: the receiver attests that the
    /// money arrived, so the payment counts even if later expense edits left
    /// it larger than what is owed. The surplus shows up as a reverse debt.
    pub fn confirm(
        settlement: &Settlement,
        acting_user: &str,
        proof: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ConfirmOutcome, LedgerError> {
        if settlement.to_user_id != acting_user {
            return Err(LedgerError::Forbidden(format!(
                "only the receiver can confirm settlement {}",
                settlement.id
            )));
        }
        if settlement.is_confirmed() {
            return Ok(ConfirmOutcome::AlreadyConfirmed(settlement.clone()));
        }

        let mut confirmed = settlement.clone();
        confirmed.status = SettlementStatus::Confirmed;
        confirmed.confirmed_at = Some(now);
        if proof.is_some() {
            confirmed.proof = proof;
        }
        Ok(ConfirmOutcome::Confirmed(confirmed))
    }

    /// The payer or the trip owner may delete, and only while pending.
    pub fn authorize_delete(settlement: &Settlement, trip: &Trip, acting_user: &str) -> Result<(), LedgerError> {
        if settlement.from_user_id != acting_user && !trip.is_owner(acting_user) {
            return Err(LedgerError::Forbidden(format!(
                "user {} cannot delete settlement {}",
                acting_user, settlement.id
            )));
        }
        if settlement.is_confirmed() {
            return Err(LedgerError::InvalidState(format!(
                "settlement {} is confirmed and cannot be deleted",
                settlement.id
            )));
        }
        Ok(())
    }
}
