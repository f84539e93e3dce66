use crate::core::errors::LedgerError;
use crate::core::models::{Expense, NetPosition, Settlement};
use crate::core::money::{Currency, round_preserving_total};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// Turns expenses and shares into per-participant paid/owed/net positions.
///
/// Always recomputes from the full expense set; there is no incremental path.
pub struct LedgerAggregator;

impl LedgerAggregator {
    /// Full-precision positions for one currency. `participants` are seeded
    /// with zero positions so members without activity still appear.
    /// Expenses in other currencies are ignored.
    pub fn raw_positions<'a, I>(
        participants: &[String],
        expenses: I,
        currency: &Currency,
    ) -> Result<Vec<NetPosition>, LedgerError>
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        let mut positions: BTreeMap<String, NetPosition> = participants
            .iter()
            .map(|user_id| (user_id.clone(), NetPosition::zero(user_id)))
            .collect();

        let mut counted = 0usize;
        for expense in expenses.into_iter().filter(|e| &e.currency == currency) {
            if expense.shares.is_empty() || expense.total_weight() <= Decimal::ZERO {
                return Err(LedgerError::InternalConsistency(format!(
                    "expense {} has no usable shares",
                    expense.id
                )));
            }

            positions
                .entry(expense.payer_id.clone())
                .or_insert_with(|| NetPosition::zero(&expense.payer_id))
                .paid += expense.amount;

            for (user_id, portion) in expense.owed_portions() {
                positions
                    .entry(user_id.clone())
                    .or_insert_with(|| NetPosition::zero(&user_id))
                    .owed += portion;
            }
            counted += 1;
        }

        debug!(currency = %currency, expenses = counted, participants = positions.len(), "aggregated raw positions");

        Ok(positions
            .into_values()
            .map(|mut p| {
                p.net = p.paid - p.owed;
                p
            })
            .collect())
    }

    /// Rounds nets to the minor unit so they sum to exactly zero; owed is
    /// re-derived so that `paid - owed == net` still holds per participant.
    pub fn materialize(raw: &[NetPosition], currency: &Currency) -> Vec<NetPosition> {
        let nets: Vec<(String, Decimal)> = raw.iter().map(|p| (p.user_id.clone(), p.net)).collect();
        let rounded = round_preserving_total(&nets, Decimal::ZERO, currency);

        raw.iter()
            .zip(rounded)
            .map(|(p, (_, net))| {
                let paid = currency.round(p.paid);
                NetPosition {
                    user_id: p.user_id.clone(),
                    paid,
                    owed: paid - net,
                    net,
                }
            })
            .collect()
    }

    /// Offsets nets by confirmed settlements in `currency`: the payer's net
    /// rises, the receiver's falls. Pending settlements are ignored.
    pub fn apply_confirmed<'a, I>(positions: &[NetPosition], settlements: I, currency: &Currency) -> Vec<NetPosition>
    where
        I: IntoIterator<Item = &'a Settlement>,
    {
        let mut by_user: BTreeMap<String, NetPosition> =
            positions.iter().map(|p| (p.user_id.clone(), p.clone())).collect();

        for settlement in settlements
            .into_iter()
            .filter(|s| s.is_confirmed() && &s.currency == currency)
        {
            by_user
                .entry(settlement.from_user_id.clone())
                .or_insert_with(|| NetPosition::zero(&settlement.from_user_id))
                .net += settlement.amount;
            by_user
                .entry(settlement.to_user_id.clone())
                .or_insert_with(|| NetPosition::zero(&settlement.to_user_id))
                .net -= settlement.amount;
        }

        by_user.into_values().collect()
    }

    /// Raw positions, materialized, then offset by confirmed settlements.
    pub fn effective_positions<'a, E, S>(
        participants: &[String],
        expenses: E,
        settlements: S,
        currency: &Currency,
    ) -> Result<Vec<NetPosition>, LedgerError>
    where
        E: IntoIterator<Item = &'a Expense>,
        S: IntoIterator<Item = &'a Settlement>,
    {
        let raw = Self::raw_positions(participants, expenses, currency)?;
        let materialized = Self::materialize(&raw, currency);
        Ok(Self::apply_confirmed(&materialized, settlements, currency))
    }

    pub fn net_sum(positions: &[NetPosition]) -> Decimal {
        positions.iter().map(|p| p.net).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{SettlementStatus, Share};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn rub() -> Currency {
        Currency::parse("RUB").unwrap()
    }

    fn dinner(amount: Decimal, payer: &str, sharers: &[&str]) -> Expense {
        Expense {
            id: "e1".to_string(),
            trip_id: "t1".to_string(),
            title: "Dinner".to_string(),
            amount,
            currency: rub(),
            payer_id: payer.to_string(),
            category: None,
            spent_at: None,
            shares: sharers
                .iter()
                .map(|s| Share {
                    user_id: s.to_string(),
                    weight: Decimal::ONE,
                })
                .collect(),
            created_by: payer.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn settlement(from: &str, to: &str, amount: Decimal, status: SettlementStatus) -> Settlement {
        Settlement {
            id: format!("{}-{}", from, to),
            trip_id: "t1".to_string(),
            from_user_id: from.to_string(),
            to_user_id: to.to_string(),
            amount,
            currency: rub(),
            status,
            proof: None,
            created_by: from.to_string(),
            created_at: Utc::now(),
            confirmed_at: None,
        }
    }

    fn members(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn members_without_activity_have_zero_position() {
        let positions = LedgerAggregator::raw_positions(&members(&["a", "b", "c"]), std::iter::empty(), &rub()).unwrap();
        assert_eq!(positions.len(), 3);
        assert!(positions.iter().all(|p| p.net.is_zero()));
    }

    #[test]
    fn other_currencies_are_ignored() {
        let mut expense = dinner(dec!(10), "a", &["a", "b"]);
        expense.currency = Currency::parse("USD").unwrap();
        let positions = LedgerAggregator::raw_positions(&members(&["a", "b"]), &[expense], &rub()).unwrap();
        assert!(positions.iter().all(|p| p.paid.is_zero() && p.owed.is_zero()));
    }

    #[test]
    fn shareless_expense_is_an_inconsistency() {
        let expense = dinner(dec!(10), "a", &[]);
        let result = LedgerAggregator::raw_positions(&members(&["a"]), &[expense], &rub());
        assert!(matches!(result, Err(LedgerError::InternalConsistency(_))));
    }

    #[test]
    fn only_confirmed_settlements_move_nets() {
        let expenses = [dinner(dec!(90), "a", &["a", "b", "c"])];
        let settlements = [
            settlement("b", "a", dec!(30), SettlementStatus::Confirmed),
            settlement("c", "a", dec!(30), SettlementStatus::Pending),
        ];
        let positions =
            LedgerAggregator::effective_positions(&members(&["a", "b", "c"]), &expenses, &settlements, &rub()).unwrap();

        let nets: Vec<Decimal> = positions.iter().map(|p| p.net).collect();
        assert_eq!(nets, vec![dec!(30), dec!(0), dec!(-30)]);
        assert_eq!(LedgerAggregator::net_sum(&positions), Decimal::ZERO);
    }
}
