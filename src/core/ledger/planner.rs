use crate::core::errors::LedgerError;
use crate::core::ledger::aggregator::LedgerAggregator;
use crate::core::models::{NetPosition, SuggestedTransfer};
use crate::core::money::{Currency, round_preserving_total};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::error;

/// Reduces net positions to at most N-1 pairwise transfers.
///
/// Greedy: the largest debtor pays the largest creditor until both sides are
/// empty. Equal magnitudes are broken by the lower participant id so the
/// output is reproducible.
pub struct TransferPlanner;

impl TransferPlanner {
    pub fn plan(positions: &[NetPosition], currency: &Currency) -> Result<Vec<SuggestedTransfer>, LedgerError> {
        let sum = LedgerAggregator::net_sum(positions);
        if sum.abs() >= currency.epsilon() {
            error!(currency = %currency, sum = %sum, "refusing to plan transfers for unbalanced positions");
            return Err(LedgerError::InternalConsistency(format!(
                "net positions in {} sum to {} instead of zero",
                currency, sum
            )));
        }

        let nets: Vec<(String, Decimal)> = positions.iter().map(|p| (p.user_id.clone(), p.net)).collect();
        let rounded = round_preserving_total(&nets, Decimal::ZERO, currency);

        let mut debtors: Vec<(String, Decimal)> = rounded
            .iter()
            .filter(|(_, net)| *net < Decimal::ZERO)
            .map(|(id, net)| (id.clone(), -*net))
            .collect();
        let mut creditors: Vec<(String, Decimal)> = rounded
            .into_iter()
            .filter(|(_, net)| *net > Decimal::ZERO)
            .collect();

        let mut transfers = Vec::new();
        while let (Some(d), Some(c)) = (Self::largest(&debtors), Self::largest(&creditors)) {
            let amount = debtors[d].1.min(creditors[c].1);
            transfers.push(SuggestedTransfer {
                from_user_id: debtors[d].0.clone(),
                to_user_id: creditors[c].0.clone(),
                amount,
            });

            debtors[d].1 -= amount;
            creditors[c].1 -= amount;
            if debtors[d].1.is_zero() {
                debtors.swap_remove(d);
            }
            if creditors[c].1.is_zero() {
                creditors.swap_remove(c);
            }
        }

        Ok(transfers)
    }

    fn largest(parties: &[(String, Decimal)]) -> Option<usize> {
        parties
            .iter()
            .enumerate()
            .max_by(|(_, (id_a, a)), (_, (id_b, b))| match a.cmp(b) {
                Ordering::Equal => id_b.cmp(id_a),
                other => other,
            })
            .map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(user_id: &str, net: Decimal) -> NetPosition {
        NetPosition {
            user_id: user_id.to_string(),
            paid: Decimal::ZERO,
            owed: Decimal::ZERO,
            net,
        }
    }

    fn eur() -> Currency {
        Currency::parse("EUR").unwrap()
    }

    #[test]
    fn largest_debtor_pays_largest_creditor() {
        let positions = vec![
            position("a", dec!(50)),
            position("b", dec!(-10)),
            position("c", dec!(-40)),
        ];
        let transfers = TransferPlanner::plan(&positions, &eur()).unwrap();
        assert_eq!(transfers.len(), 2);
        assert_eq!((transfers[0].from_user_id.as_str(), transfers[0].amount), ("c", dec!(40)));
        assert_eq!((transfers[1].from_user_id.as_str(), transfers[1].amount), ("b", dec!(10)));
    }

    #[test]
    fn ties_break_on_lower_id() {
        let positions = vec![
            position("zed", dec!(-5)),
            position("amy", dec!(-5)),
            position("kim", dec!(10)),
        ];
        let transfers = TransferPlanner::plan(&positions, &eur()).unwrap();
        assert_eq!(transfers[0].from_user_id, "amy");
        assert_eq!(transfers[1].from_user_id, "zed");
    }

    #[test]
    fn all_settled_yields_nothing() {
        let positions = vec![position("a", Decimal::ZERO), position("b", Decimal::ZERO)];
        assert!(TransferPlanner::plan(&positions, &eur()).unwrap().is_empty());
        assert!(TransferPlanner::plan(&[], &eur()).unwrap().is_empty());
    }

    #[test]
    fn refuses_unbalanced_positions() {
        let positions = vec![position("a", dec!(10)), position("b", dec!(-9.98))];
        let result = TransferPlanner::plan(&positions, &eur());
        assert!(matches!(result, Err(LedgerError::InternalConsistency(_))));
    }

    #[test]
    fn sub_cent_noise_is_absorbed() {
        let positions = vec![
            position("a", dec!(10.004)),
            position("b", dec!(-5.002)),
            position("c", dec!(-5.001)),
        ];
        let transfers = TransferPlanner::plan(&positions, &eur()).unwrap();
        let total: Decimal = transfers.iter().map(|t| t.amount).sum();
        assert_eq!(total, dec!(10));
    }
}
