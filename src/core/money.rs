use crate::core::errors::LedgerError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use utoipa::ToSchema;

/// Upper bound for a single expense or settlement amount.
pub const MAX_AMOUNT: i64 = 1_000_000_000;

/// Upper bound for a single share weight.
pub const MAX_WEIGHT: i64 = 10_000;

/// Three-letter currency code, upper-cased on construction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn parse(code: &str) -> Result<Self, LedgerError> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LedgerError::invalid_input(
                "currency",
                "Invalid Currency",
                format!("`{}` is not a three-letter currency code", code),
            ));
        }
        Ok(Currency(code))
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of decimal places of the currency's minor unit.
    pub fn minor_units(&self) -> u32 {
        match self.0.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF" | "UGX" | "VND"
            | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }

    /// One minor unit, also the tolerance for ledger sum checks.
    pub fn epsilon(&self) -> Decimal {
        Decimal::new(1, self.minor_units())
    }

    /// Half-up rounding to the minor unit.
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.minor_units(), RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn is_representable(&self, value: Decimal) -> bool {
        value.normalize().scale() <= self.minor_units()
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// Rounds every entry to the currency's minor unit while keeping the rounded
/// entries summing exactly to `total`. The leftover from rounding goes to the
/// entry with the largest magnitude; ties go to the lowest key.
pub fn round_preserving_total(entries: &[(String, Decimal)], total: Decimal, currency: &Currency) -> Vec<(String, Decimal)> {
    let mut rounded: Vec<(String, Decimal)> = entries
        .iter()
        .map(|(key, value)| (key.clone(), currency.round(*value)))
        .collect();

    let residual = currency.round(total) - rounded.iter().map(|(_, v)| *v).sum::<Decimal>();
    if residual.is_zero() {
        return rounded;
    }

    let target = entries
        .iter()
        .enumerate()
        .max_by(|(_, (ka, va)), (_, (kb, vb))| match va.abs().cmp(&vb.abs()) {
            Ordering::Equal => kb.cmp(ka),
            other => other,
        })
        .map(|(idx, _)| idx);

    if let Some(idx) = target {
        rounded[idx].1 += residual;
    }
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_and_normalizes_codes() {
        assert_eq!(Currency::parse(" eur ").unwrap().code(), "EUR");
        assert!(Currency::parse("EURO").is_err());
        assert!(Currency::parse("E1R").is_err());
    }

    #[test]
    fn minor_units_follow_the_currency() {
        assert_eq!(Currency::parse("JPY").unwrap().minor_units(), 0);
        assert_eq!(Currency::parse("KWD").unwrap().minor_units(), 3);
        assert_eq!(Currency::parse("RUB").unwrap().epsilon(), dec!(0.01));
    }

    #[test]
    fn rounds_half_up() {
        let rub = Currency::parse("RUB").unwrap();
        assert_eq!(rub.round(dec!(0.005)), dec!(0.01));
        assert_eq!(rub.round(dec!(-0.005)), dec!(-0.01));
        assert_eq!(rub.round(dec!(33.333333)), dec!(33.33));
    }

    #[test]
    fn residual_goes_to_largest_entry() {
        let rub = Currency::parse("RUB").unwrap();
        let third = dec!(100) / dec!(3);
        let entries = vec![
            ("a".to_string(), dec!(100) - third),
            ("b".to_string(), -third),
            ("c".to_string(), -third),
        ];
        let rounded = round_preserving_total(&entries, Decimal::ZERO, &rub);
        assert_eq!(rounded[0].1, dec!(66.66));
        assert_eq!(rounded[1].1, dec!(-33.33));
        assert_eq!(rounded[2].1, dec!(-33.33));
        assert_eq!(rounded.iter().map(|(_, v)| *v).sum::<Decimal>(), Decimal::ZERO);
    }

    #[test]
    fn residual_tie_goes_to_lowest_key() {
        let rub = Currency::parse("RUB").unwrap();
        let third = dec!(10) / dec!(3);
        let entries = vec![
            ("z".to_string(), third),
            ("m".to_string(), third),
            ("a".to_string(), third),
        ];
        let rounded = round_preserving_total(&entries, dec!(10), &rub);
        assert_eq!(rounded[2], ("a".to_string(), dec!(3.34)));
        assert_eq!(rounded.iter().map(|(_, v)| *v).sum::<Decimal>(), dec!(10));
    }
}
