use crate::core::money::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Paid/owed/net of one participant in one currency. Derived, never stored.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NetPosition {
    pub user_id: String,
    pub paid: Decimal,
    pub owed: Decimal,
    pub net: Decimal,
}

impl NetPosition {
    pub fn zero(user_id: &str) -> Self {
        NetPosition {
            user_id: user_id.to_string(),
            paid: Decimal::ZERO,
            owed: Decimal::ZERO,
            net: Decimal::ZERO,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SuggestedTransfer {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceReport {
    pub trip_id: String,
    pub currency: Currency,
    pub revision: u64,
    pub paid: BTreeMap<String, Decimal>,
    pub owed: BTreeMap<String, Decimal>,
    /// Effective net: raw net adjusted by confirmed settlements.
    pub net: BTreeMap<String, Decimal>,
    pub transfers: Vec<SuggestedTransfer>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PayerTotal {
    pub user_id: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TripStats {
    pub trip_id: String,
    pub currency: Currency,
    pub total: Decimal,
    pub by_category: Vec<CategoryTotal>,
    pub by_payer: Vec<PayerTotal>,
}
