use crate::core::money::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Confirmed,
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Confirmed => "confirmed",
        };
        write!(f, "{}", s)
    }
}

/// A claimed real-world payment from `from_user_id` to `to_user_id`.
/// Only confirmed settlements offset balances.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Settlement {
    pub id: String,
    pub trip_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: SettlementStatus,
    /// Opaque reference to an externally stored proof of payment.
    pub proof: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Settlement {
    pub fn is_confirmed(&self) -> bool {
        self.status == SettlementStatus::Confirmed
    }

    pub fn is_pending(&self) -> bool {
        self.status == SettlementStatus::Pending
    }
}

/// Input for recording a payment claim.
#[derive(Clone, Debug)]
pub struct NewSettlement {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Decimal,
    /// Defaults to the trip's currency in use.
    pub currency: Option<Currency>,
    pub proof: Option<String>,
    /// Trip revision the caller's balance was computed at.
    pub expected_revision: Option<u64>,
}
