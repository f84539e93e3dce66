use crate::core::money::{Currency, round_preserving_total};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A weighted claim of one participant on one expense. Weights are relative.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Share {
    pub user_id: String,
    pub weight: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Expense {
    pub id: String,
    pub trip_id: String,
    pub title: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub payer_id: String,
    pub category: Option<String>,
    pub spent_at: Option<DateTime<Utc>>,
    pub shares: Vec<Share>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One share's portion of an expense, rounded to the minor unit.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ShareAllocation {
    pub user_id: String,
    pub weight: Decimal,
    pub amount: Decimal,
}

impl Expense {
    pub fn total_weight(&self) -> Decimal {
        self.shares.iter().map(|s| s.weight).sum()
    }

    /// Full-precision portion owed by each share holder.
    pub fn owed_portions(&self) -> Vec<(String, Decimal)> {
        let total_weight = self.total_weight();
        if total_weight.is_zero() {
            return Vec::new();
        }
        self.shares
            .iter()
            .map(|s| (s.user_id.clone(), self.amount * s.weight / total_weight))
            .collect()
    }

    /// Portions rounded to the currency's minor unit, summing exactly to `amount`.
    pub fn allocations(&self) -> Vec<ShareAllocation> {
        let rounded = round_preserving_total(&self.owed_portions(), self.amount, &self.currency);
        self.shares
            .iter()
            .zip(rounded)
            .map(|(share, (user_id, amount))| ShareAllocation {
                user_id,
                weight: share.weight,
                amount,
            })
            .collect()
    }
}

/// Expense together with its rounded per-share allocation.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseView {
    #[serde(flatten)]
    pub expense: Expense,
    pub allocations: Vec<ShareAllocation>,
}

impl From<Expense> for ExpenseView {
    fn from(expense: Expense) -> Self {
        let allocations = expense.allocations();
        ExpenseView { expense, allocations }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NewExpense {
    pub title: String,
    pub amount: Decimal,
    /// Defaults to the trip's default currency.
    pub currency: Option<Currency>,
    /// Defaults to the acting user.
    pub payer_id: Option<String>,
    pub category: Option<String>,
    pub spent_at: Option<DateTime<Utc>>,
    /// `None` splits equally over all trip members.
    pub shares: Option<Vec<Share>>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct ExpensePatch {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub payer_id: Option<String>,
    pub category: Option<String>,
    pub spent_at: Option<DateTime<Utc>>,
    pub shares: Option<Vec<Share>>,
}
