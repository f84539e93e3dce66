use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::core::errors::{ErrorKind, FieldError, LedgerError};
use crate::core::models::{ExpensePatch, NewExpense, NewSettlement, Share};
use crate::core::money::Currency;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateTripRequest {
    pub title: String,
    /// Defaults to the server's configured currency.
    pub default_currency: Option<Currency>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub user_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateExpenseRequest {
    pub title: String,
    pub amount: Decimal,
    pub currency: Option<Currency>,
    pub payer_id: Option<String>,
    pub category: Option<String>,
    pub spent_at: Option<DateTime<Utc>>,
    pub shares: Option<Vec<Share>>,
}

impl From<CreateExpenseRequest> for NewExpense {
    fn from(req: CreateExpenseRequest) -> Self {
        NewExpense {
            title: req.title,
            amount: req.amount,
            currency: req.currency,
            payer_id: req.payer_id,
            category: req.category,
            spent_at: req.spent_at,
            shares: req.shares,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub payer_id: Option<String>,
    pub category: Option<String>,
    pub spent_at: Option<DateTime<Utc>>,
    pub shares: Option<Vec<Share>>,
}

impl From<UpdateExpenseRequest> for ExpensePatch {
    fn from(req: UpdateExpenseRequest) -> Self {
        ExpensePatch {
            title: req.title,
            amount: req.amount,
            currency: req.currency,
            payer_id: req.payer_id,
            category: req.category,
            spent_at: req.spent_at,
            shares: req.shares,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSettlementRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Decimal,
    pub currency: Option<Currency>,
    pub proof: Option<String>,
    /// Revision of the balance the payment was based on.
    pub expected_revision: Option<u64>,
}

impl From<CreateSettlementRequest> for NewSettlement {
    fn from(req: CreateSettlementRequest) -> Self {
        NewSettlement {
            from_user_id: req.from_user_id,
            to_user_id: req.to_user_id,
            amount: req.amount,
            currency: req.currency,
            proof: req.proof,
            expected_revision: req.expected_revision,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ConfirmSettlementRequest {
    pub proof: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CurrencyQuery {
    /// Required when the trip has records in more than one currency.
    #[param(value_type = Option<String>)]
    pub currency: Option<Currency>,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[schema(value_type = Option<Object>)]
    pub details: Option<FieldError>,
}

// Newtype wrapper for LedgerError to implement IntoResponse
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let kind = self.0.kind();
        let status = match (&self.0, kind) {
            (LedgerError::Unauthorized(_), _) => StatusCode::UNAUTHORIZED,
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::Authorization) => StatusCode::FORBIDDEN,
            (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorKind::Conflict) | (_, ErrorKind::InvalidState) => StatusCode::CONFLICT,
            (_, ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if kind == ErrorKind::Internal {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, kind = ?kind, "request rejected");
        }

        let details = match &self.0 {
            LedgerError::InvalidInput(_, field_error) => Some(field_error.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: format!("{:?}", kind),
            details,
        };
        (status, Json(body)).into_response()
    }
}
