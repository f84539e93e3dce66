use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Coarse classification of a [`LedgerError`], used by callers that only
/// need to know how to react (reject, re-fetch, escalate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Authorization,
    InvalidState,
    NotFound,
    Internal,
}

#[derive(Error, Debug, Serialize)]
pub enum LedgerError {
    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Expense was submitted with an explicitly empty share list
    #[error("Expense must have at least one share")]
    EmptyShares,

    /// The same user appears twice in one expense's shares
    #[error("User {0} has more than one share in the expense")]
    DuplicateShare(String),

    /// Payer, share holder or settlement party is not part of the trip
    #[error("User {0} is not a participant of the trip")]
    InvalidParticipant(String),

    /// Settlement from a user to themselves
    #[error("Cannot create settlement to self")]
    SelfSettlement,

    #[error("Trip {0} not found")]
    TripNotFound(String),

    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    #[error("Settlement {0} not found")]
    SettlementNotFound(String),

    #[error("User {0} is already a trip member")]
    AlreadyTripMember(String),

    /// Acting user is not a member of the trip
    #[error("User {0} is not a trip member")]
    NotTripMember(String),

    /// Acting user is a member but not allowed to perform this operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid or missing credentials: {0}")]
    Unauthorized(String),

    /// Settlement would record paying more than is currently owed
    #[error("Overpayment: requested {requested} but outstanding debt is {outstanding}")]
    Overpayment { requested: Decimal, outstanding: Decimal },

    /// Caller acted on a balance computed at an older trip revision
    #[error("Stale balance: expected revision {expected}, trip is at revision {actual}")]
    StaleBalance { expected: u64, actual: u64 },

    /// Operation is not legal in the settlement's current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Trip records span several currencies and none was selected
    #[error("Trip records span multiple currencies: {0:?}")]
    MixedCurrency(Vec<String>),

    /// Ledger invariant broken; always a bug, never a user mistake
    #[error("Internal consistency violation: {0}")]
    InternalConsistency(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidInput(..)
            | LedgerError::EmptyShares
            | LedgerError::DuplicateShare(_)
            | LedgerError::InvalidParticipant(_)
            | LedgerError::SelfSettlement
            | LedgerError::MixedCurrency(_) => ErrorKind::Validation,
            LedgerError::TripNotFound(_) | LedgerError::ExpenseNotFound(_) | LedgerError::SettlementNotFound(_) => {
                ErrorKind::NotFound
            }
            LedgerError::AlreadyTripMember(_) | LedgerError::Overpayment { .. } | LedgerError::StaleBalance { .. } => {
                ErrorKind::Conflict
            }
            LedgerError::NotTripMember(_) | LedgerError::Forbidden(_) | LedgerError::Unauthorized(_) => {
                ErrorKind::Authorization
            }
            LedgerError::InvalidState(_) => ErrorKind::InvalidState,
            LedgerError::InternalConsistency(_)
            | LedgerError::StorageError(_)
            | LedgerError::LoggingError(_)
            | LedgerError::InternalServerError(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid_input(field: &str, title: &str, description: impl Into<String>) -> Self {
        LedgerError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }
}
