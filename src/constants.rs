pub const TRIP_CREATED: &str = "TRIP_CREATED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const EXPENSE_CREATED: &str = "EXPENSE_CREATED";
pub const EXPENSE_UPDATED: &str = "EXPENSE_UPDATED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
pub const SETTLEMENT_CREATED: &str = "SETTLEMENT_CREATED";
pub const SETTLEMENT_CONFIRMED: &str = "SETTLEMENT_CONFIRMED";
pub const SETTLEMENT_DELETED: &str = "SETTLEMENT_DELETED";

/// Category label for expenses recorded without one.
pub const UNCATEGORIZED: &str = "Uncategorized";

pub const MAX_TITLE_LENGTH: usize = 120;
pub const MAX_CATEGORY_LENGTH: usize = 64;
pub const MAX_PROOF_LENGTH: usize = 255;

/// Upper bound on entries kept by the in-process action log.
pub const MAX_APP_LOG_ENTRIES: usize = 10_000;
