pub mod audit;
pub mod balance;
pub mod expense;
pub mod settlement;
pub mod trip;

pub use audit::{AppLog, TripAudit};
pub use balance::{BalanceReport, CategoryTotal, NetPosition, PayerTotal, SuggestedTransfer, TripStats};
pub use expense::{Expense, ExpensePatch, ExpenseView, NewExpense, Share, ShareAllocation};
pub use settlement::{NewSettlement, Settlement, SettlementStatus};
pub use trip::{Role, Trip, TripMember};
