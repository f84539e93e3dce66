use crate::auth::jwt::{Claims, JwtService};
use crate::constants::{
    EXPENSE_CREATED, EXPENSE_DELETED, EXPENSE_UPDATED, MAX_CATEGORY_LENGTH, MAX_PROOF_LENGTH, MAX_TITLE_LENGTH,
    MEMBER_ADDED, SETTLEMENT_CONFIRMED, SETTLEMENT_CREATED, SETTLEMENT_DELETED, TRIP_CREATED, UNCATEGORIZED,
};
use crate::core::context::RequestContext;
use crate::core::errors::LedgerError;
use crate::core::ledger::{ConfirmOutcome, LedgerSnapshot, ReconciliationValidator, SettlementTracker, TransferPlanner};
use crate::core::locks::TripLocks;
use crate::core::models::{
    AppLog, BalanceReport, CategoryTotal, Expense, ExpensePatch, ExpenseView, NetPosition, NewExpense, NewSettlement,
    PayerTotal, Role, Settlement, Share, Trip, TripAudit, TripMember, TripStats,
};
use crate::core::money::Currency;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::{LedgerChange, Storage};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};
use uuid::Uuid;

/// Entry point of the ledger core. Every balance-affecting operation runs
/// under the trip's lock: load a snapshot, validate, reconcile the resulting
/// state, then commit it in one write.
pub struct TripLedgerService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    locks: TripLocks,
    jwt_service: JwtService,
}

impl<L: LoggingService, S: Storage> TripLedgerService<L, S> {
    pub fn new(storage: S, logging: L, jwt_secret: String) -> Self {
        TripLedgerService {
            storage,
            logging,
            locks: TripLocks::new(),
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, LedgerError> {
        self.jwt_service.validate_token(token)
    }

    async fn load_trip(&self, ctx: &RequestContext) -> Result<Trip, LedgerError> {
        let trip = self
            .storage
            .get_trip(&ctx.trip_id)
            .await?
            .ok_or_else(|| LedgerError::TripNotFound(ctx.trip_id.clone()))?;
        if !trip.is_member(&ctx.acting_user) {
            return Err(LedgerError::NotTripMember(ctx.acting_user.clone()));
        }
        Ok(trip)
    }

    /// Takes the trip's lock once the caller is known to be a member, so
    /// unknown trip ids never reach the lock registry.
    async fn lock_trip(&self, ctx: &RequestContext) -> Result<OwnedMutexGuard<()>, LedgerError> {
        self.load_trip(ctx).await?;
        Ok(self.locks.acquire(&ctx.trip_id).await)
    }

    async fn load_snapshot(&self, ctx: &RequestContext) -> Result<LedgerSnapshot, LedgerError> {
        let trip = self.load_trip(ctx).await?;
        let expenses = self.storage.get_expenses(&trip.id).await?;
        let settlements = self.storage.get_settlements(&trip.id).await?;
        Ok(LedgerSnapshot::new(trip, expenses, settlements))
    }

    /// Reconciles the post-mutation state and, only if it holds, persists the
    /// change together with the next trip revision.
    async fn commit(&self, next: &LedgerSnapshot, change: LedgerChange) -> Result<u64, LedgerError> {
        ReconciliationValidator::reconcile(next)?;
        let mut trip = next.trip.clone();
        trip.revision += 1;
        let revision = trip.revision;
        self.storage.commit(trip, change).await?;
        Ok(revision)
    }

    async fn log_and_audit(
        &self,
        trip_id: Option<&str>,
        action: &str,
        log_details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), LedgerError> {
        self.logging.log_action(action, log_details.clone(), user_id).await?;
        if let Some(tid) = trip_id {
            self.storage
                .save_trip_audit(TripAudit {
                    id: Uuid::new_v4().to_string(),
                    trip_id: tid.to_string(),
                    action: action.to_string(),
                    user_id: user_id.map(String::from),
                    details: log_details,
                    timestamp: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), LedgerError> {
        if value.trim().is_empty() {
            return Err(LedgerError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(LedgerError::invalid_input(
                field,
                &format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(LedgerError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_proof(&self, proof: Option<&str>) -> Result<(), LedgerError> {
        match proof {
            Some(reference) => self.validate_string_input("proof", reference, MAX_PROOF_LENGTH),
            None => Ok(()),
        }
    }

    fn validate_expense_text(&self, title: &str, category: Option<&str>) -> Result<(), LedgerError> {
        self.validate_string_input("title", title, MAX_TITLE_LENGTH)?;
        if let Some(category) = category {
            self.validate_string_input("category", category, MAX_CATEGORY_LENGTH)?;
        }
        Ok(())
    }

    pub async fn create_trip(
        &self,
        owner_id: &str,
        title: String,
        default_currency: Currency,
    ) -> Result<Trip, LedgerError> {
        self.validate_string_input("owner_id", owner_id, MAX_TITLE_LENGTH)?;
        self.validate_string_input("title", &title, MAX_TITLE_LENGTH)?;

        let now = Utc::now();
        let trip = Trip {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            owner_id: owner_id.to_string(),
            members: vec![TripMember {
                user_id: owner_id.to_string(),
                role: Role::Owner,
                joined_at: now,
            }],
            default_currency,
            revision: 0,
            created_at: now,
        };
        self.storage.save_trip(trip.clone()).await?;

        self.log_and_audit(
            Some(&trip.id),
            TRIP_CREATED,
            json!({ "trip_id": trip.id, "title": trip.title, "default_currency": trip.default_currency }),
            Some(owner_id),
        )
        .await?;
        Ok(trip)
    }

    pub async fn get_trip(&self, ctx: &RequestContext) -> Result<Trip, LedgerError> {
        self.load_trip(ctx).await
    }

    pub async fn add_member(&self, ctx: &RequestContext, user_id: &str) -> Result<Trip, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let mut trip = self.load_trip(ctx).await?;
        if !trip.is_owner(&ctx.acting_user) {
            return Err(LedgerError::Forbidden(format!(
                "only the trip owner can add members, {} is not the owner",
                ctx.acting_user
            )));
        }
        self.validate_string_input("user_id", user_id, MAX_TITLE_LENGTH)?;
        if trip.is_member(user_id) {
            return Err(LedgerError::AlreadyTripMember(user_id.to_string()));
        }

        trip.members.push(TripMember {
            user_id: user_id.to_string(),
            role: Role::Member,
            joined_at: Utc::now(),
        });
        self.storage.save_trip(trip.clone()).await?;

        self.log_and_audit(
            Some(&trip.id),
            MEMBER_ADDED,
            json!({ "trip_id": trip.id, "user_id": user_id }),
            Some(ctx.acting_user.as_str()),
        )
        .await?;
        Ok(trip)
    }

    pub async fn create_expense(&self, ctx: &RequestContext, request: NewExpense) -> Result<ExpenseView, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let snapshot = self.load_snapshot(ctx).await?;
        self.validate_expense_text(&request.title, request.category.as_deref())?;

        let trip = &snapshot.trip;
        let shares = request.shares.unwrap_or_else(|| {
            trip.members
                .iter()
                .map(|m| Share {
                    user_id: m.user_id.clone(),
                    weight: Decimal::ONE,
                })
                .collect()
        });
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            trip_id: trip.id.clone(),
            title: request.title.trim().to_string(),
            amount: request.amount,
            currency: request.currency.unwrap_or_else(|| trip.default_currency.clone()),
            payer_id: request.payer_id.unwrap_or_else(|| ctx.acting_user.clone()),
            category: request.category.map(|c| c.trim().to_string()),
            spent_at: request.spent_at,
            shares,
            created_by: ctx.acting_user.clone(),
            created_at: now,
            updated_at: now,
        };
        ReconciliationValidator::validate_expense(trip, &expense)?;

        let next = snapshot.with_expense(expense.clone());
        let revision = self.commit(&next, LedgerChange::SaveExpense(expense.clone())).await?;
        info!(trip_id = %trip.id, expense_id = %expense.id, revision, "expense created");

        self.log_and_audit(
            Some(&trip.id),
            EXPENSE_CREATED,
            json!({
                "expense_id": expense.id,
                "trip_id": trip.id,
                "title": expense.title,
                "amount": expense.amount,
                "currency": expense.currency,
                "payer_id": expense.payer_id,
                "revision": revision
            }),
            Some(ctx.acting_user.as_str()),
        )
        .await?;
        Ok(expense.into())
    }

    pub async fn update_expense(
        &self,
        ctx: &RequestContext,
        expense_id: &str,
        patch: ExpensePatch,
    ) -> Result<ExpenseView, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let snapshot = self.load_snapshot(ctx).await?;
        let mut expense = snapshot
            .expense(expense_id)
            .cloned()
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))?;

        if let Some(title) = patch.title {
            expense.title = title.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            expense.amount = amount;
        }
        if let Some(currency) = patch.currency {
            expense.currency = currency;
        }
        if let Some(payer_id) = patch.payer_id {
            expense.payer_id = payer_id;
        }
        if let Some(category) = patch.category {
            expense.category = Some(category.trim().to_string());
        }
        if patch.spent_at.is_some() {
            expense.spent_at = patch.spent_at;
        }
        if let Some(shares) = patch.shares {
            expense.shares = shares;
        }
        expense.updated_at = Utc::now();

        self.validate_expense_text(&expense.title, expense.category.as_deref())?;
        ReconciliationValidator::validate_expense(&snapshot.trip, &expense)?;

        let next = snapshot.with_expense(expense.clone());
        let revision = self.commit(&next, LedgerChange::SaveExpense(expense.clone())).await?;
        info!(trip_id = %snapshot.trip.id, expense_id = %expense.id, revision, "expense updated");

        self.log_and_audit(
            Some(&snapshot.trip.id),
            EXPENSE_UPDATED,
            json!({
                "expense_id": expense.id,
                "trip_id": snapshot.trip.id,
                "amount": expense.amount,
                "currency": expense.currency,
                "payer_id": expense.payer_id,
                "revision": revision
            }),
            Some(ctx.acting_user.as_str()),
        )
        .await?;
        Ok(expense.into())
    }

    pub async fn delete_expense(&self, ctx: &RequestContext, expense_id: &str) -> Result<(), LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let snapshot = self.load_snapshot(ctx).await?;
        if snapshot.expense(expense_id).is_none() {
            return Err(LedgerError::ExpenseNotFound(expense_id.to_string()));
        }

        let next = snapshot.without_expense(expense_id);
        let revision = self
            .commit(&next, LedgerChange::DeleteExpense(expense_id.to_string()))
            .await?;
        info!(trip_id = %snapshot.trip.id, expense_id = expense_id, revision, "expense deleted");

        self.log_and_audit(
            Some(&snapshot.trip.id),
            EXPENSE_DELETED,
            json!({ "expense_id": expense_id, "trip_id": snapshot.trip.id, "revision": revision }),
            Some(ctx.acting_user.as_str()),
        )
        .await?;
        Ok(())
    }

    /// Newest first, each with its rounded per-share allocation.
    pub async fn list_expenses(&self, ctx: &RequestContext) -> Result<Vec<ExpenseView>, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let mut expenses = self.load_snapshot(ctx).await?.expenses;
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(expenses.into_iter().map(ExpenseView::from).collect())
    }

    /// Paid, owed and effective net per participant plus the suggested
    /// transfers that would zero the trip out, always recomputed from scratch.
    pub async fn compute_balance(
        &self,
        ctx: &RequestContext,
        currency: Option<Currency>,
    ) -> Result<BalanceReport, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let snapshot = self.load_snapshot(ctx).await?;
        let currency = snapshot.resolve_currency(currency)?;

        let reconciliation = ReconciliationValidator::reconcile(&snapshot)?;
        let positions: Vec<NetPosition> = match reconciliation.positions(&currency) {
            Some(positions) => positions.to_vec(),
            None => snapshot.trip.member_ids().iter().map(|m| NetPosition::zero(m)).collect(),
        };
        let transfers = TransferPlanner::plan(&positions, &currency)?;
        debug!(
            trip_id = %snapshot.trip.id,
            user_id = %ctx.acting_user,
            currency = %currency,
            revision = snapshot.trip.revision,
            transfers = transfers.len(),
            "computed balance"
        );

        Ok(BalanceReport {
            trip_id: snapshot.trip.id.clone(),
            currency,
            revision: snapshot.trip.revision,
            paid: positions.iter().map(|p| (p.user_id.clone(), p.paid)).collect(),
            owed: positions.iter().map(|p| (p.user_id.clone(), p.owed)).collect(),
            net: positions.iter().map(|p| (p.user_id.clone(), p.net)).collect(),
            transfers,
        })
    }

    /// Spending totals for one currency: overall, per category, per payer.
    pub async fn trip_stats(&self, ctx: &RequestContext, currency: Option<Currency>) -> Result<TripStats, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let snapshot = self.load_snapshot(ctx).await?;
        let currency = snapshot.resolve_currency(currency)?;

        let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut by_payer: BTreeMap<String, Decimal> = BTreeMap::new();
        for expense in snapshot.expenses_in(&currency) {
            let category = expense.category.clone().unwrap_or_else(|| UNCATEGORIZED.to_string());
            *by_category.entry(category).or_default() += expense.amount;
            *by_payer.entry(expense.payer_id.clone()).or_default() += expense.amount;
        }

        Ok(TripStats {
            trip_id: snapshot.trip.id.clone(),
            total: by_payer.values().copied().sum(),
            currency,
            by_category: by_category
                .into_iter()
                .map(|(category, amount)| CategoryTotal { category, amount })
                .collect(),
            by_payer: by_payer
                .into_iter()
                .map(|(user_id, amount)| PayerTotal { user_id, amount })
                .collect(),
        })
    }

    /// Records a pending payment claim by the debtor. The overpayment check
    /// and the insert happen under the same trip lock.
    pub async fn create_settlement(
        &self,
        ctx: &RequestContext,
        request: NewSettlement,
    ) -> Result<Settlement, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let snapshot = self.load_snapshot(ctx).await?;
        let currency = snapshot.resolve_currency(request.currency.clone())?;
        ReconciliationValidator::validate_amount("amount", request.amount, &currency)?;
        self.validate_proof(request.proof.as_deref())?;

        let settlement = SettlementTracker::create(&snapshot, &ctx.acting_user, request, currency, Utc::now())?;

        let next = snapshot.with_settlement(settlement.clone());
        let revision = self
            .commit(&next, LedgerChange::SaveSettlement(settlement.clone()))
            .await?;
        info!(trip_id = %snapshot.trip.id, settlement_id = %settlement.id, revision, "settlement created");

        self.log_and_audit(
            Some(&snapshot.trip.id),
            SETTLEMENT_CREATED,
            json!({
                "settlement_id": settlement.id,
                "trip_id": snapshot.trip.id,
                "from_user_id": settlement.from_user_id,
                "to_user_id": settlement.to_user_id,
                "amount": settlement.amount,
                "currency": settlement.currency,
                "revision": revision
            }),
            Some(ctx.acting_user.as_str()),
        )
        .await?;
        Ok(settlement)
    }

    async fn find_settlement(&self, snapshot: &LedgerSnapshot, settlement_id: &str) -> Result<Settlement, LedgerError> {
        if let Some(settlement) = snapshot.settlement(settlement_id) {
            return Ok(settlement.clone());
        }
        if self.storage.is_settlement_deleted(settlement_id).await? {
            return Err(LedgerError::InvalidState(format!(
                "settlement {} was deleted",
                settlement_id
            )));
        }
        Err(LedgerError::SettlementNotFound(settlement_id.to_string()))
    }

    /// Receiver confirms the payment; from then on it offsets the balance.
    /// Repeating the call returns the already confirmed settlement.
    pub async fn confirm_settlement(
        &self,
        ctx: &RequestContext,
        settlement_id: &str,
        proof: Option<String>,
    ) -> Result<Settlement, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let snapshot = self.load_snapshot(ctx).await?;
        let settlement = self.find_settlement(&snapshot, settlement_id).await?;
        self.validate_proof(proof.as_deref())?;

        let confirmed = match SettlementTracker::confirm(&settlement, &ctx.acting_user, proof, Utc::now())? {
            ConfirmOutcome::AlreadyConfirmed(existing) => {
                debug!(settlement_id = %existing.id, "settlement already confirmed");
                return Ok(existing);
            }
            ConfirmOutcome::Confirmed(confirmed) => confirmed,
        };

        let next = snapshot.with_settlement(confirmed.clone());
        let revision = self
            .commit(&next, LedgerChange::SaveSettlement(confirmed.clone()))
            .await?;
        info!(trip_id = %snapshot.trip.id, settlement_id = %confirmed.id, revision, "settlement confirmed");

        self.log_and_audit(
            Some(&snapshot.trip.id),
            SETTLEMENT_CONFIRMED,
            json!({
                "settlement_id": confirmed.id,
                "trip_id": snapshot.trip.id,
                "amount": confirmed.amount,
                "currency": confirmed.currency,
                "revision": revision
            }),
            Some(ctx.acting_user.as_str()),
        )
        .await?;
        Ok(confirmed)
    }

    /// Payer or trip owner removes a pending settlement.
    pub async fn delete_settlement(&self, ctx: &RequestContext, settlement_id: &str) -> Result<(), LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let snapshot = self.load_snapshot(ctx).await?;
        let settlement = self.find_settlement(&snapshot, settlement_id).await?;
        SettlementTracker::authorize_delete(&settlement, &snapshot.trip, &ctx.acting_user)?;

        let next = snapshot.without_settlement(settlement_id);
        let revision = self
            .commit(&next, LedgerChange::DeleteSettlement(settlement_id.to_string()))
            .await?;
        info!(trip_id = %snapshot.trip.id, settlement_id = settlement_id, revision, "settlement deleted");

        self.log_and_audit(
            Some(&snapshot.trip.id),
            SETTLEMENT_DELETED,
            json!({ "settlement_id": settlement_id, "trip_id": snapshot.trip.id, "revision": revision }),
            Some(ctx.acting_user.as_str()),
        )
        .await?;
        Ok(())
    }

    /// Newest first.
    pub async fn list_settlements(&self, ctx: &RequestContext) -> Result<Vec<Settlement>, LedgerError> {
        let _guard = self.lock_trip(ctx).await?;
        let mut settlements = self.load_snapshot(ctx).await?.settlements;
        settlements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(settlements)
    }

    pub async fn get_trip_audits(&self, ctx: &RequestContext) -> Result<Vec<TripAudit>, LedgerError> {
        let trip = self.load_trip(ctx).await?;
        self.storage.get_trip_audits(&trip.id).await
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        self.logging.get_logs().await
    }
}
