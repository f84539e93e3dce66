use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

use crate::{
    api::models::{
        AddMemberRequest, ConfirmSettlementRequest, CreateExpenseRequest, CreateSettlementRequest, CreateTripRequest,
        ErrorResponse, UpdateExpenseRequest,
    },
    core::models::{
        AppLog, BalanceReport, CategoryTotal, Expense, ExpenseView, PayerTotal, Role, Settlement, SettlementStatus,
        Share, ShareAllocation, SuggestedTransfer, Trip, TripAudit, TripMember, TripStats,
    },
};

struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_trip,
        super::handlers::get_trip,
        super::handlers::add_member,
        super::handlers::create_expense,
        super::handlers::list_expenses,
        super::handlers::update_expense,
        super::handlers::delete_expense,
        super::handlers::get_balance,
        super::handlers::get_stats,
        super::handlers::create_settlement,
        super::handlers::list_settlements,
        super::handlers::confirm_settlement,
        super::handlers::delete_settlement,
        super::handlers::get_trip_audits,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateTripRequest,
        AddMemberRequest,
        CreateExpenseRequest,
        UpdateExpenseRequest,
        CreateSettlementRequest,
        ConfirmSettlementRequest,
        ErrorResponse,
        Trip,
        TripMember,
        Role,
        Expense,
        ExpenseView,
        Share,
        ShareAllocation,
        Settlement,
        SettlementStatus,
        BalanceReport,
        SuggestedTransfer,
        TripStats,
        CategoryTotal,
        PayerTotal,
        AppLog,
        TripAudit
    )),
    modifiers(&BearerAuth),
    info(
        title = "Trip Ledger API",
        description = "API for recording shared trip expenses and settling debts",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
