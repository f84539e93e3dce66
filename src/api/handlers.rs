use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        context::RequestContext,
        errors::LedgerError,
        models::{AppLog, BalanceReport, ExpenseView, Settlement, Trip, TripAudit, TripStats},
        money::Currency,
        services::TripLedgerService,
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
};
use http::header;

use std::sync::Arc;

pub type AppService = Arc<TripLedgerService<InMemoryLogging, InMemoryStorage>>;

// Middleware to validate JWT
async fn auth_middleware(
    State(service): State<AppService>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| LedgerError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| LedgerError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// Define API routes
pub fn api_routes(service: AppService, default_currency: Currency) -> Router {
    Router::new()
        .route("/trips", axum::routing::post(create_trip))
        .route("/trips/{trip_id}", axum::routing::get(get_trip))
        .route("/trips/{trip_id}/members", axum::routing::post(add_member))
        .route(
            "/trips/{trip_id}/expenses",
            axum::routing::get(list_expenses).post(create_expense),
        )
        .route(
            "/trips/{trip_id}/expenses/{expense_id}",
            axum::routing::patch(update_expense).delete(delete_expense),
        )
        .route("/trips/{trip_id}/balance", axum::routing::get(get_balance))
        .route("/trips/{trip_id}/stats", axum::routing::get(get_stats))
        .route(
            "/trips/{trip_id}/settlements",
            axum::routing::get(list_settlements).post(create_settlement),
        )
        .route(
            "/trips/{trip_id}/settlements/{settlement_id}",
            axum::routing::delete(delete_settlement),
        )
        .route(
            "/trips/{trip_id}/settlements/{settlement_id}/confirm",
            axum::routing::post(confirm_settlement),
        )
        .route("/trips/{trip_id}/audits", axum::routing::get(get_trip_audits))
        .route("/logs", axum::routing::get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware))
        .layer(Extension(default_currency))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/trips",
    request_body = CreateTripRequest,
    responses(
        (status = 201, description = "Trip created successfully", body = Trip),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_trip(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Extension(fallback_currency): Extension<Currency>,
    Json(req): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
    let default_currency = req.default_currency.unwrap_or(fallback_currency);
    let trip = service.create_trip(&claims.sub, req.title, default_currency).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}",
    params(
        ("trip_id" = String, Path, description = "ID of the trip")
    ),
    responses(
        (status = 200, description = "Trip retrieved successfully", body = Trip),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_trip(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
) -> Result<Json<Trip>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    Ok(Json(service.get_trip(&ctx).await?))
}

#[utoipa::path(
    post,
    path = "/api/trips/{trip_id}/members",
    request_body = AddMemberRequest,
    params(
        ("trip_id" = String, Path, description = "ID of the trip")
    ),
    responses(
        (status = 200, description = "Member added successfully", body = Trip),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not trip owner", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 409, description = "Already a trip member", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn add_member(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<Trip>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    Ok(Json(service.add_member(&ctx, &req.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/trips/{trip_id}/expenses",
    request_body = CreateExpenseRequest,
    params(
        ("trip_id" = String, Path, description = "ID of the trip")
    ),
    responses(
        (status = 201, description = "Expense created successfully", body = ExpenseView),
        (status = 400, description = "Invalid amount, shares or participant", body = ErrorResponse),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_expense(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseView>), ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    let expense = service.create_expense(&ctx, req.into()).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/expenses",
    params(
        ("trip_id" = String, Path, description = "ID of the trip")
    ),
    responses(
        (status = 200, description = "Expenses, newest first", body = Vec<ExpenseView>),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn list_expenses(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
) -> Result<Json<Vec<ExpenseView>>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    Ok(Json(service.list_expenses(&ctx).await?))
}

#[utoipa::path(
    patch,
    path = "/api/trips/{trip_id}/expenses/{expense_id}",
    request_body = UpdateExpenseRequest,
    params(
        ("trip_id" = String, Path, description = "ID of the trip"),
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense updated successfully", body = ExpenseView),
        (status = 400, description = "Invalid amount, shares or participant", body = ErrorResponse),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip or expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_expense(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path((trip_id, expense_id)): Path<(String, String)>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseView>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    Ok(Json(service.update_expense(&ctx, &expense_id, req.into()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/trips/{trip_id}/expenses/{expense_id}",
    params(
        ("trip_id" = String, Path, description = "ID of the trip"),
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 204, description = "Expense deleted successfully"),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip or expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_expense(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path((trip_id, expense_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    service.delete_expense(&ctx, &expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/balance",
    params(
        ("trip_id" = String, Path, description = "ID of the trip"),
        CurrencyQuery
    ),
    responses(
        (status = 200, description = "Balance and suggested transfers", body = BalanceReport),
        (status = 400, description = "Currency required for a mixed-currency trip", body = ErrorResponse),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 500, description = "Ledger inconsistency", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_balance(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<BalanceReport>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    Ok(Json(service.compute_balance(&ctx, query.currency).await?))
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/stats",
    params(
        ("trip_id" = String, Path, description = "ID of the trip"),
        CurrencyQuery
    ),
    responses(
        (status = 200, description = "Spending totals", body = TripStats),
        (status = 400, description = "Currency required for a mixed-currency trip", body = ErrorResponse),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_stats(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<TripStats>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    Ok(Json(service.trip_stats(&ctx, query.currency).await?))
}

#[utoipa::path(
    post,
    path = "/api/trips/{trip_id}/settlements",
    request_body = CreateSettlementRequest,
    params(
        ("trip_id" = String, Path, description = "ID of the trip")
    ),
    responses(
        (status = 201, description = "Pending settlement recorded", body = Settlement),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not allowed to record this payment", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 409, description = "Overpayment or stale balance", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_settlement(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
    Json(req): Json<CreateSettlementRequest>,
) -> Result<(StatusCode, Json<Settlement>), ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    let settlement = service.create_settlement(&ctx, req.into()).await?;
    Ok((StatusCode::CREATED, Json(settlement)))
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/settlements",
    params(
        ("trip_id" = String, Path, description = "ID of the trip")
    ),
    responses(
        (status = 200, description = "Settlements, newest first", body = Vec<Settlement>),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn list_settlements(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    Ok(Json(service.list_settlements(&ctx).await?))
}

#[utoipa::path(
    post,
    path = "/api/trips/{trip_id}/settlements/{settlement_id}/confirm",
    request_body = ConfirmSettlementRequest,
    params(
        ("trip_id" = String, Path, description = "ID of the trip"),
        ("settlement_id" = String, Path, description = "ID of the settlement")
    ),
    responses(
        (status = 200, description = "Settlement confirmed", body = Settlement),
        (status = 403, description = "Only the receiver can confirm", body = ErrorResponse),
        (status = 404, description = "Trip or settlement not found", body = ErrorResponse),
        (status = 409, description = "Settlement was deleted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn confirm_settlement(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path((trip_id, settlement_id)): Path<(String, String)>,
    req: Option<Json<ConfirmSettlementRequest>>,
) -> Result<Json<Settlement>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    let proof = req.and_then(|Json(body)| body.proof);
    Ok(Json(service.confirm_settlement(&ctx, &settlement_id, proof).await?))
}

#[utoipa::path(
    delete,
    path = "/api/trips/{trip_id}/settlements/{settlement_id}",
    params(
        ("trip_id" = String, Path, description = "ID of the trip"),
        ("settlement_id" = String, Path, description = "ID of the settlement")
    ),
    responses(
        (status = 204, description = "Settlement deleted"),
        (status = 403, description = "Only the payer or trip owner can delete", body = ErrorResponse),
        (status = 404, description = "Trip or settlement not found", body = ErrorResponse),
        (status = 409, description = "Settlement is confirmed or already deleted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_settlement(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path((trip_id, settlement_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    service.delete_settlement(&ctx, &settlement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/audits",
    params(
        ("trip_id" = String, Path, description = "ID of the trip")
    ),
    responses(
        (status = 200, description = "Trip audits retrieved successfully", body = Vec<TripAudit>),
        (status = 403, description = "Not a trip member", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_trip_audits(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<String>,
) -> Result<Json<Vec<TripAudit>>, ApiError> {
    let ctx = RequestContext::new(trip_id, claims.sub);
    Ok(Json(service.get_trip_audits(&ctx).await?))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "App logs retrieved successfully", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_app_logs(State(service): State<AppService>) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(logs))
}
