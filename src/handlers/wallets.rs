//! Wallet handlers

use axum::extract::{Query, State};
use axum::Json;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::models::{
    ApiResponse, PaginationQuery, TopupRequest, WalletSummary, WalletTransaction,
};

/// Balance and derived ledger aggregates for the caller
pub async fn get_wallet(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<WalletSummary>>, ServiceError> {
    let summary = app_state.wallet_service.summary(user.id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// The caller's audit transactions, newest first
pub async fn list_wallet_transactions(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<WalletTransaction>>>, ServiceError> {
    let transactions = app_state
        .wallet_service
        .list_transactions(user.id, query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::ok(transactions)))
}

/// Start a gateway top-up; the balance is credited when the webhook settles
pub async fn start_topup(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(request): Json<TopupRequest>,
) -> Result<Json<ApiResponse<WalletTransaction>>, ServiceError> {
    request.validate()?;

    let transaction = app_state
        .wallet_service
        .start_topup(user.id, request.amount, &request.gateway_ref)
        .await?;

    Ok(Json(ApiResponse::ok(transaction)))
}
