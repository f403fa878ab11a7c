//! Dispute request handlers (buyer surface)

use axum::extract::State;
use axum::Json;

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::models::{ApiResponse, DisputeRequest, SubmitDisputeRequest};

/// Submit a refund, cancellation, or account-deletion request
pub async fn submit_dispute(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SubmitDisputeRequest>,
) -> Result<Json<ApiResponse<DisputeRequest>>, ServiceError> {
    let dispute = app_state.dispute_service.submit(user.id, request).await?;
    Ok(Json(ApiResponse::ok(dispute)))
}

/// The caller's own requests
pub async fn list_my_disputes(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<DisputeRequest>>>, ServiceError> {
    let disputes = app_state.dispute_service.list_for_user(user.id).await?;
    Ok(Json(ApiResponse::ok(disputes)))
}
