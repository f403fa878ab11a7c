//! Account handlers

use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::models::{ApiResponse, LoginRequest, LoginResponse, RegisterRequest, UserResponse};

/// Register a new account
pub async fn register(
    State(app_state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ServiceError> {
    request.validate()?;

    let user = app_state.auth_service.register(request).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// Exchange credentials for an access token
pub async fn login(
    State(app_state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ServiceError> {
    request.validate()?;

    let response = app_state.auth_service.login(request).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// Current user profile
pub async fn me(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ServiceError> {
    let profile = app_state.auth_service.me(user.id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
