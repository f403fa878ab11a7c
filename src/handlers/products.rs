//! Product catalog handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::models::{ApiResponse, CreateProductRequest, ListProductsQuery, Product};

/// Create a product listing
pub async fn create_product(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, ServiceError> {
    request.validate()?;

    let product = app_state.product_service.create(user.id, request).await?;
    Ok(Json(ApiResponse::ok(product)))
}

/// Browse active products
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ServiceError> {
    let products = app_state.product_service.list(query).await?;
    Ok(Json(ApiResponse::ok(products)))
}

/// Get a single product
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Product>>, ServiceError> {
    let product = app_state
        .product_service
        .get(id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    Ok(Json(ApiResponse::ok(product)))
}

/// Retire a listing
pub async fn deactivate_product(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    app_state.product_service.deactivate(id, user.id).await?;
    Ok(Json(ApiResponse::ok(())))
}
