//! Inventory pool handlers (seller surface)

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::models::{
    AddItemRequest, ApiResponse, AssignItemRequest, BulkImportReport, BulkImportRequest,
    InventoryItem, ListInventoryQuery, UpdateItemRequest,
};

/// Add a single item to the pool
pub async fn add_item(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, ServiceError> {
    let item = app_state
        .inventory_service
        .add_item(
            user.id,
            request.product_id,
            request.item_type,
            request.credentials,
            request.display_order,
        )
        .await?;

    Ok(Json(ApiResponse::ok(item)))
}

/// Bulk import, one item per line; reports every malformed line
pub async fn bulk_import(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(request): Json<BulkImportRequest>,
) -> Result<Json<ApiResponse<BulkImportReport>>, ServiceError> {
    request.validate()?;

    let report = app_state
        .inventory_service
        .bulk_import(user.id, request.product_id, request.item_type, &request.lines)
        .await?;

    Ok(Json(ApiResponse::ok(report)))
}

/// List the caller's pool items
pub async fn list_inventory(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListInventoryQuery>,
) -> Result<Json<ApiResponse<Vec<InventoryItem>>>, ServiceError> {
    let items = app_state.inventory_service.list(user.id, query).await?;
    Ok(Json(ApiResponse::ok(items)))
}

/// Edit an unassigned item
pub async fn update_item(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, ServiceError> {
    let item = app_state
        .inventory_service
        .update_item(id, user.id, request)
        .await?;

    Ok(Json(ApiResponse::ok(item)))
}

/// Delete an unassigned item
pub async fn delete_item(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    app_state.inventory_service.delete_item(id, user.id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// Assign an item to an order
pub async fn assign_item(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignItemRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, ServiceError> {
    let item = app_state
        .inventory_service
        .assign(id, user.id, request.order_id)
        .await?;

    Ok(Json(ApiResponse::ok(item)))
}
