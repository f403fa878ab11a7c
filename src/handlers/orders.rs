//! Order lifecycle handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::models::{
    ApiResponse, CreateGatewayOrderRequest, CreateOrderRequest, DeliverOrderRequest,
    ListOrdersQuery, Order, UserRole,
};
use crate::ws::ChangeEvent;

/// Create a wallet-funded order
pub async fn create_order(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = app_state
        .order_service
        .create(user.id, request.product_id)
        .await?;

    app_state.ws_state.broadcast_event(ChangeEvent::OrderUpdated {
        id: order.id,
        status: order.status,
    });
    app_state
        .ws_state
        .broadcast_event(ChangeEvent::WalletUpdated { user_id: user.id });

    Ok(Json(ApiResponse::ok(order)))
}

/// Create a gateway-funded order; payment settles via webhook
pub async fn create_gateway_order(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateGatewayOrderRequest>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    request.validate()?;

    let order = app_state
        .order_service
        .create_gateway(user.id, request.product_id, &request.gateway_ref)
        .await?;

    Ok(Json(ApiResponse::ok(order)))
}

/// Get a single order. Only the buyer, the seller, or an admin may read it.
pub async fn get_order(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = app_state
        .order_service
        .get(id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let allowed =
        order.buyer_id == user.id || order.seller_id == user.id || user.role == UserRole::Admin;
    if !allowed {
        return Err(ServiceError::Unauthorized);
    }

    Ok(Json(ApiResponse::ok(order)))
}

/// The caller's purchases
pub async fn list_my_orders(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>, ServiceError> {
    let orders = app_state
        .order_service
        .list(ListOrdersQuery {
            buyer_id: Some(user.id),
            seller_id: None,
            ..query
        })
        .await?;

    Ok(Json(ApiResponse::ok(orders)))
}

/// The caller's sales
pub async fn list_seller_orders(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>, ServiceError> {
    let orders = app_state
        .order_service
        .list(ListOrdersQuery {
            buyer_id: None,
            seller_id: Some(user.id),
            ..query
        })
        .await?;

    Ok(Json(ApiResponse::ok(orders)))
}

/// Seller delivery: attach credentials
pub async fn deliver_order(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<DeliverOrderRequest>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    request.validate()?;

    let order = app_state
        .order_service
        .deliver(id, user.id, &request.credentials)
        .await?;

    app_state.ws_state.broadcast_event(ChangeEvent::OrderUpdated {
        id: order.id,
        status: order.status,
    });

    Ok(Json(ApiResponse::ok(order)))
}

/// Buyer approval: release the escrowed seller earning
pub async fn approve_order(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = app_state.order_service.approve_delivery(id, user.id).await?;

    app_state.ws_state.broadcast_event(ChangeEvent::OrderUpdated {
        id: order.id,
        status: order.status,
    });
    app_state.ws_state.broadcast_event(ChangeEvent::WalletUpdated {
        user_id: order.seller_id,
    });

    Ok(Json(ApiResponse::ok(order)))
}
