//! Admin oversight handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AdminUser;
use crate::error::ServiceError;
use crate::models::{
    AdminOverrideRequest, ApiResponse, DisputeDecision, DisputeRequest, DisputeType,
    ListDisputesQuery, ListOrdersQuery, Order, PushBroadcastRequest, ResolveDisputeRequest,
    SeoSubmitRequest, SetBalanceRequest, Wallet,
};
use crate::services::{notifier, seo};
use crate::ws::ChangeEvent;

/// List all orders with filters
pub async fn admin_list_orders(
    State(app_state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>, ServiceError> {
    let orders = app_state.order_service.list(query).await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// Unconstrained order override (support escape hatch)
pub async fn admin_override_order(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AdminOverrideRequest>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = app_state
        .order_service
        .admin_override(id, admin.id, request)
        .await?;

    app_state.ws_state.broadcast_event(ChangeEvent::OrderUpdated {
        id: order.id,
        status: order.status,
    });

    Ok(Json(ApiResponse::ok(order)))
}

/// Hard delete an order
pub async fn admin_delete_order(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    app_state.order_service.delete(id, admin.id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// Direct wallet balance override
pub async fn admin_set_balance(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<SetBalanceRequest>,
) -> Result<Json<ApiResponse<Wallet>>, ServiceError> {
    let wallet = app_state
        .wallet_service
        .set_balance(request.user_id, request.balance, admin.id)
        .await?;

    app_state.ws_state.broadcast_event(ChangeEvent::WalletUpdated {
        user_id: request.user_id,
    });

    Ok(Json(ApiResponse::ok(wallet)))
}

/// Unified dispute read model with filters and search
pub async fn admin_list_disputes(
    State(app_state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListDisputesQuery>,
) -> Result<Json<ApiResponse<Vec<DisputeRequest>>>, ServiceError> {
    let disputes = app_state.dispute_service.list(query).await?;
    Ok(Json(ApiResponse::ok(disputes)))
}

/// Resolve a pending dispute request
pub async fn admin_resolve_dispute(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveDisputeRequest>,
) -> Result<Json<ApiResponse<DisputeRequest>>, ServiceError> {
    let dispute = app_state
        .dispute_service
        .resolve(id, admin.id, request.decision, request.notes)
        .await?;

    app_state
        .ws_state
        .broadcast_event(ChangeEvent::DisputeResolved {
            id: dispute.id,
            status: dispute.status,
        });
    if request.decision == DisputeDecision::Approved && dispute.request_type == DisputeType::Refund
    {
        app_state.ws_state.broadcast_event(ChangeEvent::WalletUpdated {
            user_id: dispute.user_id,
        });
    }

    Ok(Json(ApiResponse::ok(dispute)))
}

/// Queue a push broadcast to an audience
pub async fn admin_push_broadcast(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<PushBroadcastRequest>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    request.validate()?;

    let mut conn = app_state.db_pool.acquire().await?;
    notifier::enqueue_broadcast(
        &mut conn,
        &request.title,
        &request.message,
        request.link.as_deref(),
        request.audience,
    )
    .await?;

    tracing::info!(admin = %admin.id, audience = ?request.audience, "push broadcast queued");

    Ok(Json(ApiResponse::ok(())))
}

/// Forward URLs to the configured indexing services
pub async fn admin_submit_seo(
    State(app_state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<SeoSubmitRequest>,
) -> Result<Json<ApiResponse<usize>>, ServiceError> {
    request.validate()?;

    if app_state.config.seo_submit_urls.is_empty() {
        return Err(ServiceError::Validation(
            "no indexing endpoints configured".to_string(),
        ));
    }

    let accepted = seo::submit_urls(
        &app_state.http_client,
        &app_state.config.seo_submit_urls,
        &request.urls,
    )
    .await;

    Ok(Json(ApiResponse::ok(accepted)))
}
