//! Route definitions for the Vendora API

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::app_state::AppState;
use crate::handlers::*;
use crate::ws;

// Account routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

// Product catalog routes
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", post(create_product))
        .route("/api/products", get(list_products))
        .route("/api/products/:id", get(get_product))
        .route("/api/products/:id", delete(deactivate_product))
}

// Order lifecycle routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(create_order))
        .route("/api/orders/gateway", post(create_gateway_order))
        .route("/api/orders/:id", get(get_order))
        .route("/api/orders/mine", get(list_my_orders))
        .route("/api/orders/sales", get(list_seller_orders))
        .route("/api/orders/:id/deliver", post(deliver_order))
        .route("/api/orders/:id/approve", post(approve_order))
}

// Wallet routes
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/api/wallet", get(get_wallet))
        .route("/api/wallet/transactions", get(list_wallet_transactions))
        .route("/api/wallet/topup", post(start_topup))
}

// Dispute request routes (buyer surface)
pub fn dispute_routes() -> Router<AppState> {
    Router::new()
        .route("/api/requests", post(submit_dispute))
        .route("/api/requests/mine", get(list_my_disputes))
}

// Inventory pool routes (seller surface)
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/api/inventory", post(add_item))
        .route("/api/inventory", get(list_inventory))
        .route("/api/inventory/import", post(bulk_import))
        .route("/api/inventory/:id", patch(update_item))
        .route("/api/inventory/:id", delete(delete_item))
        .route("/api/inventory/:id/assign", post(assign_item))
}

// Admin oversight routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/orders", get(admin_list_orders))
        .route("/api/admin/orders/:id", patch(admin_override_order))
        .route("/api/admin/orders/:id", delete(admin_delete_order))
        .route("/api/admin/wallets", post(admin_set_balance))
        .route("/api/admin/requests", get(admin_list_disputes))
        .route("/api/admin/requests/:id/resolve", post(admin_resolve_dispute))
        .route("/api/admin/push", post(admin_push_broadcast))
        .route("/api/admin/seo", post(admin_submit_seo))
}

// Payment gateway webhook
pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/api/payments/webhook", post(gateway_webhook))
}

// Realtime change events
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/api/ws", get(ws::ws_handler))
}

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(user_routes())
        .merge(product_routes())
        .merge(order_routes())
        .merge(wallet_routes())
        .merge(dispute_routes())
        .merge(inventory_routes())
        .merge(admin_routes())
        .merge(payment_routes())
        .merge(ws_routes())
        .with_state(state)
}

async fn root() -> &'static str {
    "Vendora API Server"
}

async fn health_check() -> &'static str {
    "OK"
}
