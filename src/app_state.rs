//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::dispute_service::DisputeService;
use crate::inventory_service::InventoryService;
use crate::order_service::OrderService;
use crate::product_service::ProductService;
use crate::wallet_service::WalletService;
use crate::ws::WsState;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: PgPool,
    pub auth_service: Arc<AuthService>,
    pub order_service: Arc<OrderService>,
    pub product_service: Arc<ProductService>,
    pub wallet_service: Arc<WalletService>,
    pub dispute_service: Arc<DisputeService>,
    pub inventory_service: Arc<InventoryService>,
    pub ws_state: WsState,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig, db_pool: PgPool) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(
                db_pool.clone(),
                config.jwt_secret.clone(),
            )),
            order_service: Arc::new(OrderService::new(
                db_pool.clone(),
                config.seller_earning_percent,
            )),
            product_service: Arc::new(ProductService::new(db_pool.clone())),
            wallet_service: Arc::new(WalletService::new(db_pool.clone())),
            dispute_service: Arc::new(DisputeService::new(db_pool.clone())),
            inventory_service: Arc::new(InventoryService::new(db_pool.clone())),
            ws_state: WsState::new(),
            http_client: reqwest::Client::new(),
            config: Arc::new(config),
            db_pool,
        }
    }
}

impl FromRef<AppState> for WsState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ws_state.clone()
    }
}
