//! Payment gateway webhook
//!
//! The gateway signs each callback with `X-Gateway-Signature` =
//! hex(sha256(secret || body)). An unconfigured secret rejects everything:
//! fail closed rather than accept unverifiable money events.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::app_state::AppState;
use crate::models::{ApiResponse, GatewayEvent, GatewayWebhookPayload, PaymentStatus};
use crate::ws::ChangeEvent;

pub async fn gateway_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = app_state.config.payment_webhook_secret.as_deref() else {
        tracing::error!("payment webhook secret not configured - rejecting request");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::err("webhook endpoint is not configured")),
        )
            .into_response();
    };

    let signature = headers
        .get("X-Gateway-Signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(&body);
    let expected = hex::encode(hasher.finalize());

    if signature != expected {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::err("invalid webhook signature")),
        )
            .into_response();
    }

    let payload: GatewayWebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::err(format!("invalid payload: {}", err))),
            )
                .into_response();
        }
    };

    // A reference settles either a pending top-up or a gateway order.
    match app_state
        .wallet_service
        .settle_topup(&payload.gateway_ref, payload.event)
        .await
    {
        Ok(Some(transaction)) => {
            app_state.ws_state.broadcast_event(ChangeEvent::WalletUpdated {
                user_id: transaction.user_id,
            });
            return Json(ApiResponse::ok(json!({ "settled": "topup" }))).into_response();
        }
        Ok(None) => {}
        Err(err) => return err.into_response(),
    }

    let status = match payload.event {
        GatewayEvent::PaymentCompleted => PaymentStatus::Completed,
        GatewayEvent::PaymentFailed => PaymentStatus::Failed,
    };

    match app_state
        .order_service
        .settle_gateway_payment(&payload.gateway_ref, status)
        .await
    {
        Ok(Some(order)) => {
            app_state.ws_state.broadcast_event(ChangeEvent::OrderUpdated {
                id: order.id,
                status: order.status,
            });
            Json(ApiResponse::ok(json!({ "settled": "order" }))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::err("unknown gateway reference")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
