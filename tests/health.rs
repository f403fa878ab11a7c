//! Router smoke tests. These drive the assembled router with `oneshot`
//! against a lazy pool, so nothing here needs a live database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use vendora_server::app_state::AppState;
use vendora_server::config::AppConfig;
use vendora_server::routes;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        jwt_secret: "test-secret".to_string(),
        seller_earning_percent: 85,
        payment_webhook_secret: None,
        push_endpoint_url: None,
        seo_submit_urls: Vec::new(),
    }
}

fn test_app(config: AppConfig) -> axum::Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/vendora_test")
        .expect("lazy pool");
    routes::build_router(AppState::new(config, pool))
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = test_app(test_config());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_tokens() {
    let app = test_app(test_config());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/wallet")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_fails_closed_when_secret_is_unset() {
    let app = test_app(test_config());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments/webhook")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn webhook_rejects_bad_signatures() {
    let config = AppConfig {
        payment_webhook_secret: Some("hook-secret".to_string()),
        ..test_config()
    };
    let app = test_app(config);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments/webhook")
                .header("content-type", "application/json")
                .header("X-Gateway-Signature", "deadbeef")
                .body(Body::from(
                    r#"{"gateway_ref":"ref-1","event":"payment_completed"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
