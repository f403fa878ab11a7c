//! Vendora Backend Server
//!
//! This is the main Rust backend server for Vendora, a digital-goods
//! marketplace: orders, escrowed wallets, disputes, seller inventory, and
//! the realtime/notification side-channels around them.

use axum::http::{header, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::time::{sleep, Duration};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use vendora_server::app_state::AppState;
use vendora_server::config::AppConfig;
use vendora_server::routes;
use vendora_server::services::jobs;
use vendora_server::services::notifier::{Notifier, StartError};

const NOTIFIER_SUPERVISOR_MAX_BACKOFF_SECONDS: u64 = 30;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let state = AppState::new(config.clone(), db_pool.clone());

    let app = routes::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer());

    // Start and supervise the background notification worker.
    {
        let db_pool = db_pool.clone();
        let push_endpoint = config.push_endpoint_url.clone();
        tokio::spawn(async move {
            let mut restart_count: u32 = 0;
            loop {
                let notifier = Notifier::new(db_pool.clone(), push_endpoint.clone());
                let handle = tokio::spawn(async move { notifier.start().await });

                match handle.await {
                    Ok(Ok(())) => {
                        info!("notification worker exited cleanly; stopping supervisor");
                        break;
                    }
                    Ok(Err(StartError::NotConfigured)) => {
                        info!("notification worker disabled: no push endpoint set in environment");
                        break;
                    }
                    Err(join_error) => {
                        if join_error.is_panic() {
                            error!("notification worker panicked; restarting");
                        } else {
                            error!(error = %join_error, "notification worker task failed; restarting");
                        }
                    }
                }

                restart_count = restart_count.saturating_add(1);
                let backoff_seconds = (2u64.saturating_pow(restart_count.min(5)))
                    .min(NOTIFIER_SUPERVISOR_MAX_BACKOFF_SECONDS);
                warn!(restart_count, backoff_seconds, "notification worker restart backoff");
                sleep(Duration::from_secs(backoff_seconds)).await;
            }
        });
    }

    // Scheduled maintenance (stale payment sweep). The scheduler handle
    // must stay alive for the lifetime of the process.
    let _scheduler = jobs::start_scheduler(db_pool)
        .await
        .expect("failed to start maintenance scheduler");

    // Get port from environment or default to 3001
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse()
        .expect("PORT must be a number");

    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn build_cors_layer() -> CorsLayer {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .split(',')
        .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(false)
}
