//! Notification outbox worker
//!
//! Ledger mutations enqueue rows into `notification_outbox` inside their
//! own transactions; this worker drains the outbox and forwards each row to
//! the push side-channel. Delivery is at-least-once from the outbox's point
//! of view and the push endpoint is treated as opaque.

use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Notification, NotificationAudience, NotificationStatus};

const POLL_INTERVAL_SECONDS: u64 = 10;
const BATCH_SIZE: i64 = 20;

#[derive(Debug)]
pub enum StartError {
    NotConfigured,
}

#[derive(Clone)]
pub struct Notifier {
    db_pool: PgPool,
    endpoint: Option<String>,
    http: Client,
}

impl Notifier {
    pub fn new(db_pool: PgPool, endpoint: Option<String>) -> Self {
        Self {
            db_pool,
            endpoint,
            http: Client::new(),
        }
    }

    pub async fn start(self) -> Result<(), StartError> {
        let Some(endpoint) = self.endpoint.clone() else {
            return Err(StartError::NotConfigured);
        };

        info!("notification outbox worker started");

        loop {
            if let Err(err) = self.drain_once(&endpoint).await {
                error!(error = %err, "notification drain cycle failed");
            }

            sleep(Duration::from_secs(POLL_INTERVAL_SECONDS)).await;
        }
    }

    async fn drain_once(&self, endpoint: &str) -> Result<(), sqlx::Error> {
        let mut tx = self.db_pool.begin().await?;

        // SKIP LOCKED keeps a second worker instance from double-sending.
        let pending = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notification_outbox
            WHERE status = 'pending'
            ORDER BY created_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(BATCH_SIZE)
        .fetch_all(&mut *tx)
        .await?;

        for notification in &pending {
            let status = match self.push(endpoint, notification).await {
                Ok(()) => NotificationStatus::Sent,
                Err(err) => {
                    warn!(id = %notification.id, error = %err, "push delivery failed");
                    NotificationStatus::Failed
                }
            };

            sqlx::query(
                "UPDATE notification_outbox SET status = $1, sent_at = $2 WHERE id = $3",
            )
            .bind(status)
            .bind(Utc::now())
            .bind(notification.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn push(&self, endpoint: &str, notification: &Notification) -> Result<(), reqwest::Error> {
        self.http
            .post(endpoint)
            .json(&json!({
                "title": notification.title,
                "message": notification.message,
                "link": notification.link,
                "audience": notification.audience,
                "user_id": notification.user_id,
            }))
            .timeout(Duration::from_secs(30))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Enqueue a notification for one user inside the caller's transaction.
pub async fn enqueue_user(
    conn: &mut PgConnection,
    user_id: Uuid,
    title: &str,
    message: &str,
    link: Option<&str>,
) -> Result<(), sqlx::Error> {
    enqueue(
        conn,
        title,
        message,
        link,
        NotificationAudience::User,
        Some(user_id),
    )
    .await
}

/// Enqueue an audience-wide broadcast (admin push surface).
pub async fn enqueue_broadcast(
    conn: &mut PgConnection,
    title: &str,
    message: &str,
    link: Option<&str>,
    audience: NotificationAudience,
) -> Result<(), sqlx::Error> {
    enqueue(conn, title, message, link, audience, None).await
}

async fn enqueue(
    conn: &mut PgConnection,
    title: &str,
    message: &str,
    link: Option<&str>,
    audience: NotificationAudience,
    user_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO notification_outbox (id, title, message, link, audience, user_id, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(message)
    .bind(link)
    .bind(audience)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}
