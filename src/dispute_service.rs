//! Dispute service layer - refund, cancellation, and account-deletion
//! requests with admin resolution
//!
//! Resolution is guarded server-side: the status flip is a conditional
//! UPDATE on `status = 'pending'`, so a second resolution of the same
//! request fails with `AlreadyProcessed` and cannot double-credit. Side
//! effects run in the same transaction as the flip.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{
    DisputeDecision, DisputeRequest, DisputeStatus, DisputeType, ListDisputesQuery,
    SubmitDisputeRequest, WalletTxType,
};
use crate::order_service::OrderService;
use crate::services::notifier;
use crate::wallet_service;

/// Purchase-type tag that marks a refund as applying to the pro
/// subscription rather than an order ledger entry.
pub const PURCHASE_TYPE_PRO_PLAN: &str = "pro_plan";

/// Dispute service for buyer requests and admin resolution
pub struct DisputeService {
    db_pool: PgPool,
}

impl DisputeService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Submit a new request. Field requirements depend on the variant.
    pub async fn submit(
        &self,
        user_id: Uuid,
        request: SubmitDisputeRequest,
    ) -> Result<DisputeRequest, ServiceError> {
        if request.request_type == DisputeType::Refund {
            match request.amount {
                Some(amount) if amount > 0 => {}
                _ => {
                    return Err(ServiceError::Validation(
                        "refund requests require a positive amount".to_string(),
                    ))
                }
            }
            if request
                .purchase_type
                .as_deref()
                .map_or(true, |tag| tag.trim().is_empty())
            {
                return Err(ServiceError::Validation(
                    "refund requests require a purchase type".to_string(),
                ));
            }
        }

        let dispute = sqlx::query_as::<_, DisputeRequest>(
            r#"
            INSERT INTO dispute_requests (
                id, user_id, request_type, amount, purchase_type, order_id,
                reason, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.request_type)
        .bind(request.amount)
        .bind(request.purchase_type)
        .bind(request.order_id)
        .bind(request.reason)
        .bind(DisputeStatus::Pending)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(dispute)
    }

    /// Resolve a pending request. Exactly once: the flip is guarded on the
    /// pending status and the approval side effects share its transaction.
    pub async fn resolve(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        decision: DisputeDecision,
        notes: Option<String>,
    ) -> Result<DisputeRequest, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let status = match decision {
            DisputeDecision::Approved => DisputeStatus::Approved,
            DisputeDecision::Rejected => DisputeStatus::Rejected,
        };

        let resolved = sqlx::query_as::<_, DisputeRequest>(
            r#"
            UPDATE dispute_requests
            SET status = $1, admin_notes = $2, processed_at = $3
            WHERE id = $4 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(notes.as_deref())
        .bind(Utc::now())
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let dispute = match resolved {
            Some(dispute) => dispute,
            None => {
                let exists: (bool,) =
                    sqlx::query_as("SELECT EXISTS(SELECT 1 FROM dispute_requests WHERE id = $1)")
                        .bind(request_id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(if exists.0 {
                    ServiceError::AlreadyProcessed
                } else {
                    ServiceError::NotFound
                });
            }
        };

        if decision == DisputeDecision::Approved {
            // Closed set of variants; the match is exhaustive on purpose so
            // a new request type cannot ship without a resolution arm.
            match dispute.request_type {
                DisputeType::Refund => {
                    let amount = dispute.amount.ok_or_else(|| {
                        ServiceError::Validation("refund request has no amount".to_string())
                    })?;

                    wallet_service::credit(
                        &mut tx,
                        dispute.user_id,
                        amount,
                        WalletTxType::Refund,
                        dispute.order_id,
                    )
                    .await?;

                    if dispute.purchase_type.as_deref() == Some(PURCHASE_TYPE_PRO_PLAN) {
                        clear_pro_flag(&mut tx, dispute.user_id).await?;
                    }

                    if let Some(order_id) = dispute.order_id {
                        OrderService::refund_in_tx(&mut tx, order_id).await?;
                    }
                }
                DisputeType::Cancellation => {
                    clear_pro_flag(&mut tx, dispute.user_id).await?;
                }
                DisputeType::AccountDeletion => {
                    sqlx::query(
                        "UPDATE users SET deletion_requested = TRUE, updated_at = $1 WHERE id = $2",
                    )
                    .bind(Utc::now())
                    .bind(dispute.user_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        let (title, message) = match status {
            DisputeStatus::Approved => ("Request approved", "Your request has been approved"),
            _ => ("Request rejected", "Your request has been rejected"),
        };
        notifier::enqueue_user(&mut tx, dispute.user_id, title, message, Some("/requests")).await?;

        tx.commit().await?;

        tracing::info!(
            admin = %admin_id,
            request = %request_id,
            decision = ?decision,
            "dispute request resolved"
        );

        Ok(dispute)
    }

    /// Get a single request by ID
    pub async fn get(&self, request_id: Uuid) -> Result<Option<DisputeRequest>, ServiceError> {
        let dispute =
            sqlx::query_as::<_, DisputeRequest>("SELECT * FROM dispute_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.db_pool)
                .await?;

        Ok(dispute)
    }

    /// Unified read model across all three variants: newest first,
    /// filterable by type, status, and free-text search.
    pub async fn list(&self, query: ListDisputesQuery) -> Result<Vec<DisputeRequest>, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM dispute_requests WHERE 1=1");

        if let Some(request_type) = query.request_type {
            query_builder.push(" AND request_type = ");
            query_builder.push_bind(request_type);
        }
        if let Some(status) = query.status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }
        if let Some(search) = query.search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query_builder.push(" AND (reason ILIKE ");
            query_builder.push_bind(pattern.clone());
            query_builder.push(" OR admin_notes ILIKE ");
            query_builder.push_bind(pattern);
            query_builder.push(")");
        }

        query_builder.push(" ORDER BY created_at DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let disputes = query_builder
            .build_query_as::<DisputeRequest>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(disputes)
    }

    /// A user's own requests, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<DisputeRequest>, ServiceError> {
        let disputes = sqlx::query_as::<_, DisputeRequest>(
            "SELECT * FROM dispute_requests WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(disputes)
    }
}

async fn clear_pro_flag(conn: &mut sqlx::PgConnection, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_pro = FALSE, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
