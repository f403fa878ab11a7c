//! Order service layer - purchase, delivery, approval, refund, override
//!
//! Every operation that touches more than one row runs in a single
//! transaction: debit + order insert + ledger append for Create, status
//! flip + payout + ledger append for ApproveDelivery. Transition guards are
//! enforced on the row itself (`SELECT ... FOR UPDATE` then checked against
//! the lifecycle table), so two racing clients cannot both win.

use chrono::Utc;
use rand::Rng;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::lifecycle::{self, Transition};
use crate::models::{
    AdminOverrideRequest, ListOrdersQuery, Order, OrderStatus, PaymentStatus, Product,
    WalletTxType,
};
use crate::services::notifier;
use crate::wallet_service;

/// Order service for managing the purchase lifecycle
pub struct OrderService {
    db_pool: PgPool,
    seller_earning_percent: i64,
}

impl OrderService {
    pub fn new(db_pool: PgPool, seller_earning_percent: i64) -> Self {
        Self {
            db_pool,
            seller_earning_percent,
        }
    }

    /// Create a wallet-funded order: debit the buyer, insert the order, and
    /// append the purchase ledger row, all in one transaction.
    pub async fn create(&self, buyer_id: Uuid, product_id: Uuid) -> Result<Order, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let product = fetch_active_product(&mut tx, product_id).await?;
        if product.seller_id == buyer_id {
            return Err(ServiceError::Validation(
                "cannot purchase your own product".to_string(),
            ));
        }

        let order_id = Uuid::new_v4();
        let earning = lifecycle::seller_earning(product.price, self.seller_earning_percent);

        wallet_service::debit(
            &mut tx,
            buyer_id,
            product.price,
            WalletTxType::Purchase,
            Some(order_id),
        )
        .await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, reference, buyer_id, seller_id, product_id, amount, seller_earning,
                status, payment_status, buyer_approved, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, $10, $10)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(generate_reference())
        .bind(buyer_id)
        .bind(product.seller_id)
        .bind(product.id)
        .bind(product.price)
        .bind(earning)
        .bind(OrderStatus::Pending)
        .bind(PaymentStatus::Completed)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        notifier::enqueue_user(
            &mut tx,
            product.seller_id,
            "New order",
            &format!("Order {} is waiting for delivery", order.reference),
            Some(&format!("/seller/orders/{}", order.id)),
        )
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Create a gateway-funded order. No wallet debit; payment_status stays
    /// pending until the gateway webhook settles it.
    pub async fn create_gateway(
        &self,
        buyer_id: Uuid,
        product_id: Uuid,
        gateway_ref: &str,
    ) -> Result<Order, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let product = fetch_active_product(&mut tx, product_id).await?;
        if product.seller_id == buyer_id {
            return Err(ServiceError::Validation(
                "cannot purchase your own product".to_string(),
            ));
        }

        let earning = lifecycle::seller_earning(product.price, self.seller_earning_percent);

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, reference, buyer_id, seller_id, product_id, amount, seller_earning,
                status, payment_status, gateway_ref, buyer_approved, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, $11, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(generate_reference())
        .bind(buyer_id)
        .bind(product.seller_id)
        .bind(product.id)
        .bind(product.price)
        .bind(earning)
        .bind(OrderStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(gateway_ref)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Seller delivery: attach credentials and move pending -> delivered.
    pub async fn deliver(
        &self,
        order_id: Uuid,
        seller_id: Uuid,
        credentials: &str,
    ) -> Result<Order, ServiceError> {
        if credentials.trim().is_empty() {
            return Err(ServiceError::Validation(
                "credentials must not be empty".to_string(),
            ));
        }

        let mut tx = self.db_pool.begin().await?;

        let order = fetch_order_for_update(&mut tx, order_id).await?;
        if order.seller_id != seller_id {
            return Err(ServiceError::Unauthorized);
        }
        if order.payment_status != PaymentStatus::Completed {
            return Err(ServiceError::PaymentNotCompleted(order.id));
        }
        lifecycle::check(order.status, Transition::UserDriven(OrderStatus::Delivered))?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1, credentials = $2, delivered_at = $3, updated_at = $3
            WHERE id = $4 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(OrderStatus::Delivered)
        .bind(credentials)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        notifier::enqueue_user(
            &mut tx,
            order.buyer_id,
            "Order delivered",
            &format!("Order {} has been delivered", order.reference),
            Some(&format!("/orders/{}", order.id)),
        )
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Buyer approval: move delivered -> completed and release the escrowed
    /// seller earning in the same transaction.
    pub async fn approve_delivery(
        &self,
        order_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Order, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let order = fetch_order_for_update(&mut tx, order_id).await?;
        if order.buyer_id != caller_id {
            return Err(ServiceError::Unauthorized);
        }
        lifecycle::check(order.status, Transition::UserDriven(OrderStatus::Completed))?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1, buyer_approved = TRUE, updated_at = $2
            WHERE id = $3 AND status = 'delivered'
            RETURNING *
            "#,
        )
        .bind(OrderStatus::Completed)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        wallet_service::credit(
            &mut tx,
            order.seller_id,
            order.seller_earning,
            WalletTxType::Payout,
            Some(order.id),
        )
        .await?;

        notifier::enqueue_user(
            &mut tx,
            order.seller_id,
            "Payout released",
            &format!("Order {} was approved by the buyer", order.reference),
            Some(&format!("/seller/orders/{}", order.id)),
        )
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Refund transition inside an existing transaction. Guarded on the
    /// current status, so refunding twice surfaces `AlreadyProcessed`
    /// instead of silently rewriting the row.
    pub async fn refund_in_tx(
        conn: &mut PgConnection,
        order_id: Uuid,
    ) -> Result<Order, ServiceError> {
        let refunded = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = 'refunded', updated_at = $1
            WHERE id = $2 AND status IN ('pending', 'delivered')
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

        match refunded {
            Some(order) => Ok(order),
            None => {
                let exists: (bool,) =
                    sqlx::query_as("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
                        .bind(order_id)
                        .fetch_one(&mut *conn)
                        .await?;
                if exists.0 {
                    Err(ServiceError::AlreadyProcessed)
                } else {
                    Err(ServiceError::NotFound)
                }
            }
        }
    }

    /// Settle a gateway-funded order from a webhook event. Returns the
    /// updated order, or `None` when no pending-payment order matches.
    pub async fn settle_gateway_payment(
        &self,
        gateway_ref: &str,
        status: PaymentStatus,
    ) -> Result<Option<Order>, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET payment_status = $1, updated_at = $2
            WHERE gateway_ref = $3 AND payment_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(gateway_ref)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(order) = &order {
            if status == PaymentStatus::Completed {
                notifier::enqueue_user(
                    &mut tx,
                    order.seller_id,
                    "New order",
                    &format!("Order {} is paid and waiting for delivery", order.reference),
                    Some(&format!("/seller/orders/{}", order.id)),
                )
                .await?;
            }
        }

        tx.commit().await?;
        Ok(order)
    }

    /// Admin escape hatch: set status, amount, or credentials directly,
    /// bypassing the transition table. Audited with the actor in the same
    /// transaction. Deliberately allows states the user-facing flow cannot
    /// produce (e.g. delivered without credentials).
    pub async fn admin_override(
        &self,
        order_id: Uuid,
        actor: Uuid,
        request: AdminOverrideRequest,
    ) -> Result<Order, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let current = fetch_order_for_update(&mut tx, order_id).await?;

        let target_status = match request.status {
            Some(target) => {
                lifecycle::check(current.status, Transition::AdminOverride { target, actor })?
            }
            None => current.status,
        };

        // The seller split follows a changed gross amount so the earning
        // invariant holds in every state the override can produce.
        let (amount, earning) = match request.amount {
            Some(amount) => (
                amount,
                lifecycle::seller_earning(amount, self.seller_earning_percent),
            ),
            None => (current.amount, current.seller_earning),
        };

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1, amount = $2, seller_earning = $3,
                credentials = COALESCE($4, credentials), updated_at = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(target_status)
        .bind(amount)
        .bind(earning)
        .bind(request.credentials.as_deref())
        .bind(Utc::now())
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO admin_audit (id, admin_id, action, target_id, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor)
        .bind("order.override")
        .bind(order_id)
        .bind(json!({
            "from_status": current.status,
            "to_status": order.status,
            "amount": order.amount,
            "credentials_changed": request.credentials.is_some(),
        }))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::warn!(admin = %actor, order = %order_id, status = %order.status, "admin order override");

        Ok(order)
    }

    /// Admin-only hard delete. Irreversible; only the audit row remains.
    pub async fn delete(&self, order_id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO admin_audit (id, admin_id, action, target_id, detail, created_at)
            VALUES ($1, $2, $3, $4, NULL, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor)
        .bind("order.delete")
        .bind(order_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::warn!(admin = %actor, order = %order_id, "admin order delete");

        Ok(())
    }

    /// Get a single order by ID
    pub async fn get(&self, order_id: Uuid) -> Result<Option<Order>, ServiceError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(order)
    }

    /// List orders with filtering and pagination
    pub async fn list(&self, query: ListOrdersQuery) -> Result<Vec<Order>, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM orders WHERE 1=1");

        if let Some(buyer_id) = query.buyer_id {
            query_builder.push(" AND buyer_id = ");
            query_builder.push_bind(buyer_id);
        }
        if let Some(seller_id) = query.seller_id {
            query_builder.push(" AND seller_id = ");
            query_builder.push_bind(seller_id);
        }
        if let Some(status) = query.status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }

        query_builder.push(" ORDER BY created_at DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let orders = query_builder
            .build_query_as::<Order>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(orders)
    }
}

async fn fetch_active_product(
    conn: &mut PgConnection,
    product_id: Uuid,
) -> Result<Product, ServiceError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = $1 AND active = TRUE",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    product.ok_or(ServiceError::NotFound)
}

async fn fetch_order_for_update(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Order, ServiceError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    order.ok_or(ServiceError::NotFound)
}

/// Short human-readable order reference, e.g. `VD-8F3K2Q`.
fn generate_reference() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let code: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("VD-{}", code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_short_and_unambiguous() {
        let reference = generate_reference();
        assert!(reference.starts_with("VD-"));
        assert_eq!(reference.len(), 9);
        // 0, 1, I, L, O are excluded from the alphabet
        assert!(!reference[3..]
            .chars()
            .any(|c| matches!(c, '0' | '1' | 'I' | 'L' | 'O')));
    }
}
