//! Wallet service layer - escrow balances and the audit ledger
//!
//! Balance changes and their audit rows always land in the same database
//! transaction. The in-transaction helpers (`debit`, `credit`) take a
//! `PgConnection` so the order and dispute services can compose them into
//! their own transactions; the wallet row is locked `FOR UPDATE` for the
//! duration.

use chrono::Utc;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{
    GatewayEvent, Wallet, WalletSummary, WalletTransaction, WalletTxStatus, WalletTxType,
};

/// Make sure the user has a wallet row; balances are created lazily.
pub async fn ensure_wallet(conn: &mut PgConnection, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallets (id, user_id, balance, created_at, updated_at)
        VALUES ($1, $2, 0, $3, $3)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Debit a user's wallet and append the audit transaction.
///
/// Fails with `InsufficientFunds` before touching anything if the locked
/// balance does not cover the amount.
pub async fn debit(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    tx_type: WalletTxType,
    order_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    ensure_wallet(&mut *conn, user_id).await?;

    let (balance,): (i64,) =
        sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

    if balance < amount {
        return Err(ServiceError::InsufficientFunds {
            balance,
            required: amount,
        });
    }

    sqlx::query("UPDATE wallets SET balance = balance - $1, updated_at = $2 WHERE user_id = $3")
        .bind(amount)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    append_transaction(conn, user_id, tx_type, amount, None, order_id).await?;

    Ok(())
}

/// Credit a user's wallet unconditionally and append the audit transaction.
pub async fn credit(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    tx_type: WalletTxType,
    order_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    ensure_wallet(&mut *conn, user_id).await?;

    sqlx::query("UPDATE wallets SET balance = balance + $1, updated_at = $2 WHERE user_id = $3")
        .bind(amount)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    append_transaction(conn, user_id, tx_type, amount, None, order_id).await?;

    Ok(())
}

async fn append_transaction(
    conn: &mut PgConnection,
    user_id: Uuid,
    tx_type: WalletTxType,
    amount: i64,
    gateway_ref: Option<&str>,
    order_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallet_transactions (id, user_id, tx_type, amount, status, gateway_ref, order_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(tx_type)
    .bind(amount)
    .bind(WalletTxStatus::Completed)
    .bind(gateway_ref)
    .bind(order_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Wallet service for balance queries, top-ups, and admin overrides
pub struct WalletService {
    db_pool: PgPool,
}

impl WalletService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Balance plus derived ledger aggregates. Aggregates are computed from
    /// completed transactions, never stored.
    pub async fn summary(&self, user_id: Uuid) -> Result<WalletSummary, ServiceError> {
        let balance: Option<(i64,)> =
            sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db_pool)
                .await?;

        let (total_topup, total_spent): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE tx_type = 'topup' AND status = 'completed'), 0)::BIGINT,
                COALESCE(SUM(amount) FILTER (WHERE tx_type = 'purchase' AND status = 'completed'), 0)::BIGINT
            FROM wallet_transactions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(WalletSummary {
            user_id,
            balance: balance.map(|(b,)| b).unwrap_or(0),
            total_topup,
            total_spent,
        })
    }

    /// List a user's audit transactions, newest first.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<WalletTransaction>, ServiceError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let transactions = sqlx::query_as::<_, WalletTransaction>(
            r#"
            SELECT * FROM wallet_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(transactions)
    }

    /// Record a pending gateway top-up. The balance is only credited when
    /// the signature-verified webhook completes the transaction.
    pub async fn start_topup(
        &self,
        user_id: Uuid,
        amount: i64,
        gateway_ref: &str,
    ) -> Result<WalletTransaction, ServiceError> {
        let transaction = sqlx::query_as::<_, WalletTransaction>(
            r#"
            INSERT INTO wallet_transactions (id, user_id, tx_type, amount, status, gateway_ref, order_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(WalletTxType::Topup)
        .bind(amount)
        .bind(WalletTxStatus::Pending)
        .bind(gateway_ref)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(transaction)
    }

    /// Settle a pending top-up from a gateway webhook event. Returns the
    /// settled transaction, or `None` when no pending top-up matches the
    /// reference (the webhook may belong to an order instead).
    pub async fn settle_topup(
        &self,
        gateway_ref: &str,
        event: GatewayEvent,
    ) -> Result<Option<WalletTransaction>, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        let status = match event {
            GatewayEvent::PaymentCompleted => WalletTxStatus::Completed,
            GatewayEvent::PaymentFailed => WalletTxStatus::Failed,
        };

        // Guarded on the pending status: a replayed webhook is a no-op.
        let settled = sqlx::query_as::<_, WalletTransaction>(
            r#"
            UPDATE wallet_transactions
            SET status = $1
            WHERE gateway_ref = $2 AND tx_type = 'topup' AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(gateway_ref)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(transaction) = &settled {
            if status == WalletTxStatus::Completed {
                ensure_wallet(&mut tx, transaction.user_id).await?;
                sqlx::query(
                    "UPDATE wallets SET balance = balance + $1, updated_at = $2 WHERE user_id = $3",
                )
                .bind(transaction.amount)
                .bind(Utc::now())
                .bind(transaction.user_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(settled)
    }

    /// Admin escape hatch: set a balance directly. No bounds checking, no
    /// ledger row; audited with the acting admin's identity instead.
    pub async fn set_balance(
        &self,
        user_id: Uuid,
        new_balance: i64,
        admin_id: Uuid,
    ) -> Result<Wallet, ServiceError> {
        let mut tx = self.db_pool.begin().await?;

        ensure_wallet(&mut tx, user_id).await?;

        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            UPDATE wallets SET balance = $1, updated_at = $2
            WHERE user_id = $3
            RETURNING *
            "#,
        )
        .bind(new_balance)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO admin_audit (id, admin_id, action, target_id, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(admin_id)
        .bind("wallet.set_balance")
        .bind(user_id)
        .bind(json!({ "balance": new_balance }))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::warn!(admin = %admin_id, user = %user_id, balance = new_balance, "admin balance override");

        Ok(wallet)
    }
}
