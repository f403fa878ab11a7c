//! Scheduled maintenance jobs

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Start the scheduler with the stale-payment sweep. Gateway orders and
/// top-ups that never saw a webhook within a day are marked failed so they
/// stop blocking delivery surfaces.
pub async fn start_scheduler(db_pool: PgPool) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let pool = db_pool.clone();
    scheduler
        .add(Job::new_async("0 */10 * * * *", move |_id, _lock| {
            let pool = pool.clone();
            Box::pin(async move {
                if let Err(err) = expire_stale_payments(&pool).await {
                    error!(error = %err, "stale payment sweep failed");
                }
            })
        })?)
        .await?;

    scheduler.start().await?;
    info!("maintenance scheduler started");

    Ok(scheduler)
}

async fn expire_stale_payments(pool: &PgPool) -> Result<(), sqlx::Error> {
    let cutoff = Utc::now() - chrono::Duration::days(1);

    let orders = sqlx::query(
        r#"
        UPDATE orders
        SET payment_status = 'failed', updated_at = $1
        WHERE payment_status = 'pending' AND status = 'pending' AND created_at < $2
        "#,
    )
    .bind(Utc::now())
    .bind(cutoff)
    .execute(pool)
    .await?;

    let topups = sqlx::query(
        r#"
        UPDATE wallet_transactions
        SET status = 'failed'
        WHERE tx_type = 'topup' AND status = 'pending' AND created_at < $1
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    if orders.rows_affected() > 0 || topups.rows_affected() > 0 {
        info!(
            orders = orders.rows_affected(),
            topups = topups.rows_affected(),
            "expired stale pending payments"
        );
    }

    Ok(())
}
