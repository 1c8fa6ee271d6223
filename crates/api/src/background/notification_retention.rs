//! Periodic cleanup of old read notifications.
//!
//! Deletes read notifications older than the configured retention period on a
//! fixed interval. Unread notifications are never purged. The job is opt-in:
//! the binary only spawns it when `NOTIFICATION_PURGE_INTERVAL_HOURS` is set.

use std::time::Duration;

use projecthub_db::repositories::NotificationRepo;
use projecthub_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Run a single purge pass, returning the number of deleted rows.
pub async fn purge_once(pool: &DbPool, retention_days: i64) -> Result<u64, sqlx::Error> {
    NotificationRepo::purge_read_older_than(pool, retention_days).await
}

/// Run the notification retention loop until `cancel` is triggered.
pub async fn run(pool: DbPool, interval_hours: u64, retention_days: i64, cancel: CancellationToken) {
    let period = Duration::from_secs(interval_hours.max(1) * 3600);

    tracing::info!(
        retention_days,
        interval_secs = period.as_secs(),
        "Notification retention job started"
    );

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notification retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match purge_once(&pool, retention_days).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Notification retention: purged old rows");
                    }
                    Ok(_) => {
                        tracing::debug!("Notification retention: no rows to purge");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Notification retention: cleanup failed");
                    }
                }
            }
        }
    }
}
