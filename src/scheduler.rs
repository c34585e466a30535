//! Deferred removal of unpaid orders.
//!
//! Every new order gets a one-shot timer. Timers live in memory, so a
//! periodic sweep catches orders whose timer was lost across a restart.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    db::{DbPool, OrmConn},
    services::order_service,
};

pub trait ExpiryScheduler: Send + Sync {
    /// Arrange for `order_id` to be deleted once its payment window closes,
    /// provided it is still pending at that moment.
    fn schedule(&self, order_id: Uuid);
}

pub struct TokioExpiryScheduler {
    pool: DbPool,
    orm: OrmConn,
    delay: Duration,
}

impl TokioExpiryScheduler {
    pub fn new(pool: DbPool, orm: OrmConn, delay: Duration) -> Self {
        Self { pool, orm, delay }
    }
}

impl ExpiryScheduler for TokioExpiryScheduler {
    fn schedule(&self, order_id: Uuid) {
        let pool = self.pool.clone();
        let orm = self.orm.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match order_service::expire_pending_order(&orm, order_id).await {
                Ok(true) => {
                    tracing::info!(%order_id, "unpaid order expired");
                    audit::record(
                        &pool,
                        None,
                        AuditAction::OrderExpired,
                        serde_json::json!({ "order_id": order_id }),
                    )
                    .await;
                }
                Ok(false) => tracing::debug!(%order_id, "order no longer pending, nothing to expire"),
                Err(err) => tracing::warn!(%order_id, error = %err, "order expiry failed"),
            }
        });
    }
}

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically deletes pending orders older than `ttl`. Intervals shorter
/// than a second are raised to one.
pub fn spawn_expiry_sweeper(orm: OrmConn, ttl: Duration, every: Duration) -> JoinHandle<()> {
    let every = every.max(MIN_SWEEP_INTERVAL);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let cutoff = match chrono::Duration::from_std(ttl) {
                Ok(ttl) => Utc::now() - ttl,
                Err(err) => {
                    tracing::error!(error = %err, "payment window out of range, sweeper stopped");
                    break;
                }
            };
            match order_service::sweep_expired_orders(&orm, cutoff).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "swept expired pending orders"),
                Err(err) => tracing::warn!(error = %err, "expiry sweep failed"),
            }
        }
    })
}
