use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    random::{RandomSource, ThreadRandom},
    scheduler::{ExpiryScheduler, TokioExpiryScheduler},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub expiry: Arc<dyn ExpiryScheduler>,
    pub rng: Arc<dyn RandomSource>,
}

impl AppState {
    /// State wired with the tokio expiry timer and the thread RNG.
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> Self {
        let expiry = TokioExpiryScheduler::new(pool.clone(), orm.clone(), config.pending_order_ttl);
        Self {
            pool,
            orm,
            config: Arc::new(config),
            expiry: Arc::new(expiry),
            rng: Arc::new(ThreadRandom),
        }
    }

    pub fn with_random_source(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_expiry_scheduler(mut self, expiry: Arc<dyn ExpiryScheduler>) -> Self {
        self.expiry = expiry;
        self
    }
}
