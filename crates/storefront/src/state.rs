//! Shared handler state.

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use pencraft_core::ShippingPolicy;

use crate::config::StorefrontConfig;

/// Pool and settings every handler can reach. Clones share one allocation.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    token_ttl: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let token_ttl = config.token_ttl();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                token_ttl,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Lifetime of tokens issued at login and registration.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.inner.token_ttl
    }

    /// Shipping rule applied at checkout.
    #[must_use]
    pub fn shipping(&self) -> ShippingPolicy {
        self.inner.config.shipping
    }
}
