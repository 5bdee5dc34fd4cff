//! Per-user job cooldown, backed by the durable job store.
//!
//! Deliberately not an in-memory counter: the decision is a query against
//! persisted job rows, so every instance of the service reaches the same
//! answer. The authoritative enforcement is the store's atomic
//! `create_if_not_rate_limited`; this check is the fast path that produces
//! the user-facing error before any work starts.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use super::store::LeadJobStore;

/// One job per user per minute.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

pub struct RateLimiter {
    store: Arc<dyn LeadJobStore>,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn LeadJobStore>) -> Self {
        Self {
            store,
            window: RATE_LIMIT_WINDOW,
        }
    }

    /// Whether this user may start a job right now.
    pub async fn allow(&self, user_id: &str) -> Result<bool> {
        let recent = self.store.created_within(user_id, self.window).await?;
        Ok(recent == 0)
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
