use super::keys;
use crate::application_port::AuthError;
use crate::domain_port::TtlStore;
use crate::logger::*;
use std::sync::Arc;

/// Fixed-window request counter, one window per `(scope, key)`.
///
/// Limiting is advisory: when the store cannot be reached the request is let
/// through and the failure logged.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn TtlStore>,
    scope: &'static str,
    limit: u64,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn TtlStore>, scope: &'static str, limit: u64, window_secs: u64) -> Self {
        RateLimiter {
            store,
            scope,
            limit,
            window_secs,
        }
    }

    pub fn per_minute(store: Arc<dyn TtlStore>, scope: &'static str, limit: u64) -> Self {
        Self::new(store, scope, limit, 60)
    }

    pub fn per_day(store: Arc<dyn TtlStore>, scope: &'static str, limit: u64) -> Self {
        Self::new(store, scope, limit, 86_400)
    }

    /// Count one hit against `key`; reject once the window holds more than
    /// `limit` hits.
    pub async fn check(&self, key: &str) -> Result<(), AuthError> {
        let window = match self
            .store
            .incr_window(&keys::rate_limit(self.scope, key), self.window_secs)
            .await
        {
            Ok(window) => window,
            Err(e) => {
                warn!(scope = self.scope, key, error = %e, "rate limit check skipped");
                return Ok(());
            }
        };

        if window.count > self.limit {
            debug!(scope = self.scope, key, count = window.count, "rate limited");
            return Err(AuthError::RateLimited {
                retry_after_secs: window.reset_in_secs.max(1),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::test_support::Fixture;

    #[tokio::test]
    async fn test_sixth_hit_in_window_is_rejected() {
        let fx = Fixture::new();
        let limiter = RateLimiter::per_minute(fx.store.clone(), "login", 5);

        for _ in 0..5 {
            limiter.check("user:dan").await.unwrap();
        }
        fx.clock.advance(20);
        assert!(matches!(
            limiter.check("user:dan").await,
            Err(AuthError::RateLimited { retry_after_secs: 40 })
        ));
        limiter.check("user:eve").await.unwrap();
    }

    #[tokio::test]
    async fn test_window_resets() {
        let fx = Fixture::new();
        let limiter = RateLimiter::per_minute(fx.store.clone(), "login", 1);

        limiter.check("ip:10.0.0.1").await.unwrap();
        assert!(limiter.check("ip:10.0.0.1").await.is_err());
        fx.clock.advance(60);
        limiter.check("ip:10.0.0.1").await.unwrap();
    }
}
