use super::keys;
use crate::domain_model::Subject;
use crate::domain_port::*;
use std::sync::Arc;

/// Per-subject timestamp of the latest mass logout. Any token issued
/// strictly before it is dead.
#[derive(Clone)]
pub struct LogoutAllMarker {
    store: Arc<dyn TtlStore>,
}

impl LogoutAllMarker {
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        LogoutAllMarker { store }
    }

    /// Record a mass logout at `at`. Monotonic: a concurrent call carrying an
    /// older timestamp never replaces a newer marker. Returns the marker now
    /// in effect.
    pub async fn mark(&self, subject: &Subject, at: i64, ttl_secs: u64) -> Result<i64, StoreError> {
        self.store
            .set_max_ex(&keys::logout_all(subject), at, ttl_secs.max(1))
            .await
    }

    pub async fn is_before_last_logout_all(
        &self,
        subject: &Subject,
        issued_at: i64,
    ) -> Result<bool, StoreError> {
        let key = keys::logout_all(subject);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(false);
        };
        let marker = raw.parse::<i64>().map_err(|e| StoreError::Corrupt {
            key,
            reason: e.to_string(),
        })?;
        Ok(marker > issued_at)
    }
}
