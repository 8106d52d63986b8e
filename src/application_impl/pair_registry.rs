use super::keys;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

/// Bidirectional access <-> refresh jti mapping. An optimization for finding
/// a sibling to revoke, not a security boundary.
#[derive(Clone)]
pub struct PairRegistry {
    store: Arc<dyn TtlStore>,
}

impl PairRegistry {
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        PairRegistry { store }
    }

    pub async fn store_pair(
        &self,
        access_jti: &Jti,
        refresh_jti: &Jti,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let entries = [
            (
                keys::token_pair(PairDirection::AccessToRefresh, access_jti),
                refresh_jti.to_string(),
            ),
            (
                keys::token_pair(PairDirection::RefreshToAccess, refresh_jti),
                access_jti.to_string(),
            ),
        ];
        self.store.set_many_ex(&entries, ttl_secs.max(1)).await
    }

    /// `direction` names the type of `jti` itself.
    pub async fn lookup_sibling(
        &self,
        jti: &Jti,
        direction: PairDirection,
    ) -> Result<Option<Jti>, StoreError> {
        let sibling = self.store.get(&keys::token_pair(direction, jti)).await?;
        Ok(sibling.map(Jti))
    }

    /// Idempotent; absent entries are fine.
    pub async fn remove_pair(&self, access_jti: &Jti, refresh_jti: &Jti) -> Result<(), StoreError> {
        let keys = [
            keys::token_pair(PairDirection::AccessToRefresh, access_jti),
            keys::token_pair(PairDirection::RefreshToAccess, refresh_jti),
        ];
        self.store.del(&keys).await?;
        Ok(())
    }
}
