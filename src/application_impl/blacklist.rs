use super::keys;
use crate::domain_model::Jti;
use crate::domain_port::*;
use std::sync::Arc;

/// Presence-only revocation markers, one per jti. Entries live exactly as
/// long as the token they block and are never deleted early.
#[derive(Clone)]
pub struct Blacklist {
    store: Arc<dyn TtlStore>,
}

impl Blacklist {
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Blacklist { store }
    }

    /// Idempotent. A zero TTL is raised to one second so a token in its last
    /// valid second is still blocked.
    pub async fn revoke(&self, jti: &Jti, ttl_secs: u64) -> Result<(), StoreError> {
        self.store
            .set_ex(&keys::blacklist(jti), "1", ttl_secs.max(1))
            .await
    }

    /// Revoke only if not already revoked. Returns false when someone else got
    /// there first; used to consume a refresh token exactly once.
    pub async fn claim(&self, jti: &Jti, ttl_secs: u64) -> Result<bool, StoreError> {
        self.store
            .set_nx_ex(&keys::blacklist(jti), "1", ttl_secs.max(1))
            .await
    }

    pub async fn is_revoked(&self, jti: &Jti) -> Result<bool, StoreError> {
        self.store.exists(&keys::blacklist(jti)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::test_support::Fixture;

    #[tokio::test]
    async fn test_revoke_twice_is_same_as_once() {
        let fx = Fixture::new();
        let blacklist = Blacklist::new(fx.store.clone());
        let jti = Jti::from("j1");

        assert!(!blacklist.is_revoked(&jti).await.unwrap());
        blacklist.revoke(&jti, 900).await.unwrap();
        blacklist.revoke(&jti, 900).await.unwrap();
        assert!(blacklist.is_revoked(&jti).await.unwrap());
        assert_eq!(fx.store.ttl("blacklist:j1"), Some(900));
    }

    #[tokio::test]
    async fn test_entry_expires_with_token() {
        let fx = Fixture::new();
        let blacklist = Blacklist::new(fx.store.clone());
        let jti = Jti::from("j1");
        blacklist.revoke(&jti, 30).await.unwrap();

        fx.clock.advance(29);
        assert!(blacklist.is_revoked(&jti).await.unwrap());
        fx.clock.advance(1);
        assert!(!blacklist.is_revoked(&jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_succeeds_once() {
        let fx = Fixture::new();
        let blacklist = Blacklist::new(fx.store.clone());
        let jti = Jti::from("r1");

        assert!(blacklist.claim(&jti, 60).await.unwrap());
        assert!(!blacklist.claim(&jti, 60).await.unwrap());
        assert!(blacklist.is_revoked(&jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_fails_on_revoked() {
        let fx = Fixture::new();
        let blacklist = Blacklist::new(fx.store.clone());
        let jti = Jti::from("r1");
        blacklist.revoke(&jti, 60).await.unwrap();
        assert!(!blacklist.claim(&jti, 60).await.unwrap());
    }
}
