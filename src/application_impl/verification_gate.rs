use super::{Blacklist, LogoutAllMarker};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::Clock;
use crate::logger::*;
use std::sync::Arc;

/// Per-request admission check.
///
/// Runs in a fixed order and stops at the first failure:
///
/// 1. decode: signature and expiry (`TokenExpired`, `TokenSignatureInvalid`,
///    `TokenMalformed`), then the optional type restriction;
/// 2. blacklist (`TokenRevoked`);
/// 3. logout-all marker (`TokenSupersededByLogoutAll`);
/// 4. admitted, returning the claims.
///
/// Only reads the store. A store error in steps 2-3 rejects the request with
/// `StoreUnavailable`; it is never read as "not revoked".
pub struct VerificationGate {
    codec: Arc<dyn TokenCodec>,
    blacklist: Blacklist,
    marker: LogoutAllMarker,
    clock: Arc<dyn Clock>,
}

impl VerificationGate {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        blacklist: Blacklist,
        marker: LogoutAllMarker,
        clock: Arc<dyn Clock>,
    ) -> Self {
        VerificationGate {
            codec,
            blacklist,
            marker,
            clock,
        }
    }

    pub async fn verify(
        &self,
        token: &str,
        expected: Option<TokenType>,
    ) -> Result<TokenClaims, AuthError> {
        let claims = self.codec.decode(token, self.clock.now())?;

        if let Some(expected) = expected {
            if claims.token_type != expected {
                return Err(AuthError::TokenTypeMismatch {
                    expected,
                    actual: claims.token_type,
                });
            }
        }

        if self.blacklist.is_revoked(&claims.jti).await? {
            debug!(jti = %claims.jti, "rejected revoked token");
            return Err(AuthError::TokenRevoked);
        }

        if self
            .marker
            .is_before_last_logout_all(&claims.sub, claims.iat)
            .await?
        {
            debug!(jti = %claims.jti, subject = %claims.sub, "rejected token issued before logout-all");
            return Err(AuthError::TokenSupersededByLogoutAll);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::PairRegistry;
    use crate::application_impl::TokenIssuer;
    use crate::application_impl::test_support::*;

    struct Harness {
        fx: Fixture,
        gate: VerificationGate,
        issuer: TokenIssuer,
        blacklist: Blacklist,
        marker: LogoutAllMarker,
    }

    fn harness() -> Harness {
        let fx = Fixture::new();
        let clock: Arc<dyn Clock> = Arc::new(fx.clock.clone());
        let blacklist = Blacklist::new(fx.store.clone());
        let marker = LogoutAllMarker::new(fx.store.clone());
        Harness {
            gate: VerificationGate::new(
                fx.codec.clone(),
                blacklist.clone(),
                marker.clone(),
                clock.clone(),
            ),
            issuer: TokenIssuer::new(
                fx.codec.clone(),
                PairRegistry::new(fx.store.clone()),
                clock,
                LIFETIMES,
            ),
            blacklist,
            marker,
            fx,
        }
    }

    #[tokio::test]
    async fn test_access_expires_before_refresh() {
        let h = harness();
        let pair = h.issuer.issue_pair(&Subject::new("u")).await.unwrap();

        h.fx.clock.set(1_000);
        assert!(matches!(
            h.gate.verify(&pair.access.token, None).await,
            Err(AuthError::TokenExpired)
        ));
        let claims = h
            .gate
            .verify(&pair.refresh.token, Some(TokenType::Refresh))
            .await
            .unwrap();
        assert_eq!(claims.sub, Subject::new("u"));
    }

    #[tokio::test]
    async fn test_type_restriction() {
        let h = harness();
        let pair = h.issuer.issue_pair(&Subject::new("u")).await.unwrap();

        assert!(matches!(
            h.gate.verify(&pair.access.token, Some(TokenType::Refresh)).await,
            Err(AuthError::TokenTypeMismatch {
                expected: TokenType::Refresh,
                actual: TokenType::Access
            })
        ));
        assert!(h.gate.verify(&pair.refresh.token, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_blacklisted_token_rejected_despite_valid_signature() {
        let h = harness();
        let pair = h.issuer.issue_pair(&Subject::new("u")).await.unwrap();
        h.blacklist.revoke(&pair.access.claims.jti, 900).await.unwrap();

        assert!(matches!(
            h.gate.verify(&pair.access.token, None).await,
            Err(AuthError::TokenRevoked)
        ));
        assert!(h.gate.verify(&pair.refresh.token, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_all_supersedes_older_tokens_only() {
        let h = harness();
        let subject = Subject::new("u");
        h.fx.clock.set(10);
        let old = h.issuer.issue_pair(&subject).await.unwrap();

        h.fx.clock.set(20);
        h.marker.mark(&subject, 20, 1_209_600).await.unwrap();

        h.fx.clock.set(21);
        let new = h.issuer.issue_pair(&subject).await.unwrap();

        assert!(matches!(
            h.gate.verify(&old.access.token, None).await,
            Err(AuthError::TokenSupersededByLogoutAll)
        ));
        assert!(matches!(
            h.gate.verify(&old.refresh.token, None).await,
            Err(AuthError::TokenSupersededByLogoutAll)
        ));
        assert!(h.gate.verify(&new.access.token, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoked_check_precedes_marker_check() {
        let h = harness();
        let subject = Subject::new("u");
        let pair = h.issuer.issue_pair(&subject).await.unwrap();
        h.blacklist.revoke(&pair.access.claims.jti, 900).await.unwrap();
        h.marker.mark(&subject, 5, 1_209_600).await.unwrap();

        assert!(matches!(
            h.gate.verify(&pair.access.token, None).await,
            Err(AuthError::TokenRevoked)
        ));
    }
}
