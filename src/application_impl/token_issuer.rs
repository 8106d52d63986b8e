use super::PairRegistry;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::Clock;
use crate::logger::*;
use std::sync::Arc;

/// Mints access/refresh pairs and records them in the pair registry.
pub struct TokenIssuer {
    codec: Arc<dyn TokenCodec>,
    registry: PairRegistry,
    clock: Arc<dyn Clock>,
    lifetimes: TokenLifetimes,
}

impl TokenIssuer {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        registry: PairRegistry,
        clock: Arc<dyn Clock>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        TokenIssuer {
            codec,
            registry,
            clock,
            lifetimes,
        }
    }

    pub async fn issue_pair(&self, subject: &Subject) -> Result<IssuedPair, AuthError> {
        self.issue_pair_with_claims(subject, serde_json::Map::new())
            .await
    }

    /// Both tokens share one `iat`, so either member can derive the other's
    /// expiry. A failed registry write is logged and the pair still returned:
    /// sibling revocation degrades, authentication does not.
    pub async fn issue_pair_with_claims(
        &self,
        subject: &Subject,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Result<IssuedPair, AuthError> {
        let now = self.clock.now();
        let access = self.mint(subject, TokenType::Access, now, extra.clone())?;
        let refresh = self.mint(subject, TokenType::Refresh, now, extra)?;

        if let Err(e) = self
            .registry
            .store_pair(
                &access.claims.jti,
                &refresh.claims.jti,
                self.lifetimes.refresh.as_secs(),
            )
            .await
        {
            warn!(
                subject = %subject,
                access_jti = %access.claims.jti,
                refresh_jti = %refresh.claims.jti,
                error = %e,
                "storing token pair failed"
            );
        }

        Ok(IssuedPair { access, refresh })
    }

    fn mint(
        &self,
        subject: &Subject,
        token_type: TokenType,
        now: i64,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Result<IssuedToken, AuthError> {
        let lifetime = self.lifetimes.secs_of(token_type);
        let claims = TokenClaims {
            extra,
            ..TokenClaims::new(
                subject.clone(),
                Jti::generate(),
                token_type,
                now,
                now.saturating_add(lifetime),
            )
        };
        let token = self.codec.encode(&claims)?;
        Ok(IssuedToken { token, claims })
    }
}
