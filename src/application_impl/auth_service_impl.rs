use super::{
    Blacklist, LogoutAllMarker, PairRegistry, RateLimiter, TokenIssuer, VerificationGate,
};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

const USERNAME_MAX_LEN: usize = 50;
const EMAIL_MAX_LEN: usize = 100;
const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub lifetimes: TokenLifetimes,
    pub login_per_minute: u64,
    pub register_per_day: u64,
}

pub struct RealAuthService {
    identity_store: Arc<dyn IdentityStore>,
    clock: Arc<dyn Clock>,
    issuer: TokenIssuer,
    gate: VerificationGate,
    registry: PairRegistry,
    blacklist: Blacklist,
    marker: LogoutAllMarker,
    login_limiter: RateLimiter,
    register_limiter: RateLimiter,
    lifetimes: TokenLifetimes,
}

impl RealAuthService {
    pub fn new(
        identity_store: Arc<dyn IdentityStore>,
        ttl_store: Arc<dyn TtlStore>,
        token_codec: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
        config: AuthConfig,
    ) -> Self {
        let registry = PairRegistry::new(ttl_store.clone());
        let blacklist = Blacklist::new(ttl_store.clone());
        let marker = LogoutAllMarker::new(ttl_store.clone());
        Self {
            issuer: TokenIssuer::new(
                token_codec.clone(),
                registry.clone(),
                clock.clone(),
                config.lifetimes,
            ),
            gate: VerificationGate::new(
                token_codec,
                blacklist.clone(),
                marker.clone(),
                clock.clone(),
            ),
            login_limiter: RateLimiter::per_minute(
                ttl_store.clone(),
                "login",
                config.login_per_minute,
            ),
            register_limiter: RateLimiter::per_day(ttl_store, "register", config.register_per_day),
            identity_store,
            clock,
            registry,
            blacklist,
            marker,
            lifetimes: config.lifetimes,
        }
    }

    fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("username is required".to_string()));
        }
        if username.chars().count() > USERNAME_MAX_LEN {
            return Err(AuthError::Validation(format!(
                "username must be at most {} characters long",
                USERNAME_MAX_LEN
            )));
        }
        if !email.contains('@') || email.chars().count() > EMAIL_MAX_LEN {
            return Err(AuthError::Validation("email is not valid".to_string()));
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters long",
                PASSWORD_MIN_LEN
            )));
        }
        let rules: [(fn(char) -> bool, &str); 4] = [
            (|c: char| c.is_ascii_uppercase(), "one uppercase letter"),
            (|c: char| c.is_ascii_lowercase(), "one lowercase letter"),
            (|c: char| c.is_ascii_digit(), "one digit"),
            (|c: char| PASSWORD_SPECIALS.contains(c), "one special character"),
        ];
        for (rule, what) in rules {
            if !password.chars().any(rule) {
                return Err(AuthError::Validation(format!(
                    "password must include at least {}",
                    what
                )));
            }
        }
        Ok(())
    }

    /// Login attempts are unauthenticated, so the body's username is not an
    /// identity. Count per client address and fall back to the username only
    /// when the address is unknown.
    fn login_rate_key(input: &LoginInput) -> String {
        match (input.client_ip, input.username.trim()) {
            (Some(ip), _) => format!("ip:{}", ip),
            (None, username) if !username.is_empty() => format!("user:{}", username),
            _ => "anonymous".to_string(),
        }
    }

    /// Pair members share `iat`, so the sibling's expiry follows from the
    /// presented token alone.
    fn sibling_expiry(&self, claims: &TokenClaims) -> i64 {
        claims
            .iat
            .saturating_add(self.lifetimes.secs_of(claims.token_type.sibling()))
    }

    /// Blacklist `jti` for the rest of its life. A token already past `exp`
    /// cannot pass the gate and needs no entry.
    async fn revoke_until(&self, jti: &Jti, exp: i64, now: i64) -> Result<(), StoreError> {
        if exp < now {
            return Ok(());
        }
        self.blacklist.revoke(jti, (exp - now) as u64).await
    }

    /// Revoke the registered sibling of `claims` and drop the pair mapping.
    /// An unresolvable sibling leaves only the presented token revoked.
    async fn revoke_sibling(&self, claims: &TokenClaims, now: i64) -> Result<(), StoreError> {
        let direction = PairDirection::from_type(claims.token_type);
        let sibling = match self.registry.lookup_sibling(&claims.jti, direction).await {
            Ok(Some(sibling)) => sibling,
            Ok(None) => {
                debug!(jti = %claims.jti, "no registered sibling");
                return Ok(());
            }
            Err(e) => {
                warn!(jti = %claims.jti, error = %e, "sibling lookup failed");
                return Ok(());
            }
        };

        self.revoke_until(&sibling, self.sibling_expiry(claims), now)
            .await?;

        let (access, refresh) = match claims.token_type {
            TokenType::Access => (&claims.jti, &sibling),
            TokenType::Refresh => (&sibling, &claims.jti),
        };
        if let Err(e) = self.registry.remove_pair(access, refresh).await {
            warn!(access_jti = %access, refresh_jti = %refresh, error = %e, "removing token pair failed");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, request: RegisterInput) -> Result<UserProfile, AuthError> {
        let RegisterInput {
            username,
            email,
            password,
            fullname,
            bio,
            client_ip,
        } = request;

        if let Some(ip) = client_ip {
            self.register_limiter.check(&ip.to_string()).await?;
        }

        Self::validate_registration(&username, &email, &password)?;

        let user = self
            .identity_store
            .register(NewIdentity {
                username: username.trim().to_string(),
                email: email.trim().to_string(),
                password,
                fullname,
                bio,
            })
            .await?;

        info!(subject = %user.id, username = %user.username, "registered");
        Ok(user)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        self.login_limiter
            .check(&Self::login_rate_key(&request))
            .await?;

        let user = self
            .identity_store
            .authenticate(request.username.trim(), &request.password)
            .await?
            .ok_or(AuthError::CredentialsInvalid)?;

        let mut extra = serde_json::Map::new();
        extra.insert("username".to_string(), user.username.clone().into());
        let pair = self.issuer.issue_pair_with_claims(&user.id, extra).await?;

        info!(
            subject = %user.id,
            access_jti = %pair.access.claims.jti,
            refresh_jti = %pair.refresh.claims.jti,
            "logged in"
        );
        Ok(LoginResult {
            user,
            tokens: pair.into(),
        })
    }

    async fn verify_token(
        &self,
        token: &str,
        expected: Option<TokenType>,
    ) -> Result<TokenClaims, AuthError> {
        self.gate.verify(token, expected).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let claims = self
            .gate
            .verify(refresh_token, Some(TokenType::Refresh))
            .await?;
        let now = self.clock.now();

        // Consume the refresh token before minting; of two concurrent
        // rotations only the one that wins the claim gets a new pair.
        if !self
            .blacklist
            .claim(&claims.jti, claims.remaining_secs(now))
            .await?
        {
            debug!(jti = %claims.jti, "refresh token already consumed");
            return Err(AuthError::TokenRevoked);
        }

        let pair = self
            .issuer
            .issue_pair_with_claims(&claims.sub, claims.extra.clone())
            .await?;

        if let Err(e) = self.revoke_sibling(&claims, now).await {
            warn!(jti = %claims.jti, error = %e, "revoking rotated access token failed");
        }

        info!(
            subject = %claims.sub,
            old_refresh_jti = %claims.jti,
            access_jti = %pair.access.claims.jti,
            refresh_jti = %pair.refresh.claims.jti,
            "rotated token pair"
        );
        Ok(pair.into())
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.gate.verify(token, None).await?;
        let now = self.clock.now();

        self.revoke_until(&claims.jti, claims.exp, now).await?;
        self.revoke_sibling(&claims, now).await?;

        info!(subject = %claims.sub, jti = %claims.jti, "logged out");
        Ok(())
    }

    async fn logout_all(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self
            .gate
            .verify(access_token, Some(TokenType::Access))
            .await?;
        let now = self.clock.now();

        let marker = self
            .marker
            .mark(&claims.sub, now, self.lifetimes.refresh.as_secs())
            .await?;

        // Tokens minted in this same second are not older than the marker;
        // close the caller's own pair explicitly.
        self.revoke_until(&claims.jti, claims.exp, now).await?;
        self.revoke_sibling(&claims, now).await?;

        info!(subject = %claims.sub, marker, "logged out all devices");
        Ok(())
    }
}
