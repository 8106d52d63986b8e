use crate::domain_model::*;
use crate::domain_port::{IdentityError, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    CredentialsInvalid,
    #[error("token malformed")]
    TokenMalformed,
    #[error("token expired")]
    TokenExpired,
    #[error("token signature invalid")]
    TokenSignatureInvalid,
    #[error("expected {expected} token, got {actual}")]
    TokenTypeMismatch {
        expected: TokenType,
        actual: TokenType,
    },
    #[error("token revoked")]
    TokenRevoked,
    #[error("token superseded by logout-all")]
    TokenSupersededByLogoutAll,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("{0}")]
    UserExists(String),
    #[error("{0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Failures that mean "this caller is not authenticated".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::CredentialsInvalid
                | AuthError::TokenMalformed
                | AuthError::TokenExpired
                | AuthError::TokenSignatureInvalid
                | AuthError::TokenTypeMismatch { .. }
                | AuthError::TokenRevoked
                | AuthError::TokenSupersededByLogoutAll
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::UsernameTaken(_) | IdentityError::EmailTaken(_) => {
                AuthError::UserExists(err.to_string())
            }
            IdentityError::Invalid(reason) => AuthError::Validation(reason),
            IdentityError::Store(e) => AuthError::Internal(e),
        }
    }
}

/// Configured token lifetimes.
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl TokenLifetimes {
    pub fn of(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access,
            TokenType::Refresh => self.refresh,
        }
    }

    /// Lifetime in whole seconds, saturating at `i64::MAX`.
    pub fn secs_of(&self, token_type: TokenType) -> i64 {
        i64::try_from(self.of(token_type).as_secs()).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub fullname: Option<String>,
    pub bio: Option<String>,
    pub client_ip: Option<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub client_ip: Option<IpAddr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<IssuedPair> for AuthTokens {
    fn from(pair: IssuedPair) -> Self {
        let expires_at = |exp: i64| DateTime::<Utc>::from_timestamp(exp, 0).unwrap_or_default();
        AuthTokens {
            access_token_expires_at: expires_at(pair.access.claims.exp),
            refresh_token_expires_at: expires_at(pair.refresh.claims.exp),
            access_token: AccessToken(pair.access.token),
            refresh_token: RefreshToken(pair.refresh.token),
        }
    }
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<UserProfile, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Admission check for one request. `expected` restricts the token type.
    async fn verify_token(
        &self,
        token: &str,
        expected: Option<TokenType>,
    ) -> Result<TokenClaims, AuthError>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
    /// Revoke the presented token and its pair sibling.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;
    /// Invalidate every token of the subject issued before now.
    async fn logout_all(&self, access_token: &str) -> Result<(), AuthError>;
}
