use super::AuthError;
use crate::domain_model::TokenClaims;

/// Signs and verifies self-contained tokens. Pure: no I/O, no clock reads.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError>;

    /// Verify signature and that `now <= exp`.
    fn decode(&self, token: &str, now: i64) -> Result<TokenClaims, AuthError>;
}
