use super::Subject;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of one token instance.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jti(pub String);

impl Jti {
    /// 128 random bits. Collisions are not checked.
    pub fn generate() -> Self {
        Jti(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Jti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Jti {
    fn from(s: &str) -> Self {
        Jti(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    /// The type of the other member of a pair.
    pub fn sibling(self) -> TokenType {
        match self {
            TokenType::Access => TokenType::Refresh,
            TokenType::Refresh => TokenType::Access,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried inside a signed token. Immutable once encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Subject,
    pub jti: Jti,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    /// Additional claims flattened into the payload.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenClaims {
    pub fn new(sub: Subject, jti: Jti, token_type: TokenType, iat: i64, exp: i64) -> Self {
        TokenClaims {
            sub,
            jti,
            token_type,
            iat,
            exp,
            extra: serde_json::Map::new(),
        }
    }

    /// Seconds until expiry, never negative.
    pub fn remaining_secs(&self, now: i64) -> u64 {
        (self.exp - now).max(0) as u64
    }
}

/// Lookup direction in the pair registry, named by the key's own type.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PairDirection {
    AccessToRefresh,
    RefreshToAccess,
}

impl PairDirection {
    pub fn from_type(token_type: TokenType) -> Self {
        match token_type {
            TokenType::Access => PairDirection::AccessToRefresh,
            TokenType::Refresh => PairDirection::RefreshToAccess,
        }
    }

    pub fn key_segment(self) -> &'static str {
        match self {
            PairDirection::AccessToRefresh => "access",
            PairDirection::RefreshToAccess => "refresh",
        }
    }
}

/// One encoded token together with the claims it was built from.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Access and refresh token minted in the same issuance event.
#[derive(Debug, Clone)]
pub struct IssuedPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}
