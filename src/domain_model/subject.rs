use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;

/// Opaque principal identifier. Owned by the identity store; the token core
/// only ever uses it as a key.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(pub String);

impl Subject {
    pub fn new(id: impl Into<String>) -> Self {
        Subject(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Subject {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Subject(s.to_string()))
    }
}

impl From<uuid::Uuid> for Subject {
    fn from(id: uuid::Uuid) -> Self {
        Subject(id.to_string())
    }
}
