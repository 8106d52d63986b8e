use crate::domain_model::*;

#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password: String,
    pub fullname: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("username {0} already exists")]
    UsernameTaken(String),
    #[error("email {0} already exists")]
    EmailTaken(String),
    #[error("{0}")]
    Invalid(String),
    #[error("identity store error: {0}")]
    Store(String),
}

/// Account storage and credential checks live outside the token core.
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    async fn register(&self, identity: NewIdentity) -> Result<UserProfile, IdentityError>;

    /// `Ok(None)` when the username is unknown or the password does not match.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, IdentityError>;
}
