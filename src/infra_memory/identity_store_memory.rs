use crate::domain_model::*;
use crate::domain_port::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct AccountRecord {
    profile: UserProfile,
    password_hash: String,
}

/// Reference identity store: accounts in a map, passwords as Argon2id PHC
/// strings. Stands in for the real user database.
pub struct MemoryIdentityStore {
    accounts: DashMap<String, AccountRecord>,
    emails: DashMap<String, String>,
    hasher: Argon2<'static>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::with_hasher(Argon2::default())
    }

    /// Custom cost parameters, e.g. cheap ones for tests.
    pub fn with_params(params: Params) -> Self {
        Self::with_hasher(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn with_hasher(hasher: Argon2<'static>) -> Self {
        MemoryIdentityStore {
            accounts: DashMap::new(),
            emails: DashMap::new(),
            hasher,
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| IdentityError::Store(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, IdentityError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| IdentityError::Store(format!("invalid PHC hash: {}", e)))?;

        match self.hasher.verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(IdentityError::Store(format!("verify error: {}", e))),
        }
    }
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn register(&self, identity: NewIdentity) -> Result<UserProfile, IdentityError> {
        let NewIdentity {
            username,
            email,
            password,
            fullname,
            bio,
        } = identity;

        let password_hash = self.hash_password(&password)?;
        let email_key = email.to_lowercase();

        match self.emails.entry(email_key.clone()) {
            Entry::Occupied(_) => return Err(IdentityError::EmailTaken(email)),
            Entry::Vacant(vacant) => {
                vacant.insert(username.clone());
            }
        }

        let profile = UserProfile {
            id: Subject::from(Uuid::new_v4()),
            username: username.clone(),
            email,
            fullname,
            bio,
            created_at: Utc::now(),
        };

        match self.accounts.entry(username.clone()) {
            Entry::Occupied(_) => {
                self.emails.remove(&email_key);
                Err(IdentityError::UsernameTaken(username))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(AccountRecord {
                    profile: profile.clone(),
                    password_hash,
                });
                Ok(profile)
            }
        }
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, IdentityError> {
        let Some(record) = self.accounts.get(username).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        if self.verify_password(password, &record.password_hash)? {
            Ok(Some(record.profile))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryIdentityStore {
        MemoryIdentityStore::with_params(Params::new(8, 1, 1, None).unwrap())
    }

    fn identity(username: &str, email: &str) -> NewIdentity {
        NewIdentity {
            username: username.to_string(),
            email: email.to_string(),
            password: "Secret#123".to_string(),
            fullname: None,
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let store = store();
        let profile = store.register(identity("dan", "dan@example.com")).await.unwrap();

        let found = store.authenticate("dan", "Secret#123").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(profile.id));
        assert!(store.authenticate("dan", "wrong").await.unwrap().is_none());
        assert!(store.authenticate("nobody", "Secret#123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_rejected() {
        let store = store();
        store.register(identity("dan", "dan@example.com")).await.unwrap();

        let err = store.register(identity("dan", "other@example.com")).await.unwrap_err();
        assert!(matches!(err, IdentityError::UsernameTaken(_)));

        let err = store.register(identity("ann", "DAN@example.com")).await.unwrap_err();
        assert!(matches!(err, IdentityError::EmailTaken(_)));

        // The failed username attempt must not have reserved its email.
        store.register(identity("bob", "other@example.com")).await.unwrap();
    }
}
