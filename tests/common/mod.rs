#![allow(dead_code)]

use argon2::Params;
use feedauth::application_impl::*;
use feedauth::application_port::*;
use feedauth::domain_port::*;
use feedauth::infra_memory::*;
use feedauth::server::Server;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub const PASSWORD: &str = "Str0ng!pass";
pub const ACCESS_TTL: u64 = 900;
pub const REFRESH_TTL: u64 = 1_209_600;

/// Memory-backed service stack on a manual clock, optionally behind a store
/// that can be switched off.
pub struct Harness {
    pub clock: ManualClock,
    pub store: Arc<MemoryTtlStore>,
    pub switch: Arc<SwitchableStore>,
    pub auth_service: Arc<dyn AuthService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(now: i64) -> Self {
        let clock = ManualClock::new(now);
        let store = Arc::new(MemoryTtlStore::new(Arc::new(clock.clone())));
        let switch = Arc::new(SwitchableStore::new(store.clone()));
        let identities =
            MemoryIdentityStore::with_params(Params::new(8, 1, 1, None).expect("argon2 params"));
        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            Arc::new(identities),
            switch.clone(),
            Arc::new(JwtHs256Codec::new(b"integration-signing-key")),
            Arc::new(clock.clone()),
            AuthConfig {
                lifetimes: TokenLifetimes {
                    access: Duration::from_secs(ACCESS_TTL),
                    refresh: Duration::from_secs(REFRESH_TTL),
                },
                login_per_minute: 5,
                register_per_day: 100,
            },
        ));
        Harness {
            clock,
            store,
            switch,
            auth_service,
        }
    }

    pub fn server(&self) -> Arc<Server> {
        Arc::new(Server::from_services(self.auth_service.clone()))
    }

    pub async fn register(&self, username: &str) {
        self.auth_service
            .register(RegisterInput {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: PASSWORD.to_string(),
                fullname: None,
                bio: None,
                client_ip: None,
            })
            .await
            .expect("register");
    }

    pub async fn login(&self, username: &str) -> LoginResult {
        self.auth_service
            .login(LoginInput {
                username: username.to_string(),
                password: PASSWORD.to_string(),
                client_ip: None,
            })
            .await
            .expect("login")
    }
}

/// Delegates to a memory store until switched off, then fails every call.
pub struct SwitchableStore {
    inner: Arc<MemoryTtlStore>,
    down: AtomicBool,
}

impl SwitchableStore {
    pub fn new(inner: Arc<MemoryTtlStore>) -> Self {
        SwitchableStore {
            inner,
            down: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TtlStore for SwitchableStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set_ex(key, value, ttl_secs).await
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.set_nx_ex(key, value, ttl_secs).await
    }

    async fn set_max_ex(&self, key: &str, value: i64, ttl_secs: u64) -> Result<i64, StoreError> {
        self.check()?;
        self.inner.set_max_ex(key, value, ttl_secs).await
    }

    async fn set_many_ex(
        &self,
        entries: &[(String, String)],
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set_many_ex(entries, ttl_secs).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.exists(key).await
    }

    async fn del(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.del(keys).await
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<WindowCount, StoreError> {
        self.check()?;
        self.inner.incr_window(key, window_secs).await
    }
}
