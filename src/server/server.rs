use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::Arc;

/// Every port implementation, built once from settings and shared by the
/// HTTP layer.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let ttl_store: Arc<dyn TtlStore> = match settings.store.backend.as_str() {
            "redis" => {
                let url = settings
                    .store
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.redis_url is not set"))?;
                let redis_client = redis::Client::open(url)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisTtlStore::new(
                    redis_manager,
                    settings.store.key_prefix.clone(),
                ))
            }
            "memory" => {
                warn!("memory store backend: revocations do not survive a restart");
                Arc::new(MemoryTtlStore::new(clock.clone()))
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let token_codec: Arc<dyn TokenCodec> =
            Arc::new(JwtHs256Codec::new(settings.auth.signing_key.as_bytes()));
        let identity_store: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new());

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            identity_store,
            ttl_store,
            token_codec,
            clock,
            AuthConfig {
                lifetimes: TokenLifetimes {
                    access: settings.auth.access_ttl(),
                    refresh: settings.auth.refresh_ttl(),
                },
                login_per_minute: settings.rate_limit.login_per_minute,
                register_per_day: settings.rate_limit.register_per_day,
            },
        ));

        info!(backend = %settings.store.backend, "server started");

        Ok(Self::from_services(auth_service))
    }

    /// Assemble from already-built services, e.g. over test doubles.
    pub fn from_services(auth_service: Arc<dyn AuthService>) -> Self {
        Self { auth_service }
    }

    pub async fn shutdown(&self) {
        // No background tasks; the redis connection manager closes on drop.
        info!("server shutting down...");
    }
}
