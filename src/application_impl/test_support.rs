use super::JwtHs256Codec;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub const SIGNING_KEY: &[u8] = b"unit-test-signing-key-0123456789";

pub const LIFETIMES: TokenLifetimes = TokenLifetimes {
    access: Duration::from_secs(900),
    refresh: Duration::from_secs(1_209_600),
};

/// Memory store, manual clock at t=0 and a codec, shared by unit tests.
pub struct Fixture {
    pub clock: ManualClock,
    pub store: Arc<MemoryTtlStore>,
    pub codec: Arc<JwtHs256Codec>,
}

impl Fixture {
    pub fn new() -> Self {
        let clock = ManualClock::new(0);
        Fixture {
            store: Arc::new(MemoryTtlStore::new(Arc::new(clock.clone()))),
            codec: Arc::new(JwtHs256Codec::new(SIGNING_KEY)),
            clock,
        }
    }
}

/// Memory store that can be told to fail reads (`get`, `exists`) or writes
/// (everything else).
pub struct FlakyStore {
    pub inner: Arc<MemoryTtlStore>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryTtlStore>) -> Self {
        FlakyStore {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(())
    }

    fn write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TtlStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read()?;
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.write()?;
        self.inner.set_ex(key, value, ttl_secs).await
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, StoreError> {
        self.write()?;
        self.inner.set_nx_ex(key, value, ttl_secs).await
    }

    async fn set_max_ex(&self, key: &str, value: i64, ttl_secs: u64) -> Result<i64, StoreError> {
        self.write()?;
        self.inner.set_max_ex(key, value, ttl_secs).await
    }

    async fn set_many_ex(
        &self,
        entries: &[(String, String)],
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        self.write()?;
        self.inner.set_many_ex(entries, ttl_secs).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.read()?;
        self.inner.exists(key).await
    }

    async fn del(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.write()?;
        self.inner.del(keys).await
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<WindowCount, StoreError> {
        self.write()?;
        self.inner.incr_window(key, window_secs).await
    }
}
