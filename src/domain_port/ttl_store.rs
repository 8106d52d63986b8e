/// Key-value store with per-key expiry. Every operation is atomic on its own
/// key; nothing here spans a transaction except where noted.
#[async_trait::async_trait]
pub trait TtlStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// Set only if the key is absent. Returns whether this call wrote it.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, StoreError>;

    /// Store `value` unless the key already holds a greater-or-equal integer.
    /// Returns the value held after the call.
    async fn set_max_ex(&self, key: &str, value: i64, ttl_secs: u64) -> Result<i64, StoreError>;

    /// Write several keys with one shared TTL. Adapters that can apply the
    /// batch atomically should.
    async fn set_many_ex(&self, entries: &[(String, String)], ttl_secs: u64)
    -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete keys, returning how many existed. Missing keys are not an error.
    async fn del(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Increment a fixed-window counter, starting the window on first hit.
    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<WindowCount, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub count: u64,
    /// Seconds until the window resets.
    pub reset_in_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt value at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
