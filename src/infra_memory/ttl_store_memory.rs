use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes between sweeps of expired slots.
const SWEEP_EVERY: u64 = 1024;

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: i64,
}

impl Slot {
    fn new(value: impl Into<String>, now: i64, ttl_secs: u64) -> Self {
        Slot {
            value: value.into(),
            expires_at: now.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        }
    }

    fn alive(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// In-process TTL store. Expired slots are treated as absent, dropped on
/// access, and swept from the whole map every `SWEEP_EVERY` writes.
pub struct MemoryTtlStore {
    slots: DashMap<String, Slot>,
    clock: Arc<dyn Clock>,
    writes: AtomicU64,
}

impl MemoryTtlStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MemoryTtlStore {
            slots: DashMap::new(),
            clock,
            writes: AtomicU64::new(0),
        }
    }

    /// Remaining lifetime of a live key, mirroring redis `TTL`.
    pub fn ttl(&self, key: &str) -> Option<u64> {
        let now = self.clock.now();
        self.slots
            .get(key)
            .filter(|slot| slot.alive(now))
            .map(|slot| (slot.expires_at - now) as u64)
    }

    /// Number of live keys.
    pub fn live_keys(&self) -> usize {
        let now = self.clock.now();
        self.slots.iter().filter(|slot| slot.alive(now)).count()
    }

    /// Count a write and return the current time. Must be called before any
    /// entry guard is taken, since the sweep locks every shard.
    fn begin_write(&self) -> i64 {
        let now = self.clock.now();
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.slots.retain(|_, slot| slot.alive(now));
        }
        now
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let value = self
            .slots
            .get(key)
            .filter(|slot| slot.alive(now))
            .map(|slot| slot.value.clone());
        if value.is_none() {
            self.slots.remove_if(key, |_, slot| !slot.alive(now));
        }
        value
    }
}

#[async_trait::async_trait]
impl TtlStore for MemoryTtlStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.live_value(key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let now = self.begin_write();
        self.slots
            .insert(key.to_string(), Slot::new(value, now, ttl_secs));
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, StoreError> {
        let now = self.begin_write();
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().alive(now) {
                    Ok(false)
                } else {
                    occupied.insert(Slot::new(value, now, ttl_secs));
                    Ok(true)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(value, now, ttl_secs));
                Ok(true)
            }
        }
    }

    async fn set_max_ex(&self, key: &str, value: i64, ttl_secs: u64) -> Result<i64, StoreError> {
        let now = self.begin_write();
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get();
                if slot.alive(now) {
                    let current = slot.value.parse::<i64>().map_err(|e| StoreError::Corrupt {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                    if current >= value {
                        return Ok(current);
                    }
                }
                occupied.insert(Slot::new(value.to_string(), now, ttl_secs));
                Ok(value)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(value.to_string(), now, ttl_secs));
                Ok(value)
            }
        }
    }

    async fn set_many_ex(
        &self,
        entries: &[(String, String)],
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let now = self.begin_write();
        for (key, value) in entries {
            self.slots
                .insert(key.clone(), Slot::new(value.as_str(), now, ttl_secs));
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.live_value(key).is_some())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, StoreError> {
        let now = self.clock.now();
        let removed = keys
            .iter()
            .filter_map(|key| self.slots.remove(key))
            .filter(|(_, slot)| slot.alive(now))
            .count();
        Ok(removed as u64)
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<WindowCount, StoreError> {
        let now = self.begin_write();
        let mut entry = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::new("0", now, window_secs));
        if !entry.alive(now) {
            *entry = Slot::new("0", now, window_secs);
        }
        let count = entry.value.parse::<u64>().unwrap_or(0) + 1;
        entry.value = count.to_string();
        Ok(WindowCount {
            count,
            reset_in_secs: (entry.expires_at - now).max(0) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::ManualClock;

    fn store() -> (MemoryTtlStore, ManualClock) {
        let clock = ManualClock::new(1_000);
        (MemoryTtlStore::new(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let (store, clock) = store();
        store.set_ex("k", "v", 10).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.ttl("k"), Some(10));

        clock.advance(9);
        assert!(store.exists("k").await.unwrap());
        clock.advance(1);
        assert!(!store.exists("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_nx_only_writes_once_while_alive() {
        let (store, clock) = store();
        assert!(store.set_nx_ex("k", "a", 5).await.unwrap());
        assert!(!store.set_nx_ex("k", "b", 5).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("a"));

        clock.advance(5);
        assert!(store.set_nx_ex("k", "c", 5).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_set_max_keeps_greater_value() {
        let (store, _clock) = store();
        assert_eq!(store.set_max_ex("m", 200, 60).await.unwrap(), 200);
        assert_eq!(store.set_max_ex("m", 100, 60).await.unwrap(), 200);
        assert_eq!(store.set_max_ex("m", 300, 60).await.unwrap(), 300);
        assert_eq!(store.get("m").await.unwrap().as_deref(), Some("300"));
    }

    #[tokio::test]
    async fn test_set_max_rejects_non_integer_value() {
        let (store, _clock) = store();
        store.set_ex("m", "garbage", 60).await.unwrap();
        assert!(matches!(
            store.set_max_ex("m", 100, 60).await,
            Err(StoreError::Corrupt { .. })
        ));
        assert_eq!(store.get("m").await.unwrap().as_deref(), Some("garbage"));
    }

    #[tokio::test]
    async fn test_del_counts_only_live_keys() {
        let (store, clock) = store();
        store
            .set_many_ex(&[("a".into(), "1".into()), ("b".into(), "2".into())], 5)
            .await
            .unwrap();
        store.set_ex("c", "3", 1).await.unwrap();
        clock.advance(2);
        let removed = store
            .del(&["a".into(), "c".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.exists("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_slots_are_swept_by_later_writes() {
        let (store, clock) = store();
        for i in 0..10_000 {
            store.set_ex(&format!("old:{i}"), "1", 900).await.unwrap();
        }
        clock.advance(10_000);
        for i in 0..10_000 {
            store.set_ex(&format!("new:{i}"), "1", 900).await.unwrap();
        }

        assert_eq!(store.live_keys(), 10_000);
        assert!(store.slots.len() < 10_000 + SWEEP_EVERY as usize);
        assert!(store.slots.iter().all(|slot| slot.key().starts_with("new:")));
    }

    #[tokio::test]
    async fn test_incr_window_resets_after_window() {
        let (store, clock) = store();
        for expected in 1..=3 {
            let hit = store.incr_window("r", 60).await.unwrap();
            assert_eq!(hit.count, expected);
        }
        clock.advance(30);
        let hit = store.incr_window("r", 60).await.unwrap();
        assert_eq!(hit, WindowCount { count: 4, reset_in_secs: 30 });

        clock.advance(30);
        let hit = store.incr_window("r", 60).await.unwrap();
        assert_eq!(hit.count, 1);
        assert_eq!(hit.reset_in_secs, 60);
    }
}
