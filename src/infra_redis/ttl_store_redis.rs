use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, Script};

const SET_MAX: &str = include_str!("set_max.lua");
const INCR_WINDOW: &str = include_str!("incr_window.lua");

pub struct RedisTtlStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisTtlStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisTtlStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }
}

fn unavailable(e: RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait::async_trait]
impl TtlStore for RedisTtlStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn.get(&key).await.map_err(unavailable)?;
        Ok(val)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, value, ttl_secs)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(reply.is_some())
    }

    async fn set_max_ex(&self, key: &str, value: i64, ttl_secs: u64) -> Result<i64, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let script = Script::new(SET_MAX);
        let held: i64 = script
            .key(&key)
            .arg(value)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| match e.code() {
                Some("CORRUPT") => StoreError::Corrupt {
                    key: key.clone(),
                    reason: e.detail().unwrap_or("not an integer").to_string(),
                },
                _ => unavailable(e),
            })?;
        Ok(held)
    }

    async fn set_many_ex(
        &self,
        entries: &[(String, String)],
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            pipe.set_ex(self.key(key), value, ttl_secs).ignore();
        }
        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await.map_err(unavailable)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(&key).await.map_err(unavailable)?;
        Ok(found)
    }

    async fn del(&self, keys: &[String]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let keys: Vec<String> = keys.iter().map(|k| self.key(k)).collect();
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(&keys).await.map_err(unavailable)?;
        Ok(removed)
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<WindowCount, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let script = Script::new(INCR_WINDOW);
        let (count, ttl): (i64, i64) = script
            .key(&key)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(WindowCount {
            count: count.max(0) as u64,
            reset_in_secs: ttl.max(0) as u64,
        })
    }
}
