mod ttl_store_redis;

pub use ttl_store_redis::*;
