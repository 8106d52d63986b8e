mod clock;
mod identity_store_memory;
mod ttl_store_memory;

pub use clock::*;
pub use identity_store_memory::*;
pub use ttl_store_memory::*;
