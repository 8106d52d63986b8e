mod clock;
mod identity_store;
mod ttl_store;

pub use clock::*;
pub use identity_store::*;
pub use ttl_store::*;
