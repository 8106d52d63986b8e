//! Process-wide tracing setup. Installing a global subscriber cannot be
//! repeated inside one test binary, so `bin/logger_demo.rs` exercises it.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
