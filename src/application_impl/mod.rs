mod auth_service_impl;
mod blacklist;
mod keys;
mod logout_all_marker;
mod pair_registry;
mod rate_limiter;
mod token_codec_jwt;
mod token_issuer;
mod verification_gate;

#[cfg(test)]
mod test_support;

pub use auth_service_impl::*;
pub use blacklist::*;
pub use logout_all_marker::*;
pub use pair_registry::*;
pub use rate_limiter::*;
pub use token_codec_jwt::*;
pub use token_issuer::*;
pub use verification_gate::*;
