//! Key families written to the TTL store. Every one of them carries a TTL.

use crate::domain_model::*;

pub fn blacklist(jti: &Jti) -> String {
    format!("blacklist:{}", jti)
}

pub fn token_pair(direction: PairDirection, jti: &Jti) -> String {
    format!("token_pair:{}:{}", direction.key_segment(), jti)
}

pub fn logout_all(subject: &Subject) -> String {
    format!("logout_all_devices:{}", subject)
}

pub fn rate_limit(scope: &str, key: &str) -> String {
    format!("rate_limit:{}:{}", scope, key)
}
