use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound for configured token lifetimes: ten years.
const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub store: Store,
    pub rate_limit: RateLimit,
    pub http: Http,
    pub log: Log,
}

#[derive(Deserialize)]
pub struct Auth {
    pub signing_key: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl Auth {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

// Keeps the signing key out of `info!(?settings)`.
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("signing_key", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "redis" or "memory"
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub key_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
    pub login_per_minute: u64,
    pub register_per_day: u64,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub tls: Option<Tls>,
}

#[derive(Debug, Deserialize)]
pub struct Tls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.auth.signing_key.trim().is_empty() {
            bail!("auth.signing_key must not be empty");
        }
        if self.auth.access_ttl_secs == 0 || self.auth.refresh_ttl_secs == 0 {
            bail!("auth token lifetimes must be positive");
        }
        if self.auth.refresh_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "auth token lifetimes must not exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            );
        }
        if self.auth.refresh_ttl_secs < self.auth.access_ttl_secs {
            bail!("auth.refresh_ttl_secs must not be shorter than auth.access_ttl_secs");
        }
        match self.store.backend.as_str() {
            "memory" => {}
            "redis" if self.store.redis_url.is_some() => {}
            "redis" => bail!("store.redis_url is required for the redis backend"),
            other => bail!("unknown store backend: {}", other),
        }
        if self.rate_limit.login_per_minute == 0 || self.rate_limit.register_per_day == 0 {
            bail!("rate limits must be positive");
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Load the TOML file at `path` (or the build's default), then apply
/// `FEEDAUTH__SECTION__KEY` environment overrides, then validate.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("FEEDAUTH").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
