//! Settings of the reverse geocoder.
//!
//! # Environment Variables
//!
//! - `PHOTO_META_GEOCODE_URL` - Reverse-geocoding endpoint (default:
//!   [`DEFAULT_ENDPOINT`])
//! - `PHOTO_META_LANGUAGE` - Language of the returned place names
//!   (default: en)
//! - `PHOTO_META_TIMEOUT_SECS` - Lookup request timeout (default: 10)
//! - `PHOTO_META_SESSION_CACHE` - JSON file backing the session cache tier
//!   (default: none, memory only)

use std::{path::PathBuf, time::Duration};

/// Default reverse-geocoding endpoint. Takes `latitude`, `longitude` and
/// `localityLanguage` query parameters and needs no API key.
pub const DEFAULT_ENDPOINT: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";

pub const DEFAULT_LANGUAGE: &str = "en";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_ENDPOINT: &str = "PHOTO_META_GEOCODE_URL";
pub const ENV_LANGUAGE: &str = "PHOTO_META_LANGUAGE";
pub const ENV_TIMEOUT_SECS: &str = "PHOTO_META_TIMEOUT_SECS";
pub const ENV_SESSION_CACHE: &str = "PHOTO_META_SESSION_CACHE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderConfig {
    pub endpoint: String,

    /// Sent as `localityLanguage`.
    pub language: String,

    pub timeout: Duration,

    /// Where the session tier persists its entries. `None` keeps the
    /// session tier in memory.
    pub session_cache: Option<PathBuf>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            session_cache: None,
        }
    }
}

impl GeocoderConfig {
    /// Defaults overridden by the `PHOTO_META_*` environment variables.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut config = Self::default();
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(language) = non_empty(ENV_LANGUAGE) {
            config.language = language;
        }
        if let Some(secs) = non_empty(ENV_TIMEOUT_SECS) {
            let secs = secs
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("invalid {ENV_TIMEOUT_SECS} {secs:?}: {e}"))?;
            config.timeout = Duration::from_secs(secs);
        }
        config.session_cache = non_empty(ENV_SESSION_CACHE).map(PathBuf::from);

        Ok(config)
    }
}
