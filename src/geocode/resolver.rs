use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::watch;

use crate::config::GeocoderConfig;

use super::{
    lookup::{HttpLookup, PlaceLookup},
    store::{CacheChain, FileStore, GeoStore, MemoryStore},
};

/// Cache key of a coordinate: both parts rounded to 4 decimal places
/// (about 11 m), ties away from zero, e.g. `"40.7128_-74.0060"`.
pub fn cache_key(latitude: f64, longitude: f64) -> String {
    let round4 = |v: f64| (v * 1e4).round() / 1e4;
    format!("{:.4}_{:.4}", round4(latitude), round4(longitude))
}

/// What a finished lookup produced; `None` until it finishes.
type Outcome = Option<Option<String>>;

type InFlight = Mutex<HashMap<String, watch::Receiver<Outcome>>>;

enum Role {
    Lead(watch::Sender<Outcome>),
    Wait(watch::Receiver<Outcome>),
}

/// Turns coordinates into `"City, Country"` strings.
///
/// Lookups go memory tier → session tier → `L`. Only successful, non-empty
/// results are cached, so a failed lookup is retried by the next call for
/// that key. Concurrent calls for the same uncached key share one lookup.
pub struct GeocodeResolver<L = HttpLookup> {
    lookup: L,
    cache: CacheChain,
    in_flight: InFlight,
}

impl<L> std::fmt::Debug for GeocodeResolver<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl GeocodeResolver<HttpLookup> {
    /// HTTP lookups per `config`, a memory tier and a session tier (backed
    /// by `config.session_cache` if set).
    pub async fn from_config(config: &GeocoderConfig) -> crate::Result<Self> {
        let session: Arc<dyn GeoStore> = match &config.session_cache {
            Some(path) => Arc::new(FileStore::open(path).await?),
            None => Arc::new(MemoryStore::new()),
        };
        let cache = CacheChain::two_tier(Arc::new(MemoryStore::new()), session);
        Ok(Self::new(HttpLookup::new(config)?, cache))
    }
}

impl<L: PlaceLookup> GeocodeResolver<L> {
    pub fn new(lookup: L, cache: CacheChain) -> Self {
        Self {
            lookup,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the place name for the coordinate, or `None` if the lookup
    /// failed or knows no place there. Never fails.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, latitude: f64, longitude: f64) -> Option<String> {
        let key = cache_key(latitude, longitude);

        loop {
            if let Some(place) = self.cache.get(&key).await {
                return Some(place);
            }

            // Either wait for the lookup already running for this key, or
            // become the one running it.
            let role = {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                match in_flight.get(&key) {
                    Some(rx) => Role::Wait(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        in_flight.insert(key.clone(), rx);
                        Role::Lead(tx)
                    }
                }
            };

            match role {
                Role::Lead(done) => return self.lead(&key, latitude, longitude, done).await,
                Role::Wait(mut rx) => {
                    let outcome = rx.wait_for(Option::is_some).await.map(|o| (*o).clone());
                    match outcome {
                        Ok(outcome) => return outcome.flatten(),
                        // the leading call was dropped before finishing
                        Err(_) => tracing::debug!(%key, "lookup abandoned, retrying"),
                    }
                }
            }
        }
    }

    async fn lead(
        &self,
        key: &str,
        latitude: f64,
        longitude: f64,
        done: watch::Sender<Outcome>,
    ) -> Option<String> {
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            key,
        };

        // finished between our cache check and registering
        if let Some(place) = self.cache.get(key).await {
            done.send_replace(Some(Some(place.clone())));
            return Some(place);
        }

        let place = match self.lookup.lookup(latitude, longitude).await {
            Ok(Some(place)) => {
                tracing::debug!(%key, %place, "resolved");
                self.cache.put(key, &place).await;
                Some(place)
            }
            Ok(None) => {
                tracing::debug!(%key, "no place known");
                None
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "reverse geocoding failed");
                None
            }
        };
        done.send_replace(Some(place.clone()));
        place
    }
}

/// Releases a key from the in-flight table, also when the leading
/// `resolve` future is dropped mid-lookup. Waiters then see the sender
/// closed without an outcome and retry.
struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    key: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.key);
    }
}
