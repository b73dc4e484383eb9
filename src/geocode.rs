//! Reverse geocoding of decoded photo positions, with a two-tier cache.
//!
//! ```rust,no_run
//! use photo_meta::{geocode::GeocodeResolver, GeocoderConfig};
//!
//! # async fn run() -> photo_meta::Result<()> {
//! let resolver = GeocodeResolver::from_config(&GeocoderConfig::from_env()?).await?;
//! if let Some(place) = resolver.resolve(40.71284, -74.00601).await {
//!     println!("{place}"); // e.g. "New York, United States"
//! }
//! # Ok(())
//! # }
//! ```

pub use lookup::{GeocodeResponse, HttpLookup, PlaceLookup};
pub use resolver::{cache_key, GeocodeResolver};
pub use store::{CacheChain, FileStore, GeoStore, MemoryStore, SESSION_KEY_PREFIX};

mod lookup;
mod resolver;
mod store;
