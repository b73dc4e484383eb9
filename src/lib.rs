//! photo-meta reads the camera metadata embedded in JPEG photos straight
//! from the raw bytes, using [nom](https://github.com/rust-bakery/nom) and
//! no metadata library, and turns it into display-ready fields: capture
//! date, camera, lens, exposure settings and GPS position.
//!
//! A small reverse geocoder (see [`geocode`]) turns the decoded position
//! into a `"City, Country"` string, caching results in memory and in a
//! session store.
//!
//! ## Key Features
//!
//! - Never fails on bad input: a photo without (readable) metadata decodes
//!   to `None`, a normal state to be shown as "no camera info available".
//!   Missing tags leave their field `None` rather than a made-up zero.
//!
//! - Robustness: the decoder does bounds-checked reads only, and is fuzzed
//!   with [afl](https://github.com/rust-fuzz/afl.rs) (see `afl-fuzz/`).
//!
//! - Little- and big-endian (`II` / `MM`) Exif data.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use photo_meta::*;
//!
//! fn main() -> Result<()> {
//!     let bytes = std::fs::read("./photo.jpg")?;
//!     match decode(&bytes) {
//!         Some(meta) => println!("{meta}"),
//!         None => println!("No camera info available"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! With geocoding:
//!
//! ```rust,no_run
//! use photo_meta::{geocode::GeocodeResolver, *};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let meta = read_metadata_file("./photo.jpg")?.unwrap_or_default();
//!     if let Some((lat, lng)) = meta.position() {
//!         let resolver = GeocodeResolver::from_config(&GeocoderConfig::from_env()?).await?;
//!         println!("{:?}", resolver.resolve(lat, lng).await);
//!     }
//!     Ok(())
//! }
//! ```

pub use config::GeocoderConfig;
pub use exif::{decode, read_metadata_file, try_decode};
pub use metadata::DecodedMetadata;
pub use remote::{fetch_metadata, photo_url};
pub use values::{IRational, Rational, URational};

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
pub mod geocode;
pub mod remote;

mod error;
mod exif;
mod jpeg;
mod metadata;
mod reader;
mod values;

#[cfg(test)]
mod testkit;
