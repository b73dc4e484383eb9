use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::GeocoderConfig;

/// Source of place names for uncached coordinates.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// `Ok(None)` means the lookup succeeded but knows no place there.
    async fn lookup(&self, latitude: f64, longitude: f64) -> crate::Result<Option<String>>;
}

/// The fields used from the reverse-geocoding response body; everything
/// else in it is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeocodeResponse {
    pub city: Option<String>,
    pub locality: Option<String>,
    pub country_name: Option<String>,
}

impl GeocodeResponse {
    /// `"City, Country"`; the city falls back to the locality, a missing
    /// part is left out, and nothing at all gives `None`.
    pub fn place(&self) -> Option<String> {
        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        let city = non_empty(&self.city).or_else(|| non_empty(&self.locality));
        let parts: Vec<String> = city
            .into_iter()
            .chain(non_empty(&self.country_name))
            .collect();

        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Reverse geocoding over HTTP:
/// `GET <endpoint>?latitude=..&longitude=..&localityLanguage=..`.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    client: Client,
    endpoint: String,
    language: String,
}

impl HttpLookup {
    pub fn new(config: &GeocoderConfig) -> crate::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Shares an existing client; its own timeout settings apply.
    pub fn with_client(client: Client, config: &GeocoderConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
        }
    }
}

#[async_trait]
impl PlaceLookup for HttpLookup {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, latitude: f64, longitude: f64) -> crate::Result<Option<String>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("localityLanguage", self.language.clone()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = resp.bytes().await?;
        let parsed: GeocodeResponse = serde_json::from_slice(&body)?;
        tracing::debug!(?parsed, "Got reverse geocoding response");

        Ok(parsed.place())
    }
}
