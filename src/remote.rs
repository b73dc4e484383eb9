//! Fetch-then-decode for photos served under `<base>/photos/<filename>`.

use bytes::Bytes;
use reqwest::Client;

use crate::{exif::decode, metadata::DecodedMetadata};

/// URL of a gallery photo.
pub fn photo_url(base_url: &str, filename: &str) -> String {
    format!(
        "{}/photos/{}",
        base_url.trim_end_matches('/'),
        filename.trim_start_matches('/')
    )
}

/// Downloads the photo and decodes its metadata.
///
/// Any failure (transport, non-2xx status, no or malformed metadata) gives
/// `None`, which the caller shows as "no camera info available".
pub async fn fetch_metadata(
    client: &Client,
    base_url: &str,
    filename: &str,
) -> Option<DecodedMetadata> {
    match try_fetch(client, &photo_url(base_url, filename)).await {
        Ok(body) => decode(&body),
        Err(e) => {
            tracing::warn!(filename, error = %e, "photo download failed");
            None
        }
    }
}

#[tracing::instrument(skip(client))]
async fn try_fetch(client: &Client, url: &str) -> crate::Result<Bytes> {
    let body = client.get(url).send().await?.error_for_status()?.bytes().await?;
    tracing::debug!(len = body.len(), "Got photo");
    Ok(body)
}
