use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::time::Duration;

use crate::llm::utils::path_policy::{image_mime_for_path, AssetPathPolicy};

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Turns a "before" image reference into a base64 data URI.
///
/// Every failure (bad status, unreachable host, unreadable file) resolves to
/// `None`: a missing screenshot degrades the prompt, it never fails the
/// generation. Nothing is cached, each call reads again.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    http: reqwest::Client,
    assets: AssetPathPolicy,
    timeout: Duration,
}

impl ImageLoader {
    pub fn new(http: reqwest::Client, assets: AssetPathPolicy, timeout: Duration) -> Self {
        Self {
            http,
            assets,
            timeout,
        }
    }

    pub async fn load(&self, reference: Option<&str>) -> Option<String> {
        let reference = reference.filter(|r| !r.is_empty())?;

        if reference.starts_with("data:") {
            return Some(reference.to_string());
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return self.load_remote(reference).await;
        }
        if reference.starts_with('/') {
            return self.load_local(reference).await;
        }

        log::debug!("Unsupported image reference, continuing without image");
        None
    }

    async fn load_remote(&self, url: &str) -> Option<String> {
        let fetch = async {
            let response = self.http.get(url).send().await?;
            if !response.status().is_success() {
                log::warn!("Before image {} returned {}", url, response.status());
                return Ok(None);
            }
            let mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>(Some(encode_data_uri(&mime, &bytes)))
        };

        match tokio::time::timeout(self.timeout, fetch).await {
            Ok(Ok(uri)) => uri,
            Ok(Err(e)) => {
                log::warn!("Failed to fetch before image {}: {}", url, e);
                None
            }
            Err(_) => {
                log::warn!("Fetching before image {} timed out", url);
                None
            }
        }
    }

    async fn load_local(&self, reference: &str) -> Option<String> {
        let path = self.assets.resolve(reference);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(encode_data_uri(image_mime_for_path(&path), &bytes)),
            Err(e) => {
                log::warn!("Failed to read before image {}: {}", path.display(), e);
                None
            }
        }
    }
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Splits a data URI into `(mime, base64 payload)`. The mime falls back to
/// png when the header does not carry a `;base64` marker.
pub fn split_data_uri(uri: &str) -> (String, String) {
    let (header, data) = uri.split_once(',').unwrap_or((uri, ""));
    let mime = header
        .strip_prefix("data:")
        .and_then(|rest| {
            let lower = rest.to_ascii_lowercase();
            lower.find(";base64").map(|pos| rest[..pos].to_string())
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
    (mime, data.to_string())
}
