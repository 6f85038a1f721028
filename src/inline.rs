//! Image inlining.
//!
//! The requesting context cannot always load page images itself (cookies,
//! CORS), so collected image URLs can be rewritten as `data:` URIs before
//! the response is sent. Fetches are sequential and abandoned as a whole if
//! the requester goes away.

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Rewrites every non-`data:` image as `data:<type>;base64,<bytes>`.
///
/// An image that fails to download keeps its original URL. If `cancel`
/// fires before all images are done the partial result is discarded and
/// `Err(Error::Cancelled)` is returned.
pub async fn inline_images(
    client: &reqwest::Client,
    images: &[String],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(images.len());

    for image in images {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if image.starts_with("data:") {
            out.push(image.clone());
            continue;
        }

        let fetched = tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            fetched = fetch_data_uri(client, image, timeout) => fetched,
        };
        match fetched {
            Ok(uri) => out.push(uri),
            Err(err) => {
                warn!(url = image.as_str(), error = %err, "image not inlined");
                out.push(image.clone());
            }
        }
    }

    debug!(count = out.len(), "images inlined");
    Ok(out)
}

async fn fetch_data_uri(client: &reqwest::Client, url: &str, timeout: Duration) -> Result<String> {
    let resp = client.get(url).timeout(timeout).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: format!("image fetch failed for {url}"),
        });
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
    let bytes = resp.bytes().await?;

    Ok(to_data_uri(&content_type, &bytes))
}

/// `data:<content_type>;base64,<payload>`.
#[must_use]
pub fn to_data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{content_type};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}
