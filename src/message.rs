//! Request/response envelope between the UI context and the page context.
//!
//! One request, one response. The response is the scraped content, a typed
//! extraction failure, or a `{ "error": ... }` fault when the request itself
//! could not be served.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::inline::inline_images;
use crate::options::Options;
use crate::result::{ExtractionError, ScrapeOutcome, ScrapedContent};
use crate::selectors::DynamicSelectorConfig;

/// Inbound request, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageRequest {
    #[serde(rename_all = "camelCase")]
    GetPageContent {
        #[serde(default)]
        include_images: bool,
    },
}

impl PageRequest {
    /// Parses a request; unknown actions and malformed JSON are
    /// `Error::InvalidRequest`.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| Error::InvalidRequest(err.to_string()))
    }
}

/// Outbound response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse {
    Content(ScrapedContent),
    Failure(ExtractionError),
    Fault { error: String },
}

impl PageResponse {
    #[must_use]
    pub fn fault(err: &Error) -> Self {
        PageResponse::Fault {
            error: err.to_string(),
        }
    }

    /// Replaces collected image URLs with inline `data:` URIs.
    ///
    /// Responses without images are returned unchanged. Cancellation
    /// discards the response.
    pub async fn inline_images(
        self,
        client: &reqwest::Client,
        opts: &Options,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        match self {
            PageResponse::Content(mut content) if !content.images.is_empty() => {
                content.images =
                    inline_images(client, &content.images, opts.inline_timeout, cancel).await?;
                Ok(PageResponse::Content(content))
            }
            other => Ok(other),
        }
    }
}

impl From<ScrapeOutcome> for PageResponse {
    fn from(outcome: ScrapeOutcome) -> Self {
        match outcome {
            ScrapeOutcome::Success(content) => PageResponse::Content(content),
            ScrapeOutcome::Failure(err) => PageResponse::Failure(err),
        }
    }
}

/// Serves one `getPageContent` request against an HTML snapshot.
///
/// ```rust
/// use rs_chatscrape::message::{handle_request, PageResponse};
/// use rs_chatscrape::selectors::DynamicSelectorConfig;
/// use rs_chatscrape::Options;
///
/// let resp = handle_request(
///     r#"{"action": "summarize"}"#,
///     "<body></body>",
///     &Options::default(),
///     &DynamicSelectorConfig::empty(),
/// );
/// assert!(matches!(resp, PageResponse::Fault { .. }));
/// ```
#[must_use]
pub fn handle_request(
    request: &str,
    html: &str,
    opts: &Options,
    dynamic: &DynamicSelectorConfig,
) -> PageResponse {
    let request = match PageRequest::parse(request) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejecting request");
            return PageResponse::fault(&err);
        }
    };

    let PageRequest::GetPageContent { include_images } = request;
    debug!(include_images, "getPageContent");
    let opts = Options {
        include_images,
        ..opts.clone()
    };
    crate::scrape_with_selectors(html, &opts, dynamic).into()
}
