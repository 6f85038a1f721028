//! Configuration options for conversation extraction.
//!
//! The `Options` struct controls what a capture includes and the thresholds
//! each cascade step uses to decide whether it found anything.

use std::time::Duration;

/// Configuration options for conversation extraction.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use rs_chatscrape::Options;
///
/// let options = Options {
///     include_images: true,
///     url: Some("https://chatgpt.com/c/abc".to_string()),
///     ..Options::default()
/// };
/// assert_eq!(options.max_images, 10);
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Collect image references and add `[Image: ...]` placeholders to
    /// message content.
    ///
    /// Default: `false`
    pub include_images: bool,

    /// Page URL for platform detection.
    ///
    /// When set it takes precedence over the URL the page reports. HTML
    /// snapshots carry no URL of their own, so `scrape` needs this for
    /// anything but the generic platform.
    ///
    /// Default: `None`
    pub url: Option<String>,

    /// Maximum number of image locators returned.
    ///
    /// Default: `10`
    pub max_images: usize,

    /// Images rendered narrower or shorter than this (px) are treated as
    /// icons or avatars and skipped.
    ///
    /// Default: `50.0`
    pub min_image_size: f64,

    /// Text nodes must be longer than this (chars) to be kept by a text walk.
    ///
    /// Default: `2`
    pub text_walk_min_chars: usize,

    /// Block elements must be longer than this (chars) to be kept by the
    /// generic block fallback.
    ///
    /// Default: `20`
    pub block_min_chars: usize,

    /// The desperate body walk must produce more than this many chars to
    /// count as a result.
    ///
    /// Default: `50`
    pub desperate_min_chars: usize,

    /// Body text shorter than this on a protected-rendering platform with
    /// no structured messages is reported as `ProtectedRendering`.
    ///
    /// Default: `100`
    pub protected_text_threshold: usize,

    /// Absolute length floor for the content validator.
    ///
    /// Default: `10`
    pub validator_floor: usize,

    /// Per-request timeout when inlining image bytes.
    ///
    /// Default: 10 seconds
    pub inline_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            include_images: false,
            url: None,
            max_images: 10,
            min_image_size: 50.0,
            text_walk_min_chars: 2,
            block_min_chars: 20,
            desperate_min_chars: 50,
            protected_text_threshold: 100,
            validator_floor: 10,
            inline_timeout: Duration::from_secs(10),
        }
    }
}

impl Options {
    /// Options for a capture request with the given image flag.
    #[must_use]
    pub fn for_request(include_images: bool) -> Self {
        Self {
            include_images,
            ..Self::default()
        }
    }

    /// Sets the page URL used for platform detection.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}
