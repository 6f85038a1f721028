//! Result types for extraction output.
//!
//! A scrape ends in exactly one of two shapes: [`ScrapedContent`] when
//! something usable was found, or [`ExtractionError`] carrying a kind, a
//! message and an actionable suggestion. Both serialize camelCase for the
//! UI context that requested them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Speaker of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used in rendered transcripts.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn in a conversation. `content` is trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedMessage {
    pub role: Role,
    pub content: String,
}

impl ScrapedMessage {
    /// Builds a message, returning `None` when the trimmed content is empty.
    #[must_use]
    pub fn new(role: Role, content: &str) -> Option<Self> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(Self {
            role,
            content: content.to_string(),
        })
    }
}

/// Which cascade step produced a successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionStage {
    /// Remote-supplied selector override.
    DynamicSelectors,
    /// Built-in registry selectors.
    Structured,
    /// Secondary selectors of a platform without stable markup.
    SecondarySelectors,
    /// Text walk over the largest scrollable container.
    ContainerWalk,
    /// Paragraphs, headings and list items.
    BlockElements,
    /// Text walk over the whole body.
    DesperateWalk,
}

/// Successful extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedContent {
    pub url: String,
    pub title: String,
    pub platform: Platform,
    /// Chronological (top-to-bottom) turns. Empty only in raw-text mode.
    pub conversation: Vec<ScrapedMessage>,
    /// Whole-page text; populated even when `conversation` is not empty.
    pub raw_text: String,
    /// Up to `max_images` deduplicated image locators.
    pub images: Vec<String>,
    pub extraction_stage: ExtractionStage,
    /// Non-fatal notes, such as selectors that failed to parse.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ScrapedContent {
    /// Renders role-labeled text suitable as summarization input.
    ///
    /// Falls back to `raw_text` when no turns were recovered.
    ///
    /// ```rust
    /// use rs_chatscrape::{scrape, Options, ScrapeOutcome};
    ///
    /// let html = r#"<body>
    ///   <div data-message-author-role="user">How do I reverse a list?</div>
    ///   <div data-message-author-role="assistant">Call reverse() on it.</div>
    /// </body>"#;
    /// let opts = Options::default().with_url("https://chatgpt.com/c/1");
    /// let ScrapeOutcome::Success(content) = scrape(html, &opts) else { panic!() };
    /// assert_eq!(
    ///     content.transcript(),
    ///     "User: How do I reverse a list?\n\nAssistant: Call reverse() on it."
    /// );
    /// ```
    #[must_use]
    pub fn transcript(&self) -> String {
        if self.conversation.is_empty() {
            return self.raw_text.clone();
        }
        self.conversation
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Failure category of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Nothing usable after the whole cascade.
    NoContent,
    /// Content sits behind encapsulated rendering the extractor cannot read.
    ProtectedRendering,
    /// Blank page.
    EmptyPage,
    /// The page refuses access (non-http protocols).
    Blocked,
    /// Text was found but looks like a loading or error banner.
    ValidationFailed,
}

impl ErrorKind {
    /// Whether retrying the same capture later can succeed.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::NoContent | ErrorKind::ValidationFailed)
    }
}

/// Typed extraction failure returned to the caller as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionError {
    pub kind: ErrorKind,
    pub message: String,
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl ExtractionError {
    #[must_use]
    pub fn no_content(platform: Platform) -> Self {
        Self {
            kind: ErrorKind::NoContent,
            message: "No conversation content found on this page".to_string(),
            suggestion: "Start a conversation first, or reload the page once it has finished loading."
                .to_string(),
            platform: Some(platform),
        }
    }

    #[must_use]
    pub fn protected_rendering(platform: Platform) -> Self {
        Self {
            kind: ErrorKind::ProtectedRendering,
            message: format!("{} renders this conversation in a protected view that cannot be read", platform.display_name()),
            suggestion: "Copy the conversation text manually and paste it in instead; reloading will not help."
                .to_string(),
            platform: Some(platform),
        }
    }

    #[must_use]
    pub fn empty_page() -> Self {
        Self {
            kind: ErrorKind::EmptyPage,
            message: "This page is empty".to_string(),
            suggestion: "Open a chat conversation in this tab and try again.".to_string(),
            platform: None,
        }
    }

    #[must_use]
    pub fn blocked(scheme: &str) -> Self {
        Self {
            kind: ErrorKind::Blocked,
            message: format!("Pages using the {scheme}: protocol cannot be captured"),
            suggestion: "Switch to a regular web page (http or https) and try again.".to_string(),
            platform: None,
        }
    }

    #[must_use]
    pub fn validation_failed(platform: Platform, reason: &str) -> Self {
        Self {
            kind: ErrorKind::ValidationFailed,
            message: format!("Captured text was rejected: {reason}"),
            suggestion: "Wait for the page to finish loading, then try again.".to_string(),
            platform: Some(platform),
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {} ({})", self.kind, self.message, self.suggestion)
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Success(ScrapedContent),
    Failure(ExtractionError),
}

impl ScrapeOutcome {
    /// The content, if extraction succeeded.
    #[must_use]
    pub fn content(&self) -> Option<&ScrapedContent> {
        match self {
            ScrapeOutcome::Success(content) => Some(content),
            ScrapeOutcome::Failure(_) => None,
        }
    }

    /// The failure, if extraction did not succeed.
    #[must_use]
    pub fn error(&self) -> Option<&ExtractionError> {
        match self {
            ScrapeOutcome::Success(_) => None,
            ScrapeOutcome::Failure(err) => Some(err),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeOutcome::Success(_))
    }
}
