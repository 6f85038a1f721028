//! # rs-chatscrape
//!
//! Conversation extraction from AI chat pages.
//!
//! Given a rendered chat page (ChatGPT, Claude, Gemini, or anything that
//! looks like a chat), this library recovers the conversation as
//! role-tagged, chronologically ordered turns, or as raw text when the
//! markup gives no structure to work with. Extraction runs as a cascade of
//! strategies from most to least precise and never fails with a bare error:
//! a page with nothing on it comes back as a typed [`ExtractionError`]
//! carrying a suggestion for the user.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_chatscrape::{scrape, Options, Role};
//!
//! let html = r#"<html><head><title>Calculator</title></head><body>
//!   <div data-message-author-role="user">Build a calculator</div>
//!   <div data-message-author-role="assistant">Here is a simple calculator in Python.</div>
//! </body></html>"#;
//!
//! let opts = Options::default().with_url("https://chatgpt.com/c/abc");
//! let outcome = scrape(html, &opts);
//! let content = outcome.content().unwrap();
//! assert_eq!(content.conversation[0].role, Role::User);
//! assert_eq!(content.title, "Calculator");
//! ```
//!
//! ## Features
//!
//! - **Platform registry**: per-site selectors and confidence thresholds
//! - **Dynamic selectors**: backend-supplied overrides, refreshed on a
//!   schedule and handed to extraction as immutable snapshots
//! - **Fallback cascade**: structured selectors, container text walks,
//!   block elements, and a last-resort body walk
//! - **Draft safety**: text in editable regions is never captured
//! - **Images**: placeholders in message text, collected locators, and
//!   optional inlining as `data:` URIs

mod error;
mod options;
mod patterns;
mod result;

/// Page accessor trait the pipeline reads through.
pub mod page;

/// `dom_query` adapter implementing [`page::Page`] over HTML snapshots.
pub mod dom;

/// Static platform table and URL-based detection.
pub mod platform;

/// Noise and vagueness checks for raw-text candidates.
pub mod validator;

/// Extraction pipeline (structured selectors, text walks, cascade).
pub mod extractor;

/// Image placeholders and locator collection.
pub mod images;

/// Image inlining as `data:` URIs.
pub mod inline;

/// Backend-supplied selector overrides and their refresh loop.
pub mod selectors;

/// `getPageContent` request/response envelope.
pub mod message;

/// URL utilities for host detection and source resolution.
pub mod url_utils;

// Public API - re-exports
pub use error::{Error, Result};
pub use options::Options;
pub use platform::{Platform, PlatformConfig};
pub use result::{
    ErrorKind, ExtractionError, ExtractionStage, Role, ScrapeOutcome, ScrapedContent,
    ScrapedMessage,
};
pub use selectors::DynamicSelectorConfig;

use page::Page;

/// Scrapes an HTML snapshot using built-in selectors only.
///
/// The snapshot carries no URL of its own; set [`Options::url`] so the
/// platform can be detected.
///
/// # Example
///
/// ```rust
/// use rs_chatscrape::{scrape, ErrorKind, Options};
///
/// let outcome = scrape("<body></body>", &Options::default().with_url("chrome://newtab"));
/// assert_eq!(outcome.error().unwrap().kind, ErrorKind::Blocked);
/// ```
#[must_use]
pub fn scrape(html: &str, options: &Options) -> ScrapeOutcome {
    scrape_with_selectors(html, options, &DynamicSelectorConfig::empty())
}

/// Scrapes an HTML snapshot, trying `dynamic` selector overrides first.
///
/// Pass a snapshot taken from a [`selectors::SelectorStore`]; it is read,
/// never modified.
#[must_use]
pub fn scrape_with_selectors(
    html: &str,
    options: &Options,
    dynamic: &DynamicSelectorConfig,
) -> ScrapeOutcome {
    let doc = dom::parse(html);
    let page = dom::HtmlPage::new(&doc, options.url.clone().unwrap_or_default());
    scrape_page(&page, options, dynamic)
}

/// Runs the extraction cascade over any [`Page`] implementation.
#[must_use]
pub fn scrape_page<P: Page>(
    page: &P,
    options: &Options,
    dynamic: &DynamicSelectorConfig,
) -> ScrapeOutcome {
    extractor::cascade::run(page, options, dynamic)
}
