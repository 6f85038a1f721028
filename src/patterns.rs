//! Compiled regex patterns and typed heuristic tables.
//!
//! All patterns are compiled once at startup using `LazyLock`. Tables are
//! ordered slices so each one can be tested and extended on its own.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Noise Detection
// =============================================================================

/// A named pattern that marks text as a loading indicator or error banner.
#[derive(Debug)]
pub struct NoisePattern {
    pub name: &'static str,
    pub regex: Regex,
}

fn noise(name: &'static str, pattern: &str) -> NoisePattern {
    NoisePattern {
        name,
        regex: Regex::new(pattern).expect("noise pattern regex"),
    }
}

/// Loading indicators, HTTP error banners and access walls.
///
/// Matched case-insensitively against the whole trimmed text.
pub static NOISE_PATTERNS: LazyLock<Vec<NoisePattern>> = LazyLock::new(|| {
    vec![
        noise("loading", r"(?i)\bloading\b"),
        noise("please-wait", r"(?i)\bplease\s+wait\b"),
        noise(
            "http-error",
            r"(?i)\b(?:error\s+(?:4|5)\d\d|(?:500|502|503|504)\s+(?:internal server error|bad gateway|service unavailable|gateway timeout)|internal server error)\b",
        ),
        noise("not-found", r"(?i)\b404\b"),
        noise("sign-in", r"(?i)\bsign\s+in\s+to\s+continue\b"),
        noise("access-denied", r"(?i)\baccess\s+denied\b"),
        noise("forbidden", r"(?i)\bforbidden\b"),
    ]
});

/// Returns the name of the first noise pattern matching `text`.
#[must_use]
pub fn matching_noise_pattern(text: &str) -> Option<&'static str> {
    NOISE_PATTERNS
        .iter()
        .find(|p| p.regex.is_match(text))
        .map(|p| p.name)
}

// =============================================================================
// Conversational Markers
// =============================================================================

/// Question words that make a short snippet conversational.
pub const CONVERSATIONAL_KEYWORDS: &[&str] = &["how", "what", "why", "when", "where"];

/// Role prefixes that make a short snippet conversational.
pub const ROLE_MARKERS: &[&str] = &["user:", "ai:", "assistant:", "human:"];

/// Punctuation that makes a short snippet conversational.
pub const CONVERSATIONAL_PUNCTUATION: &[char] = &['?', '!'];

// =============================================================================
// Text Walk Exclusions
// =============================================================================

/// Elements whose text is never conversation content.
pub const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "textarea", "input", "select", "option",
    "button", "svg", "nav", "head", "title",
];

/// ARIA roles of UI controls whose labels are not conversation content.
pub const UI_CONTROL_ROLES: &[&str] = &[
    "button", "textbox", "menu", "menuitem", "menubar", "navigation", "toolbar", "tooltip",
    "tab", "tablist", "dialog", "alert", "status",
];

/// Exact (case-insensitive) UI labels rejected by text walks.
pub const UI_LABEL_DENYLIST: &[&str] = &[
    "submit", "cancel", "regenerate", "copy", "copy code", "edit", "share", "send",
    "retry", "new chat", "show drafts", "good response", "bad response", "more",
    "stop generating", "read aloud",
];

/// Returns true when `text` is exactly a known UI label.
#[must_use]
pub fn is_ui_label(text: &str) -> bool {
    let trimmed = text.trim();
    UI_LABEL_DENYLIST
        .iter()
        .any(|label| trimmed.eq_ignore_ascii_case(label))
}

/// Elements that start a new line in rendered text.
pub const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "ol", "p", "pre", "section", "summary", "table", "tr", "ul",
];

// =============================================================================
// Layout Heuristics
// =============================================================================

/// Inline style declaring a scrolling overflow.
pub static SCROLLABLE_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)overflow(?:-y)?\s*:\s*(?:auto|scroll)").expect("SCROLLABLE_STYLE regex")
});

/// Utility classes declaring a scrolling overflow.
pub const SCROLLABLE_CLASSES: &[&str] = &[
    "overflow-y-auto", "overflow-auto", "overflow-y-scroll", "overflow-scroll",
];

/// Inline style hiding an element.
pub static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:display\s*:\s*none|visibility\s*:\s*hidden)").expect("HIDDEN_STYLE regex")
});

/// A `width: 24px` / `height: 24px` style declaration.
pub static STYLE_DIMENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*(width|height)\s*:\s*([0-9]+(?:\.[0-9]+)?)\s*px")
        .expect("STYLE_DIMENSION regex")
});

// =============================================================================
// Text Cleaning Patterns
// =============================================================================

/// Matches whitespace runs for normalization.
pub static WHITESPACE_NORMALIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").expect("WHITESPACE_NORMALIZE regex")
});

/// Matches three or more consecutive newlines.
pub static MULTIPLE_NEWLINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n{3,}").expect("MULTIPLE_NEWLINES regex")
});

// =============================================================================
// CSS Selectors
// =============================================================================

/// Block-level content elements read by the generic fallback.
pub const BLOCK_CONTENT_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, li";

/// Image elements.
pub const IMAGE_SELECTOR: &str = "img";
