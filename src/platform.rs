//! Platform Registry
//!
//! Static table mapping a page URL to the chat platform it belongs to and the
//! selectors used to find its messages. Resolution is pure and never fails:
//! pages no entry claims get the generic config.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::url_utils;

/// A supported chat site, or the generic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Gemini,
    Claude,
    Generic,
}

impl Platform {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::ChatGpt => "chatgpt",
            Platform::Gemini => "gemini",
            Platform::Claude => "claude",
            Platform::Generic => "generic",
        }
    }

    /// Human-facing name used in error messages.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::ChatGpt => "ChatGPT",
            Platform::Gemini => "Gemini",
            Platform::Claude => "Claude",
            Platform::Generic => "This page",
        }
    }

    /// Parses a wire name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chatgpt" => Some(Platform::ChatGpt),
            "gemini" => Some(Platform::Gemini),
            "claude" => Some(Platform::Claude),
            "generic" => Some(Platform::Generic),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectors and heuristics for one platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformConfig {
    pub name: Platform,
    /// Pure predicate over the page URL.
    pub detect: fn(&str) -> bool,
    /// User message containers. May be empty.
    pub user_selector: &'static str,
    /// Assistant message containers. May be empty.
    pub ai_selector: &'static str,
    /// Content hides behind encapsulated rendering.
    pub uses_protected_rendering: bool,
    /// Raw text shorter than this is presumed absent.
    pub min_content_length: usize,
    /// Ordered `(user, assistant)` fallback selector pairs for platforms
    /// with unstable markup. A non-empty list also enables the container
    /// text walk.
    pub secondary_selectors: &'static [(&'static str, &'static str)],
}

impl PlatformConfig {
    /// Whether the cascade runs the heuristic sweep for this platform.
    #[must_use]
    pub fn has_heuristic_sweep(&self) -> bool {
        !self.secondary_selectors.is_empty()
    }
}

fn host_matches(url: &str, domains: &[&str]) -> bool {
    let Some(host) = url_utils::extract_hostname(url) else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

fn is_chatgpt(url: &str) -> bool {
    host_matches(url, &["chatgpt.com", "chat.openai.com"])
}

fn is_claude(url: &str) -> bool {
    host_matches(url, &["claude.ai"])
}

fn is_gemini(url: &str) -> bool {
    host_matches(url, &["gemini.google.com", "bard.google.com"])
}

fn never(_url: &str) -> bool {
    false
}

/// Known platforms, in detection priority order.
pub static REGISTRY: [PlatformConfig; 3] = [
    PlatformConfig {
        name: Platform::ChatGpt,
        detect: is_chatgpt,
        user_selector: r#"[data-message-author-role="user"]"#,
        ai_selector: r#"[data-message-author-role="assistant"]"#,
        uses_protected_rendering: false,
        min_content_length: 50,
        secondary_selectors: &[],
    },
    PlatformConfig {
        name: Platform::Claude,
        detect: is_claude,
        user_selector: r#"[data-testid="user-message"]"#,
        ai_selector: r#".font-claude-message, [data-testid="assistant-message"]"#,
        uses_protected_rendering: false,
        min_content_length: 50,
        secondary_selectors: &[],
    },
    PlatformConfig {
        name: Platform::Gemini,
        detect: is_gemini,
        user_selector: "user-query .query-text, .user-query-bubble-with-background",
        ai_selector: "model-response message-content, .model-response-text",
        uses_protected_rendering: true,
        min_content_length: 50,
        secondary_selectors: &[
            ("user-query", "model-response"),
            (".query-content", ".response-content"),
            (r#"[data-test-id="user-message"]"#, r#"[data-test-id="model-response"]"#),
        ],
    },
];

/// Broad, low-confidence config for pages no registry entry claims.
pub static GENERIC: PlatformConfig = PlatformConfig {
    name: Platform::Generic,
    detect: never,
    user_selector: r#"[data-message-author-role="user"], .user-message, .human"#,
    ai_selector: r#"[data-message-author-role="assistant"], .assistant-message, .ai-message, .bot-message"#,
    uses_protected_rendering: false,
    min_content_length: 100,
    secondary_selectors: &[],
};

/// Resolves the platform config for a page URL.
///
/// ```rust
/// use rs_chatscrape::platform::{resolve_platform, Platform};
///
/// assert_eq!(resolve_platform("https://chatgpt.com/c/123").name, Platform::ChatGpt);
/// assert_eq!(resolve_platform("https://example.com/").name, Platform::Generic);
/// ```
#[must_use]
pub fn resolve_platform(url: &str) -> &'static PlatformConfig {
    REGISTRY
        .iter()
        .find(|config| (config.detect)(url))
        .unwrap_or(&GENERIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_hosts() {
        assert_eq!(resolve_platform("https://chatgpt.com/c/abc").name, Platform::ChatGpt);
        assert_eq!(resolve_platform("https://chat.openai.com/c/abc").name, Platform::ChatGpt);
        assert_eq!(resolve_platform("https://claude.ai/chat/xyz").name, Platform::Claude);
        assert_eq!(resolve_platform("https://gemini.google.com/app/1").name, Platform::Gemini);
        assert_eq!(resolve_platform("https://bard.google.com/").name, Platform::Gemini);
    }

    #[test]
    fn host_match_is_not_substring_match() {
        assert_eq!(resolve_platform("https://notchatgpt.com/").name, Platform::Generic);
        assert_eq!(
            resolve_platform("https://example.com/?ref=chatgpt.com").name,
            Platform::Generic
        );
    }

    #[test]
    fn unknown_and_invalid_urls_are_generic() {
        let config = resolve_platform("not a url");
        assert_eq!(config.name, Platform::Generic);
        assert_eq!(config.min_content_length, 100);
        assert!(!config.user_selector.is_empty());
    }

    #[test]
    fn generic_is_less_confident_than_known_platforms() {
        for config in &REGISTRY {
            assert!(config.min_content_length < GENERIC.min_content_length);
        }
    }

    #[test]
    fn only_gemini_is_protected_and_swept() {
        for config in &REGISTRY {
            let gemini = config.name == Platform::Gemini;
            assert_eq!(config.uses_protected_rendering, gemini);
            assert_eq!(config.has_heuristic_sweep(), gemini);
        }
    }

    #[test]
    fn platform_names_round_trip() {
        for platform in [Platform::ChatGpt, Platform::Gemini, Platform::Claude, Platform::Generic] {
            assert_eq!(Platform::from_name(platform.as_str()), Some(platform));
        }
        assert_eq!(Platform::from_name("ChatGPT"), Some(Platform::ChatGpt));
        assert_eq!(Platform::from_name("bing"), None);
        assert_eq!(serde_json::to_string(&Platform::ChatGpt).unwrap(), "\"chatgpt\"");
    }
}
