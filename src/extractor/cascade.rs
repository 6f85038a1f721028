//! Fallback Cascade
//!
//! Runs the extraction strategies from most to least precise and stops at
//! the first that produces something usable:
//!
//! 1. dynamic selectors supplied by the backend for this host
//! 2. built-in registry selectors
//! 3. secondary selectors, then a text walk over the main scroll container
//!    (platforms with unstable markup only)
//! 4. paragraphs, headings and list items
//! 5. a text walk over the whole body, wrapped as one assistant message
//! 6. `NoContent`
//!
//! The cascade is finite and deterministic: every step runs at most once
//! and only reads the page.

use tracing::debug;

use super::structured::{extract_structured, extract_with_rules, SelectorRule, StructuredResult};
use super::walker::{collect_blocks, find_scroll_container, walk_text};
use crate::images::collect_images;
use crate::options::Options;
use crate::page::Page;
use crate::platform::{resolve_platform, PlatformConfig};
use crate::result::{
    ExtractionError, ExtractionStage, Role, ScrapeOutcome, ScrapedContent, ScrapedMessage,
};
use crate::selectors::DynamicSelectorConfig;
use crate::url_utils;
use crate::validator::validate_with_floor;

/// Browser-internal and local schemes that never hold a hosted conversation.
const NON_WEB_SCHEMES: &[&str] = &[
    "about",
    "blob",
    "brave",
    "chrome",
    "chrome-extension",
    "chrome-search",
    "data",
    "devtools",
    "edge",
    "file",
    "javascript",
    "moz-extension",
    "opera",
    "view-source",
    "vivaldi",
];

/// Runs the full cascade over `page`.
pub fn run<P: Page>(page: &P, opts: &Options, dynamic: &DynamicSelectorConfig) -> ScrapeOutcome {
    let url = opts
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| page.url())
        .to_string();

    if let Some(refusal) = check_access(&url) {
        debug!(url = url.as_str(), kind = ?refusal.kind, "page refused");
        return ScrapeOutcome::Failure(refusal);
    }

    let config = resolve_platform(&url);
    debug!(url = url.as_str(), platform = %config.name, "starting cascade");

    Cascade {
        page,
        opts,
        config,
        url,
        warnings: Vec::new(),
    }
    .run(dynamic)
}

/// Refuses pages that cannot hold a conversation.
///
/// Empty or unparseable URLs pass: bare HTML snapshots often carry none.
/// Unknown schemes pass too, so a bare `localhost:3000/chat` is not mistaken
/// for a browser page.
fn check_access(url: &str) -> Option<ExtractionError> {
    let scheme = url_utils::scheme(url)?;
    if scheme == "about" && url.trim().eq_ignore_ascii_case("about:blank") {
        return Some(ExtractionError::empty_page());
    }
    NON_WEB_SCHEMES
        .contains(&scheme.as_str())
        .then(|| ExtractionError::blocked(&scheme))
}

struct Cascade<'p, P: Page> {
    page: &'p P,
    opts: &'p Options,
    config: &'static PlatformConfig,
    url: String,
    warnings: Vec<String>,
}

impl<P: Page> Cascade<'_, P> {
    fn run(mut self, dynamic: &DynamicSelectorConfig) -> ScrapeOutcome {
        if let Some(outcome) = self.dynamic_selectors(dynamic) {
            return outcome;
        }

        let built_in = extract_structured(self.page, self.config, self.opts);
        if let Some(outcome) = self.accept_structured(built_in, ExtractionStage::Structured) {
            return outcome;
        }
        debug!("built-in selectors found nothing");

        if self.config.has_heuristic_sweep() {
            if let Some(outcome) = self.secondary_selectors() {
                return outcome;
            }
        }

        let Some(body) = self.page.body() else {
            debug!("document has no body");
            return ScrapeOutcome::Failure(ExtractionError::empty_page());
        };
        let body_text = self.page.text(body);

        if self.config.uses_protected_rendering
            && body_text.chars().count() < self.opts.protected_text_threshold
        {
            debug!(chars = body_text.chars().count(), "protected rendering suspected");
            return ScrapeOutcome::Failure(ExtractionError::protected_rendering(self.config.name));
        }

        if self.config.has_heuristic_sweep() {
            let root = find_scroll_container(self.page).unwrap_or(body);
            let text = walk_text(self.page, root, self.opts);
            if let Some(outcome) = self.accept_raw(text, root, ExtractionStage::ContainerWalk) {
                return outcome;
            }
            debug!("container walk below minimum length");
        }

        let blocks = collect_blocks(self.page, self.opts);
        if let Some(outcome) = self.accept_raw(blocks, body, ExtractionStage::BlockElements) {
            return outcome;
        }
        debug!("block fallback below minimum length");

        self.desperate_walk(body, body_text)
    }

    fn dynamic_selectors(&mut self, dynamic: &DynamicSelectorConfig) -> Option<ScrapeOutcome> {
        let entry = dynamic.entry_for_url(&self.url)?;
        let role = entry.role_rule();

        for selector in &entry.selectors {
            let rule = SelectorRule {
                selector: selector.clone(),
                role: role.clone(),
            };
            let result = extract_with_rules(self.page, &[rule], self.opts);
            if let Some(outcome) = self.accept_structured(result, ExtractionStage::DynamicSelectors)
            {
                debug!(selector = selector.as_str(), "dynamic selector matched");
                return Some(outcome);
            }
        }

        debug!(candidates = entry.selectors.len(), "dynamic selectors found nothing");
        None
    }

    fn secondary_selectors(&mut self) -> Option<ScrapeOutcome> {
        for (user, assistant) in self.config.secondary_selectors {
            let rules = [
                SelectorRule::fixed(user, Role::User),
                SelectorRule::fixed(assistant, Role::Assistant),
            ];
            let result = extract_with_rules(self.page, &rules, self.opts);
            if let Some(outcome) =
                self.accept_structured(result, ExtractionStage::SecondarySelectors)
            {
                return Some(outcome);
            }
        }
        debug!("secondary selectors found nothing");
        None
    }

    /// Success when `result` holds at least one message. Its warnings are
    /// kept either way.
    fn accept_structured(
        &mut self,
        result: StructuredResult<P::Node>,
        stage: ExtractionStage,
    ) -> Option<ScrapeOutcome> {
        self.warnings.extend(result.warnings);
        if result.messages.is_empty() {
            return None;
        }

        let raw_text = match self.page.body().map(|body| self.page.text(body)) {
            Some(text) if !text.is_empty() => text,
            _ => result
                .messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        };

        Some(self.success(result.messages, raw_text, &result.nodes, stage))
    }

    /// A raw-text candidate long enough for the platform is validated and
    /// becomes either a raw-text success or `ValidationFailed`. Shorter
    /// candidates fall through to the next step.
    fn accept_raw(
        &self,
        text: String,
        root: P::Node,
        stage: ExtractionStage,
    ) -> Option<ScrapeOutcome> {
        if text.chars().count() < self.config.min_content_length {
            return None;
        }

        let verdict = validate_with_floor(
            &text,
            self.config.min_content_length,
            self.opts.validator_floor,
        );
        if let Some(reason) = verdict.reason {
            debug!(?stage, %reason, "raw text rejected");
            return Some(ScrapeOutcome::Failure(ExtractionError::validation_failed(
                self.config.name,
                reason.as_str(),
            )));
        }

        Some(self.success(Vec::new(), text, &[root], stage))
    }

    fn desperate_walk(&self, body: P::Node, body_text: String) -> ScrapeOutcome {
        let text = walk_text(self.page, body, self.opts);
        if text.chars().count() <= self.opts.desperate_min_chars {
            debug!(chars = text.chars().count(), "nothing usable on page");
            return ScrapeOutcome::Failure(ExtractionError::no_content(self.config.name));
        }

        let Some(message) = ScrapedMessage::new(Role::Assistant, &text) else {
            return ScrapeOutcome::Failure(ExtractionError::no_content(self.config.name));
        };
        let raw_text = if body_text.is_empty() { text } else { body_text };
        self.success(vec![message], raw_text, &[body], ExtractionStage::DesperateWalk)
    }

    fn success(
        &self,
        conversation: Vec<ScrapedMessage>,
        raw_text: String,
        image_roots: &[P::Node],
        stage: ExtractionStage,
    ) -> ScrapeOutcome {
        let images = if self.opts.include_images {
            collect_images(self.page, image_roots, self.opts)
        } else {
            Vec::new()
        };

        debug!(
            ?stage,
            messages = conversation.len(),
            images = images.len(),
            "extraction succeeded"
        );

        ScrapeOutcome::Success(ScrapedContent {
            url: self.url.clone(),
            title: self.page.title(),
            platform: self.config.name,
            conversation,
            raw_text,
            images,
            extraction_stage: stage,
            warnings: self.warnings.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{self, HtmlPage};
    use crate::platform::Platform;
    use crate::result::ErrorKind;

    fn scrape_at(html: &str, url: &str, dynamic: &DynamicSelectorConfig) -> ScrapeOutcome {
        let doc = dom::parse(html);
        let page = HtmlPage::new(&doc, url);
        run(&page, &Options::default(), dynamic)
    }

    fn content(outcome: ScrapeOutcome) -> ScrapedContent {
        match outcome {
            ScrapeOutcome::Success(content) => content,
            ScrapeOutcome::Failure(err) => panic!("expected success, got {err}"),
        }
    }

    fn failure(outcome: ScrapeOutcome) -> ExtractionError {
        match outcome {
            ScrapeOutcome::Failure(err) => err,
            ScrapeOutcome::Success(content) => panic!("expected failure, got {content:?}"),
        }
    }

    const LONG_ANSWER: &str = "Here is a detailed explanation of how the borrow checker \
        tracks lifetimes across function boundaries in Rust programs.";

    #[test]
    fn refuses_browser_internal_pages() {
        let empty = DynamicSelectorConfig::empty();
        let blank = failure(scrape_at("<body></body>", "about:blank", &empty));
        assert_eq!(blank.kind, ErrorKind::EmptyPage);

        for url in ["chrome://extensions", "edge://settings", "file:///tmp/x.html"] {
            let err = failure(scrape_at("<body><p>x</p></body>", url, &empty));
            assert_eq!(err.kind, ErrorKind::Blocked, "{url}");
        }
    }

    #[test]
    fn dynamic_selector_takes_precedence() {
        let html = r#"<body>
            <div data-message-author-role="user">built-in user</div>
            <div class="turn" data-speaker="me">dynamic user</div>
            <div class="turn" data-speaker="bot">dynamic answer</div>
        </body>"#;
        let dynamic = DynamicSelectorConfig::from_json_lenient(
            r#"{"chatgpt.com": {"platform": "chatgpt", "selectors": [".missing", ".turn"],
                "roleAttribute": "data-speaker", "userRoleValue": "me", "assistantRoleValue": "bot"}}"#,
        );
        let got = content(scrape_at(html, "https://chatgpt.com/c/1", &dynamic));
        assert_eq!(got.extraction_stage, ExtractionStage::DynamicSelectors);
        let texts: Vec<&str> = got.conversation.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["dynamic user", "dynamic answer"]);
    }

    #[test]
    fn unusable_dynamic_selectors_fall_back_to_built_in() {
        let html = r#"<body>
            <div data-message-author-role="user">question here</div>
            <div data-message-author-role="assistant">answer here</div>
        </body>"#;
        let dynamic = DynamicSelectorConfig::from_json_lenient(
            r#"{"chatgpt.com": {"platform": "chatgpt", "selectors": ["div[[[", ".nothing"]}}"#,
        );
        let got = content(scrape_at(html, "https://chatgpt.com/c/1", &dynamic));
        assert_eq!(got.extraction_stage, ExtractionStage::Structured);
        assert_eq!(got.conversation.len(), 2);
        assert_eq!(got.warnings.len(), 1);
        assert!(got.warnings[0].contains("div[[["));
    }

    #[test]
    fn structured_success_stops_the_cascade() {
        let html = format!(
            r#"<body>
                <div data-message-author-role="assistant">short reply</div>
                <p>{LONG_ANSWER}</p>
            </body>"#
        );
        let got = content(scrape_at(&html, "https://chatgpt.com/c/1", &DynamicSelectorConfig::empty()));
        assert_eq!(got.extraction_stage, ExtractionStage::Structured);
        assert_eq!(got.conversation.len(), 1);
        assert_eq!(got.conversation[0].content, "short reply");
        assert!(got.raw_text.contains("borrow checker"));
    }

    #[test]
    fn gemini_secondary_selectors() {
        let html = format!(
            r#"<body>
                <user-query>Why does my build fail?</user-query>
                <model-response>{LONG_ANSWER}</model-response>
            </body>"#
        );
        let got = content(scrape_at(
            &html,
            "https://gemini.google.com/app/1",
            &DynamicSelectorConfig::empty(),
        ));
        assert_eq!(got.platform, Platform::Gemini);
        assert_eq!(got.extraction_stage, ExtractionStage::SecondarySelectors);
        assert_eq!(got.conversation[0].role, Role::User);
        assert_eq!(got.conversation[1].role, Role::Assistant);
    }

    #[test]
    fn gemini_protected_rendering() {
        let html = "<body><div>Gemini</div><div>Conversation</div></body>";
        let err = failure(scrape_at(
            html,
            "https://gemini.google.com/app/1",
            &DynamicSelectorConfig::empty(),
        ));
        assert_eq!(err.kind, ErrorKind::ProtectedRendering);
        assert_eq!(err.platform, Some(Platform::Gemini));
    }

    #[test]
    fn gemini_container_walk_skips_drafts() {
        let html = format!(
            r#"<body>
                <nav>Recent chats and settings</nav>
                <div class="overflow-y-auto">
                    <span>Why does my build fail?</span>
                    <span>{LONG_ANSWER}</span>
                    <button>Regenerate</button>
                </div>
                <div contenteditable="true">UNSENT_DRAFT_TEXT</div>
            </body>"#
        );
        let got = content(scrape_at(
            &html,
            "https://gemini.google.com/app/1",
            &DynamicSelectorConfig::empty(),
        ));
        assert_eq!(got.extraction_stage, ExtractionStage::ContainerWalk);
        assert!(got.conversation.is_empty());
        assert!(got.raw_text.starts_with("Why does my build fail?\n"));
        assert!(!got.raw_text.contains("UNSENT_DRAFT_TEXT"));
        assert!(!got.raw_text.contains("Recent chats"));
    }

    #[test]
    fn block_fallback_for_generic_pages() {
        let html = format!(
            r#"<body>
                <h1>Title</h1>
                <p>{LONG_ANSWER}</p>
                <p>A second paragraph continues the explanation further.</p>
            </body>"#
        );
        let got = content(scrape_at(&html, "https://example.com/chat", &DynamicSelectorConfig::empty()));
        assert_eq!(got.platform, Platform::Generic);
        assert_eq!(got.extraction_stage, ExtractionStage::BlockElements);
        assert!(got.raw_text.contains("\n\nA second paragraph"));
        assert!(!got.raw_text.contains("Title"));
    }

    #[test]
    fn noisy_raw_text_fails_validation() {
        let html = "<body>\
            <p>Loading your conversation history from the server, this can take a while.</p>\
            <p>Please keep this tab open until everything has finished syncing completely.</p>\
            </body>";
        let err = failure(scrape_at(html, "https://example.com/", &DynamicSelectorConfig::empty()));
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
        assert!(err.message.contains("error or loading message"));
    }

    #[test]
    fn desperate_walk_wraps_single_assistant_message() {
        let html = "<body><div><span>Short text fragments</span> <span>scattered across spans</span> \
            <span>with no block structure at all</span></div></body>";
        let got = content(scrape_at(html, "https://example.com/", &DynamicSelectorConfig::empty()));
        assert_eq!(got.extraction_stage, ExtractionStage::DesperateWalk);
        assert_eq!(got.conversation.len(), 1);
        assert_eq!(got.conversation[0].role, Role::Assistant);
        assert_eq!(
            got.conversation[0].content,
            "Short text fragments\nscattered across spans\nwith no block structure at all"
        );
        assert!(!got.raw_text.is_empty());
    }

    #[test]
    fn desperate_walk_keeps_conversations_that_mention_noise_words() {
        let html = "<body><span>Why does my React dashboard keep loading forever after I deploy it?</span> \
            <span>It works locally.</span></body>";
        let got = content(scrape_at(html, "https://chatgpt.com/c/1", &DynamicSelectorConfig::empty()));
        assert_eq!(got.extraction_stage, ExtractionStage::DesperateWalk);
        assert_eq!(got.conversation.len(), 1);
        assert_eq!(
            got.conversation[0].content,
            "Why does my React dashboard keep loading forever after I deploy it?\nIt works locally."
        );
    }

    #[test]
    fn desperate_walk_needs_more_than_fifty_chars() {
        let page_with = |len: usize| format!("<body><div><span>{}</span></div></body>", "x".repeat(len));
        let empty = DynamicSelectorConfig::empty();

        let err = failure(scrape_at(&page_with(50), "https://example.com/", &empty));
        assert_eq!(err.kind, ErrorKind::NoContent);

        let got = content(scrape_at(&page_with(51), "https://example.com/", &empty));
        assert_eq!(got.extraction_stage, ExtractionStage::DesperateWalk);
        assert_eq!(got.conversation.len(), 1);
        assert_eq!(got.conversation[0].content, "x".repeat(51));
    }

    #[test]
    fn protected_rendering_threshold_is_exclusive() {
        let at_threshold = "Why does my build fail on the release profile only? \
            The debug build links fine on each machine I own";
        let below = "Why did my build fail on the release profile only? \
            The debug build links fine on each machine I own";
        assert_eq!(at_threshold.chars().count(), 100);
        assert_eq!(below.chars().count(), 99);
        let empty = DynamicSelectorConfig::empty();
        let url = "https://gemini.google.com/app/1";

        let got = content(scrape_at(&format!("<body><p>{at_threshold}</p></body>"), url, &empty));
        assert_eq!(got.extraction_stage, ExtractionStage::ContainerWalk);
        assert_eq!(got.raw_text, at_threshold);

        let err = failure(scrape_at(&format!("<body><p>{below}</p></body>"), url, &empty));
        assert_eq!(err.kind, ErrorKind::ProtectedRendering);
    }

    #[test]
    fn unknown_schemes_proceed_as_generic() {
        let html = format!("<body><p>{LONG_ANSWER}</p></body>");
        let empty = DynamicSelectorConfig::empty();
        for url in ["localhost:3000/chat", "intranet:8080/c/1"] {
            let got = content(scrape_at(&html, url, &empty));
            assert_eq!(got.platform, Platform::Generic, "{url}");
        }

        let err = failure(scrape_at(&html, "about:settings", &empty));
        assert_eq!(err.kind, ErrorKind::Blocked);
    }

    #[test]
    fn nothing_usable_is_no_content() {
        let err = failure(scrape_at(
            "<body><p>hi</p></body>",
            "https://claude.ai/chat/1",
            &DynamicSelectorConfig::empty(),
        ));
        assert_eq!(err.kind, ErrorKind::NoContent);
        assert_eq!(err.platform, Some(Platform::Claude));
        assert!(err.kind.is_retryable());
    }

    #[test]
    fn missing_body_is_empty_page() {
        struct NoBody;
        impl Page for NoBody {
            type Node = usize;
            fn url(&self) -> &str {
                "https://example.com/"
            }
            fn title(&self) -> String {
                String::new()
            }
            fn body(&self) -> Option<usize> {
                None
            }
            fn query_all(&self, _: Option<usize>, _: &str) -> crate::Result<Vec<usize>> {
                Ok(Vec::new())
            }
            fn text(&self, _: usize) -> String {
                String::new()
            }
            fn bounding_top(&self, _: usize) -> Option<f64> {
                None
            }
            fn is_editable_region(&self, _: usize) -> bool {
                false
            }
            fn tag_name(&self, _: usize) -> String {
                String::new()
            }
            fn attr(&self, _: usize, _: &str) -> Option<String> {
                None
            }
            fn parent(&self, _: usize) -> Option<usize> {
                None
            }
            fn position(&self, node: usize) -> usize {
                node
            }
            fn rendered_size(&self, _: usize) -> Option<(f64, f64)> {
                None
            }
            fn is_visible(&self, _: usize) -> bool {
                true
            }
            fn is_scrollable(&self, _: usize) -> bool {
                false
            }
            fn text_nodes(&self, _: usize) -> Vec<(usize, String)> {
                Vec::new()
            }
        }

        let err = failure(run(&NoBody, &Options::default(), &DynamicSelectorConfig::empty()));
        assert_eq!(err.kind, ErrorKind::EmptyPage);
    }
}
