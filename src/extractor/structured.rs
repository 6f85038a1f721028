//! Structured Extraction
//!
//! Turns selector matches into role-tagged messages. User and assistant
//! containers are queried separately, so DOM query order says nothing about
//! chronology; messages are sorted by their visual top edge before return.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::images;
use crate::options::Options;
use crate::page::Page;
use crate::platform::PlatformConfig;
use crate::result::{Role, ScrapedMessage};

/// Attribute carrying the author role on ChatGPT-style markup.
pub const DEFAULT_ROLE_ATTRIBUTE: &str = "data-message-author-role";

/// How a matched element's role is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRule {
    /// Every match has this role.
    Fixed(Role),
    /// Read from an attribute on the match or its nearest ancestor
    /// carrying it; matches with other values are skipped.
    Attribute {
        name: String,
        user_value: String,
        assistant_value: String,
    },
}

impl RoleRule {
    /// `data-message-author-role` with `user` / `assistant` values.
    #[must_use]
    pub fn default_attribute() -> Self {
        RoleRule::Attribute {
            name: DEFAULT_ROLE_ATTRIBUTE.to_string(),
            user_value: "user".to_string(),
            assistant_value: "assistant".to_string(),
        }
    }

    fn resolve<P: Page>(&self, page: &P, node: P::Node) -> Option<Role> {
        match self {
            RoleRule::Fixed(role) => Some(*role),
            RoleRule::Attribute {
                name,
                user_value,
                assistant_value,
            } => {
                let value = page
                    .ancestors(node)
                    .into_iter()
                    .find_map(|n| page.attr(n, name))?;
                let value = value.trim();
                if value.eq_ignore_ascii_case(user_value) {
                    Some(Role::User)
                } else if value.eq_ignore_ascii_case(assistant_value) {
                    Some(Role::Assistant)
                } else {
                    None
                }
            }
        }
    }
}

/// A selector paired with the way its matches get a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRule {
    pub selector: String,
    pub role: RoleRule,
}

impl SelectorRule {
    #[must_use]
    pub fn fixed(selector: &str, role: Role) -> Self {
        Self {
            selector: selector.to_string(),
            role: RoleRule::Fixed(role),
        }
    }
}

/// Messages recovered by one structured attempt.
#[derive(Debug, Clone)]
pub struct StructuredResult<N> {
    /// Sorted top-to-bottom.
    pub messages: Vec<ScrapedMessage>,
    /// Element each message came from, same order as `messages`.
    pub nodes: Vec<N>,
    /// Selectors that could not be used.
    pub warnings: Vec<String>,
}

impl<N> StructuredResult<N> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

struct Candidate<N> {
    message: ScrapedMessage,
    node: N,
    top: Option<f64>,
    position: usize,
}

/// Whether the element and all of its ancestors are visible.
fn is_rendered<P: Page>(page: &P, node: P::Node) -> bool {
    page.ancestors(node).into_iter().all(|n| page.is_visible(n))
}

/// Runs the registry selectors for `config`: user first, then assistant.
pub fn extract_structured<P: Page>(
    page: &P,
    config: &PlatformConfig,
    opts: &Options,
) -> StructuredResult<P::Node> {
    let rules = [
        SelectorRule::fixed(config.user_selector, Role::User),
        SelectorRule::fixed(config.ai_selector, Role::Assistant),
    ];
    extract_with_rules(page, &rules, opts)
}

/// Runs each rule in order and merges the matches into one sorted list.
///
/// Malformed selectors are logged, recorded as warnings and treated as
/// matching nothing. Elements nested inside an element already matched are
/// skipped so no text is captured twice, as are elements inside editable
/// regions.
pub fn extract_with_rules<P: Page>(
    page: &P,
    rules: &[SelectorRule],
    opts: &Options,
) -> StructuredResult<P::Node> {
    let mut candidates: Vec<Candidate<P::Node>> = Vec::new();
    let mut claimed: Vec<P::Node> = Vec::new();
    let mut warnings = Vec::new();

    for rule in rules {
        let selector = rule.selector.trim();
        if selector.is_empty() {
            continue;
        }

        let nodes = match page.query_all(None, selector) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(selector, error = %err, "skipping selector");
                warnings.push(format!("Skipped selector `{selector}`: {err}"));
                continue;
            }
        };

        for node in nodes {
            if claimed.iter().any(|c| page.is_within(node, *c)) {
                continue;
            }
            if page.is_editable_region(node) || !is_rendered(page, node) {
                continue;
            }
            let Some(role) = rule.role.resolve(page, node) else {
                continue;
            };
            claimed.push(node);

            let mut content = page.text(node);
            if opts.include_images {
                for placeholder in images::placeholders(page, node, opts) {
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str(&placeholder);
                }
            }

            let Some(message) = ScrapedMessage::new(role, &content) else {
                continue;
            };
            candidates.push(Candidate {
                message,
                node,
                top: page.bounding_top(node),
                position: page.position(node),
            });
        }
    }

    // Pixel offsets and document order do not mix: one match without
    // layout puts every match in document order.
    let laid_out = candidates.iter().all(|c| c.top.is_some());
    candidates.sort_by(|a, b| {
        let by_top = match (a.top, b.top) {
            (Some(a_top), Some(b_top)) if laid_out => a_top.total_cmp(&b_top),
            _ => Ordering::Equal,
        };
        by_top.then(a.position.cmp(&b.position))
    });

    debug!(count = candidates.len(), rules = rules.len(), "structured extraction");

    let (messages, nodes) = candidates
        .into_iter()
        .map(|c| (c.message, c.node))
        .unzip();

    StructuredResult {
        messages,
        nodes,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{self, HtmlPage};
    use crate::platform::resolve_platform;

    fn run(html: &str, url: &str, opts: &Options) -> Vec<(Role, String)> {
        let doc = dom::parse(html);
        let page = HtmlPage::new(&doc, url);
        extract_structured(&page, resolve_platform(url), opts)
            .messages
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect()
    }

    #[test]
    fn sorts_by_visual_position_not_query_order() {
        let html = r#"<body>
            <div data-message-author-role="user">first question</div>
            <div data-message-author-role="assistant">first answer</div>
            <div data-message-author-role="user">second question</div>
        </body>"#;
        let got = run(html, "https://chatgpt.com/c/1", &Options::default());
        assert_eq!(
            got,
            vec![
                (Role::User, "first question".to_string()),
                (Role::Assistant, "first answer".to_string()),
                (Role::User, "second question".to_string()),
            ]
        );
    }

    #[test]
    fn bounding_top_annotation_overrides_document_order() {
        let html = r#"<body>
            <div data-message-author-role="user" data-bounding-top="300">later</div>
            <div data-message-author-role="assistant" data-bounding-top="100">earlier</div>
        </body>"#;
        let got = run(html, "https://chatgpt.com/c/1", &Options::default());
        assert_eq!(got[0].1, "earlier");
        assert_eq!(got[1].1, "later");
    }

    #[test]
    fn partial_annotation_falls_back_to_document_order() {
        let html = r#"<body>
            <div data-message-author-role="user" data-bounding-top="5000">asked first</div>
            <div data-message-author-role="assistant">answered second</div>
            <div data-message-author-role="user" data-bounding-top="10">asked third</div>
        </body>"#;
        let got = run(html, "https://chatgpt.com/c/1", &Options::default());
        let texts: Vec<&str> = got.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["asked first", "answered second", "asked third"]);
    }

    #[test]
    fn matches_under_hidden_ancestors_are_skipped() {
        let html = r#"<body>
            <div style="display: none"><div data-message-author-role="user">stale copy</div></div>
            <div hidden><div><div data-message-author-role="assistant">cached answer</div></div></div>
            <div data-message-author-role="user">visible question</div>
        </body>"#;
        let got = run(html, "https://chatgpt.com/c/1", &Options::default());
        assert_eq!(got, vec![(Role::User, "visible question".to_string())]);
    }

    #[test]
    fn skips_blank_and_editable_matches() {
        let html = r#"<body>
            <div data-message-author-role="user">   </div>
            <div contenteditable="true"><div data-message-author-role="user">draft</div></div>
            <div data-message-author-role="assistant">answer</div>
        </body>"#;
        let got = run(html, "https://chatgpt.com/c/1", &Options::default());
        assert_eq!(got, vec![(Role::Assistant, "answer".to_string())]);
    }

    #[test]
    fn nested_matches_are_captured_once() {
        let html = r#"<body>
            <div class="user-message"><div class="human">only once please</div></div>
        </body>"#;
        let got = run(html, "https://example.com/", &Options::default());
        assert_eq!(got, vec![(Role::User, "only once please".to_string())]);
    }

    #[test]
    fn image_placeholders_follow_text() {
        let html = r#"<body>
            <div data-message-author-role="user">look at this
                <img src="/uploads/chart.png" width="400" height="300">
                <img src="/icons/avatar.png" width="24" height="24">
                <img src="/x/y.jpg" alt="A cat" width="200" height="200">
            </div>
        </body>"#;
        let opts = Options::for_request(true);
        let got = run(html, "https://chatgpt.com/c/1", &opts);
        assert_eq!(got[0].1, "look at this\n[Image: chart.png]\n[Image: A cat]");

        let without = run(html, "https://chatgpt.com/c/1", &Options::default());
        assert_eq!(without[0].1, "look at this");
    }

    #[test]
    fn attribute_role_rule_reads_nearest_ancestor() {
        let doc = dom::parse(
            r#"<body>
                <section data-role="human"><p class="msg">hi</p></section>
                <section data-role="bot"><p class="msg">hello</p></section>
                <section data-role="system"><p class="msg">ignored</p></section>
                <p class="msg">no role</p>
            </body>"#,
        );
        let page = HtmlPage::new(&doc, "https://example.com/");
        let rule = SelectorRule {
            selector: ".msg".to_string(),
            role: RoleRule::Attribute {
                name: "data-role".to_string(),
                user_value: "human".to_string(),
                assistant_value: "bot".to_string(),
            },
        };
        let result = extract_with_rules(&page, &[rule], &Options::default());
        let got: Vec<(Role, &str)> = result
            .messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(got, vec![(Role::User, "hi"), (Role::Assistant, "hello")]);
        assert_eq!(result.nodes.len(), 2);
    }

    #[test]
    fn malformed_selector_becomes_warning() {
        let doc = dom::parse(r#"<body><p class="a">text here</p></body>"#);
        let page = HtmlPage::new(&doc, "https://example.com/");
        let rules = [
            SelectorRule::fixed("p[[[", Role::User),
            SelectorRule::fixed("p.a", Role::Assistant),
        ];
        let result = extract_with_rules(&page, &rules, &Options::default());
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("p[[["));
    }
}
