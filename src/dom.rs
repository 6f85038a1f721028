//! HTML snapshot pages.
//!
//! [`HtmlPage`] implements the [`Page`] seam over a `dom_query` document.
//! A static snapshot has no layout engine behind it, so geometry comes from
//! the markup itself:
//!
//! - `bounding_top` reads `data-bounding-top` (written by capture harnesses
//!   that record layout) and is `None` without it.
//! - `rendered_size` reads `width`/`height` attributes, then inline style
//!   pixel values.
//! - visibility and scrollability come from attributes, inline style and
//!   utility classes.

use std::collections::HashMap;

use dom_query::{Matcher, NodeId, NodeRef, Selection};
use tracing::debug;

// Re-export core types for external use
pub use dom_query::Document;

use crate::error::{Error, Result};
use crate::page::Page;
use crate::patterns::{
    BLOCK_TAGS, HIDDEN_STYLE, MULTIPLE_NEWLINES, SCROLLABLE_CLASSES, SCROLLABLE_STYLE,
    STYLE_DIMENSION, WHITESPACE_NORMALIZE,
};

/// Attribute a capture harness uses to record an element's bounding-box top.
pub const BOUNDING_TOP_ATTR: &str = "data-bounding-top";

/// Elements whose content never reaches rendered text.
const TEXT_SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "textarea", "input", "select",
];

/// Parse HTML string into document.
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Lowercase tag name of an element node (empty for non-elements).
#[must_use]
pub fn tag_name(node: &NodeRef) -> String {
    node.node_name()
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Attribute value of an element node.
#[inline]
#[must_use]
pub fn get_attribute(node: &NodeRef, name: &str) -> Option<String> {
    node.attr(name).map(|s| s.to_string())
}

/// Whether the element itself opens an editable region.
fn opens_editable_region(node: &NodeRef) -> bool {
    let tag = tag_name(node);
    if tag == "textarea" || tag == "input" {
        return true;
    }
    if let Some(value) = node.attr("contenteditable") {
        if !value.trim().eq_ignore_ascii_case("false") {
            return true;
        }
    }
    node.attr("role")
        .is_some_and(|role| role.trim().eq_ignore_ascii_case("textbox"))
}

fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value.strip_suffix("px").unwrap_or(value).trim();
    value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Appends a text node's content with whitespace collapsed the way inline
/// rendering does.
fn push_collapsed(out: &mut String, text: &str) {
    let collapsed = WHITESPACE_NORMALIZE.replace_all(text, " ");
    let at_line_start = out.is_empty() || out.ends_with('\n') || out.ends_with(' ');
    if at_line_start {
        out.push_str(collapsed.trim_start());
    } else {
        out.push_str(&collapsed);
    }
}

/// Trims line ends and collapses runs of blank lines.
fn finish_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");
    MULTIPLE_NEWLINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// A parsed HTML snapshot of a chat page.
///
/// ```rust
/// use rs_chatscrape::dom::{self, HtmlPage};
/// use rs_chatscrape::page::Page;
///
/// let doc = dom::parse("<html><head><title>Chat</title></head><body><p>Hello</p></body></html>");
/// let page = HtmlPage::new(&doc, "https://claude.ai/chat/1");
/// assert_eq!(page.title(), "Chat");
/// let body = page.body().unwrap();
/// assert_eq!(page.text(body), "Hello");
/// ```
pub struct HtmlPage<'a> {
    doc: &'a Document,
    url: String,
    positions: HashMap<NodeId, usize>,
}

impl<'a> HtmlPage<'a> {
    /// Wraps a parsed document loaded from `url`.
    #[must_use]
    pub fn new(doc: &'a Document, url: impl Into<String>) -> Self {
        let positions = doc
            .select("*")
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect();

        Self {
            doc,
            url: url.into(),
            positions,
        }
    }

    /// Renders the children of `root`. Iterative, so nesting depth is
    /// bounded by memory rather than the call stack.
    fn render_into(&self, root: NodeRef<'a>, in_pre: bool, out: &mut String) {
        let mut stack: Vec<RenderStep<'a>> = Vec::new();
        push_children(&mut stack, root, in_pre);

        while let Some(step) = stack.pop() {
            let (child, in_pre) = match step {
                RenderStep::BlockEnd => {
                    out.push('\n');
                    continue;
                }
                RenderStep::Visit(child, in_pre) => (child, in_pre),
            };

            if child.is_text() {
                let text = child.text();
                if in_pre {
                    out.push_str(&text);
                } else {
                    push_collapsed(out, &text);
                }
                continue;
            }
            if !child.is_element() {
                continue;
            }

            let tag = tag_name(&child);
            if TEXT_SKIP_TAGS.contains(&tag.as_str())
                || !self.is_visible(child)
                || opens_editable_region(&child)
            {
                continue;
            }
            if tag == "br" {
                out.push('\n');
                continue;
            }

            if BLOCK_TAGS.contains(&tag.as_str()) {
                out.push('\n');
                stack.push(RenderStep::BlockEnd);
            }
            push_children(&mut stack, child, in_pre || tag == "pre");
        }
    }

    fn collect_text_nodes(root: NodeRef<'a>, out: &mut Vec<(NodeRef<'a>, String)>) {
        let mut stack: Vec<(NodeRef<'a>, NodeRef<'a>)> = root
            .children()
            .into_iter()
            .rev()
            .map(|child| (root, child))
            .collect();

        while let Some((parent, node)) = stack.pop() {
            if node.is_text() {
                let text = node.text().to_string();
                if !text.trim().is_empty() {
                    out.push((parent, text));
                }
            } else if node.is_element() {
                stack.extend(node.children().into_iter().rev().map(|child| (node, child)));
            }
        }
    }
}

/// Work item for the rendered-text walk.
enum RenderStep<'a> {
    Visit(NodeRef<'a>, bool),
    BlockEnd,
}

/// Queues `node`'s children so they pop in document order.
fn push_children<'a>(stack: &mut Vec<RenderStep<'a>>, node: NodeRef<'a>, in_pre: bool) {
    stack.extend(
        node.children()
            .into_iter()
            .rev()
            .map(|child| RenderStep::Visit(child, in_pre)),
    );
}

impl<'a> Page for HtmlPage<'a> {
    type Node = NodeRef<'a>;

    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> String {
        self.doc
            .select("head title")
            .nodes()
            .first()
            .map(|node| WHITESPACE_NORMALIZE.replace_all(&node.text(), " ").trim().to_string())
            .unwrap_or_default()
    }

    fn body(&self) -> Option<Self::Node> {
        self.doc.select("body").nodes().first().copied()
    }

    fn query_all(&self, scope: Option<Self::Node>, selector: &str) -> Result<Vec<Self::Node>> {
        let matcher =
            Matcher::new(selector).map_err(|_| Error::InvalidSelector(selector.to_string()))?;

        let matched = match scope {
            Some(node) => Selection::from(node).select_matcher(&matcher),
            None => self.doc.select_matcher(&matcher),
        };
        let nodes = matched.nodes().to_vec();
        debug!(selector, count = nodes.len(), "query_all");
        Ok(nodes)
    }

    fn text(&self, node: Self::Node) -> String {
        let mut raw = String::new();
        self.render_into(node, tag_name(&node) == "pre", &mut raw);
        finish_text(&raw)
    }

    fn bounding_top(&self, node: Self::Node) -> Option<f64> {
        node.attr(BOUNDING_TOP_ATTR)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    fn is_editable_region(&self, node: Self::Node) -> bool {
        self.ancestors(node)
            .iter()
            .any(|n| n.is_element() && opens_editable_region(n))
    }

    fn tag_name(&self, node: Self::Node) -> String {
        tag_name(&node)
    }

    fn attr(&self, node: Self::Node, name: &str) -> Option<String> {
        get_attribute(&node, name)
    }

    fn parent(&self, node: Self::Node) -> Option<Self::Node> {
        node.parent().filter(NodeRef::is_element)
    }

    fn position(&self, node: Self::Node) -> usize {
        self.positions.get(&node.id).copied().unwrap_or(usize::MAX)
    }

    fn rendered_size(&self, node: Self::Node) -> Option<(f64, f64)> {
        let mut width = node.attr("width").and_then(|v| parse_px(&v));
        let mut height = node.attr("height").and_then(|v| parse_px(&v));

        if let Some(style) = node.attr("style") {
            for caps in STYLE_DIMENSION.captures_iter(&style) {
                let value = caps[2].parse::<f64>().ok();
                match caps[1].to_ascii_lowercase().as_str() {
                    "width" if width.is_none() => width = value,
                    "height" if height.is_none() => height = value,
                    _ => {}
                }
            }
        }

        // A single known dimension stands in for both.
        match (width, height) {
            (Some(w), Some(h)) => Some((w, h)),
            (Some(w), None) => Some((w, w)),
            (None, Some(h)) => Some((h, h)),
            (None, None) => None,
        }
    }

    fn is_visible(&self, node: Self::Node) -> bool {
        if node.has_attr("hidden") {
            return false;
        }
        if node
            .attr("aria-hidden")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        {
            return false;
        }
        !node.attr("style").is_some_and(|style| HIDDEN_STYLE.is_match(&style))
    }

    fn is_scrollable(&self, node: Self::Node) -> bool {
        if node
            .attr("style")
            .is_some_and(|style| SCROLLABLE_STYLE.is_match(&style))
        {
            return true;
        }
        node.attr("class").is_some_and(|class| {
            class
                .split_whitespace()
                .any(|token| SCROLLABLE_CLASSES.contains(&token))
        })
    }

    fn text_nodes(&self, scope: Self::Node) -> Vec<(Self::Node, String)> {
        let mut out = Vec::new();
        Self::collect_text_nodes(scope, &mut out);
        out
    }
}
