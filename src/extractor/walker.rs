//! Text walking for pages without usable structure.
//!
//! Collects text nodes under a root while skipping anything that is not
//! conversation: scripts and styles, UI controls and their labels, hidden
//! elements, and every editable region. Unsent drafts must never leak into
//! a capture, so the editable check runs for every walk.

use std::collections::HashMap;

use tracing::debug;

use crate::options::Options;
use crate::page::Page;
use crate::patterns::{
    is_ui_label, BLOCK_CONTENT_SELECTOR, EXCLUDED_TAGS, UI_CONTROL_ROLES, WHITESPACE_NORMALIZE,
};

/// Whether an element, or any ancestor, disqualifies its text.
pub fn is_excluded<P: Page>(page: &P, node: P::Node) -> bool {
    if page.is_editable_region(node) {
        return true;
    }
    page.ancestors(node).into_iter().any(|n| {
        let tag = page.tag_name(n);
        if EXCLUDED_TAGS.contains(&tag.as_str()) || !page.is_visible(n) {
            return true;
        }
        page.attr(n, "role").is_some_and(|role| {
            let role = role.trim().to_ascii_lowercase();
            UI_CONTROL_ROLES.contains(&role.as_str())
        })
    })
}

/// Walks every text node under `root` and joins the accepted ones with
/// newlines.
///
/// A node is accepted when its collapsed text is longer than
/// `opts.text_walk_min_chars`, is not a known UI label, and no ancestor is
/// excluded. Consecutive duplicates are dropped.
pub fn walk_text<P: Page>(page: &P, root: P::Node, opts: &Options) -> String {
    let mut verdicts: HashMap<usize, bool> = HashMap::new();
    let mut lines: Vec<String> = Vec::new();

    for (parent, raw) in page.text_nodes(root) {
        let text = WHITESPACE_NORMALIZE.replace_all(raw.trim(), " ").to_string();
        if text.chars().count() <= opts.text_walk_min_chars || is_ui_label(&text) {
            continue;
        }

        let excluded = *verdicts
            .entry(page.position(parent))
            .or_insert_with(|| is_excluded(page, parent));
        if excluded {
            continue;
        }

        if lines.last() == Some(&text) {
            continue;
        }
        lines.push(text);
    }

    debug!(lines = lines.len(), "text walk");
    lines.join("\n")
}

/// The largest visible scrolling container, measured by rendered text.
pub fn find_scroll_container<P: Page>(page: &P) -> Option<P::Node> {
    let all = page.query_all(None, "*").ok()?;
    let mut best: Option<(P::Node, usize)> = None;

    for node in all {
        if !page.is_scrollable(node) || is_excluded(page, node) {
            continue;
        }
        let size = page.text(node).chars().count();
        if size == 0 {
            continue;
        }
        if best.is_none_or(|(_, best_size)| size > best_size) {
            best = Some((node, size));
        }
    }

    best.map(|(node, _)| node)
}

/// Paragraphs, headings and list items longer than `opts.block_min_chars`,
/// joined with blank lines. Blocks nested in an already-taken block are
/// skipped.
pub fn collect_blocks<P: Page>(page: &P, opts: &Options) -> String {
    let Ok(nodes) = page.query_all(None, BLOCK_CONTENT_SELECTOR) else {
        return String::new();
    };

    let mut taken: Vec<P::Node> = Vec::new();
    let mut blocks: Vec<String> = Vec::new();

    for node in nodes {
        if taken.iter().any(|t| page.is_within(node, *t)) || is_excluded(page, node) {
            continue;
        }
        let text = page.text(node);
        if text.chars().count() > opts.block_min_chars {
            taken.push(node);
            blocks.push(text);
        }
    }

    debug!(blocks = blocks.len(), "block fallback");
    blocks.join("\n\n")
}
