//! Image Collector
//!
//! Gathers image locators from scraped containers and builds the
//! `[Image: ...]` placeholders embedded in message text. Images rendered
//! below the minimum size in either dimension are icons or avatars and are
//! ignored; images of unknown size are kept.

use std::collections::HashSet;

use crate::options::Options;
use crate::page::Page;
use crate::patterns::IMAGE_SELECTOR;
use crate::url_utils::{extract_filename, resolve_source};

/// Raw source of an image element: `src`, `data-src`, then the first
/// `srcset` candidate.
fn raw_source<P: Page>(page: &P, img: P::Node) -> Option<String> {
    ["src", "data-src"]
        .iter()
        .filter_map(|name| page.attr(img, name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .or_else(|| {
            page.attr(img, "srcset").and_then(|srcset| {
                srcset
                    .split(',')
                    .next()
                    .and_then(|candidate| candidate.split_whitespace().next())
                    .map(str::to_string)
            })
        })
}

/// Whether an image is large enough to be content.
#[must_use]
pub fn qualifies<P: Page>(page: &P, img: P::Node, min_size: f64) -> bool {
    match page.rendered_size(img) {
        Some((width, height)) => width >= min_size && height >= min_size,
        None => true,
    }
}

fn content_images<P: Page>(page: &P, root: P::Node, opts: &Options) -> Vec<P::Node> {
    let imgs = page.query_all(Some(root), IMAGE_SELECTOR).unwrap_or_default();
    imgs.into_iter()
        .filter(|img| !page.is_editable_region(*img) && qualifies(page, *img, opts.min_image_size))
        .collect()
}

/// `[Image: <alt>]` or `[Image: <filename>]` for each qualifying image
/// under `root`, in document order.
pub fn placeholders<P: Page>(page: &P, root: P::Node, opts: &Options) -> Vec<String> {
    content_images(page, root, opts)
        .into_iter()
        .filter_map(|img| {
            let alt = page
                .attr(img, "alt")
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty());
            let label = match alt {
                Some(alt) => alt,
                None => {
                    let src = raw_source(page, img)?;
                    if src.starts_with("data:") {
                        "inline image".to_string()
                    } else {
                        let name = extract_filename(&src);
                        if name.is_empty() {
                            return None;
                        }
                        name
                    }
                }
            };
            Some(format!("[Image: {label}]"))
        })
        .collect()
}

/// Collects up to `opts.max_images` deduplicated image locators from the
/// given roots, preserving first-encounter order.
pub fn collect_images<P: Page>(page: &P, roots: &[P::Node], opts: &Options) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for root in roots {
        for img in content_images(page, *root, opts) {
            if out.len() >= opts.max_images {
                return out;
            }
            let Some(src) = raw_source(page, img) else {
                continue;
            };
            let resolved = resolve_source(&src, page.url());
            if resolved.is_empty() || !seen.insert(resolved.clone()) {
                continue;
            }
            out.push(resolved);
        }
    }

    out
}
