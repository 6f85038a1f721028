//! Page accessor seam.
//!
//! The extraction pipeline never touches a concrete DOM. It reads pages
//! through [`Page`], which [`crate::dom::HtmlPage`] implements over a parsed
//! HTML snapshot and which tests (or a live-browser bridge) can implement
//! over anything else that can answer these questions. Implementations are
//! read-only views: nothing here mutates the page.

use crate::error::Result;

/// Read-only view of a rendered page.
pub trait Page {
    /// Cheap handle to an element.
    type Node: Copy;

    /// URL of the page as loaded.
    fn url(&self) -> &str;

    /// Document title, trimmed.
    fn title(&self) -> String;

    /// The `<body>` element, if the document has one.
    fn body(&self) -> Option<Self::Node>;

    /// All elements matching `selector` under `scope` (or the whole
    /// document), in document order.
    ///
    /// A selector that cannot be parsed is `Err(Error::InvalidSelector)`.
    fn query_all(&self, scope: Option<Self::Node>, selector: &str) -> Result<Vec<Self::Node>>;

    /// Rendered text of an element: hidden elements, scripts and editable
    /// regions contribute nothing, block elements break lines.
    fn text(&self, node: Self::Node) -> String;

    /// Top edge of the element's bounding box, or `None` when the page
    /// has no layout for it.
    fn bounding_top(&self, node: Self::Node) -> Option<f64>;

    /// Whether the element is, or sits inside, an editable input region.
    fn is_editable_region(&self, node: Self::Node) -> bool;

    /// Lowercase tag name.
    fn tag_name(&self, node: Self::Node) -> String;

    /// Attribute value.
    fn attr(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Parent element.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Stable document-order index of the element.
    fn position(&self, node: Self::Node) -> usize;

    /// Rendered `(width, height)` in px, when known.
    fn rendered_size(&self, node: Self::Node) -> Option<(f64, f64)>;

    /// Whether the element itself is displayed (ancestors not considered).
    fn is_visible(&self, node: Self::Node) -> bool;

    /// Whether the element scrolls its overflow.
    fn is_scrollable(&self, node: Self::Node) -> bool;

    /// Every non-empty text node under `scope`, in document order, paired
    /// with its parent element.
    fn text_nodes(&self, scope: Self::Node) -> Vec<(Self::Node, String)>;

    /// The element and its ancestors, nearest first.
    fn ancestors(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut chain = vec![node];
        let mut current = self.parent(node);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent(parent);
        }
        chain
    }

    /// Whether `node` is `ancestor` or lies beneath it.
    fn is_within(&self, node: Self::Node, ancestor: Self::Node) -> bool {
        let target = self.position(ancestor);
        self.ancestors(node)
            .into_iter()
            .any(|n| self.position(n) == target)
    }
}
