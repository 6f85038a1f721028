//! Conversation extraction pipeline.
//!
//! # Module Structure
//!
//! - `structured`: selector-driven extraction of role-tagged messages
//! - `walker`: text walks and block collection for unstructured pages
//! - `cascade`: orchestration of every strategy, most precise first
//!
//! # Usage
//!
//! ```rust
//! use rs_chatscrape::dom::{self, HtmlPage};
//! use rs_chatscrape::extractor::cascade;
//! use rs_chatscrape::selectors::DynamicSelectorConfig;
//! use rs_chatscrape::Options;
//!
//! let doc = dom::parse(r#"<body><div data-message-author-role="user">hello there</div></body>"#);
//! let page = HtmlPage::new(&doc, "https://chatgpt.com/c/1");
//! let outcome = cascade::run(&page, &Options::default(), &DynamicSelectorConfig::empty());
//! assert!(outcome.is_success());
//! ```

pub mod cascade;
pub mod structured;
pub mod walker;

pub use structured::{extract_structured, extract_with_rules, RoleRule, SelectorRule};
pub use walker::{collect_blocks, find_scroll_container, walk_text};
