// src/extractors/node.rs
//
// Tree-traversal helpers shared by the heading, section and table passes.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, ElementRef};

static TAG_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z!/?]").expect("Failed to compile TAG_OPEN_RE"));

/// A document node seen through the one capability the extractors care about:
/// whether it can render text.
#[derive(Debug, Clone, Copy)]
pub enum FilingNode<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    Comment(&'a str),
    /// Doctype, processing instruction, document/fragment roots.
    Other,
}

impl<'a> FilingNode<'a> {
    /// Classifies a raw tree node. `element` is `ElementRef::wrap(node)` for the same node.
    pub fn from_parts(element: Option<ElementRef<'a>>, value: &'a Node) -> Self {
        if let Some(el) = element {
            return FilingNode::Element(el);
        }
        match value {
            Node::Text(text) => FilingNode::Text(text),
            Node::Comment(comment) => FilingNode::Comment(comment),
            _ => FilingNode::Other,
        }
    }

    /// Tag name for elements, `None` for everything else.
    pub fn tag_name(&self) -> Option<&'a str> {
        match self {
            FilingNode::Element(el) => Some(el.value().name()),
            _ => None,
        }
    }

    /// Rendered text, or `None` when the node kind has no text to offer.
    pub fn text(&self) -> Option<String> {
        match self {
            FilingNode::Element(el) => Some(el.text().collect()),
            FilingNode::Text(text) => Some((*text).to_string()),
            FilingNode::Comment(_) | FilingNode::Other => None,
        }
    }

    /// Trimmed rendered text; nodes without text yield an empty string.
    pub fn trimmed_text(&self, collapse_whitespace: bool) -> String {
        self.text()
            .map(|t| normalize_text(&t, collapse_whitespace))
            .unwrap_or_default()
    }
}

/// Trims `text`, optionally folding inner whitespace runs (NBSP included) to one space.
pub fn normalize_text(text: &str, collapse_whitespace: bool) -> String {
    if collapse_whitespace {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        text.trim().to_string()
    }
}

/// Trimmed text of an element.
pub fn element_text(element: ElementRef<'_>, collapse_whitespace: bool) -> String {
    FilingNode::Element(element).trimmed_text(collapse_whitespace)
}

/// True when the input itself contains a tag, comment, doctype or processing
/// instruction. Checked on the raw text so that a scaffold the parser would
/// synthesize anyway is told apart from one the document spells out.
pub fn has_markup(raw: &str) -> bool {
    TAG_OPEN_RE.is_match(raw)
}
