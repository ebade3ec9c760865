// src/extractors/heading.rs

use crate::extractors::node::FilingNode;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;

/// "Item 1.", "Item 1A.", "Item 7." at the very start of a node's text.
pub const DEFAULT_HEADING_PATTERN: &str = r"^Item \d+[A-Za-z]?\.";

/// Tags filings use to style item headings. Anything else is ignored so that
/// incidental "Item N." text deep in unrelated markup doesn't open a section.
pub const DEFAULT_HEADING_TAGS: &[&str] = &["font", "span", "div", "p", "b"];

static DEFAULT_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DEFAULT_HEADING_PATTERN).expect("Failed to compile DEFAULT_HEADING_RE")
});

/// Decides whether a node starts a section, and what the section is called.
#[derive(Debug, Clone)]
pub struct HeadingRule {
    pattern: Regex,
    tags: Vec<String>,
}

impl Default for HeadingRule {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_HEADING_RE.clone(),
            tags: DEFAULT_HEADING_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl HeadingRule {
    /// Builds a rule from a custom pattern. The whole pattern is wrapped as
    /// `^(?:...)`, so every alternative matches only at the start of the text.
    pub fn new<S: AsRef<str>>(pattern: &str, tags: &[S]) -> Result<Self, ExtractError> {
        let anchored = format!("^(?:{})", pattern);
        Ok(Self {
            pattern: Regex::new(&anchored)?,
            tags: tags
                .iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        })
    }

    /// Same tag set, different pattern.
    pub fn with_pattern(self, pattern: &str) -> Result<Self, ExtractError> {
        Self::new(pattern, self.tags.as_slice())
    }

    /// Same pattern, different tag set.
    pub fn with_tags<S: AsRef<str>>(self, tags: &[S]) -> Self {
        Self {
            tags: tags
                .iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            ..self
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_eligible_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    /// Does `text` (already trimmed) read like a heading?
    pub fn matches_text(&self, text: &str) -> bool {
        !text.is_empty() && self.pattern.is_match(text)
    }

    /// Returns the heading label if `node` is an eligible element whose text matches.
    pub fn detect(&self, node: &FilingNode<'_>, collapse_whitespace: bool) -> Option<String> {
        let name = node.tag_name()?;
        if !self.is_eligible_tag(name) {
            return None;
        }
        let label = node.trimmed_text(collapse_whitespace);
        if self.matches_text(&label) {
            tracing::trace!("Heading candidate <{}> matched: '{}'", name, label);
            Some(label)
        } else {
            None
        }
    }
}
