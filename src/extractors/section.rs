// src/extractors/section.rs

// --- Imports ---
use crate::extractors::filing::ExtractorConfig;
use crate::extractors::node::{normalize_text, FilingNode};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

// --- Data Structures ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub label: String, // e.g., "Item 1A. Risk Factors"
    pub body: String,  // trimmed sibling texts, each followed by '\n'
}

/// Every heading element in document order, paired with its label.
pub fn find_headings<'a>(document: &'a Html, config: &ExtractorConfig) -> Vec<(ElementRef<'a>, String)> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|element| {
            config
                .headings
                .detect(&FilingNode::Element(element), config.collapse_whitespace)
                .map(|label| (element, label))
        })
        .collect()
}

/// Splits the document into sections, one per heading, in document order.
/// Labels may repeat here; folding into a map is the caller's decision.
pub fn segment_sections(document: &Html, config: &ExtractorConfig) -> Vec<ExtractedSection> {
    find_headings(document, config)
        .into_iter()
        .map(|(heading, label)| {
            let body = collect_body(heading, config);
            tracing::debug!("Section '{}' collected {} bytes", label, body.len());
            ExtractedSection { label, body }
        })
        .collect()
}

/// Walks the heading's following siblings until the next heading.
fn collect_body(heading: ElementRef<'_>, config: &ExtractorConfig) -> String {
    let mut body = String::new();

    for node in heading.next_siblings() {
        let sibling = FilingNode::from_parts(ElementRef::wrap(node), node.value());

        if config
            .headings
            .detect(&sibling, config.collapse_whitespace)
            .is_some()
        {
            break; // next section starts here
        }

        let Some(text) = sibling.text() else {
            continue; // comments and friends carry nothing
        };
        let text = normalize_text(&text, config.collapse_whitespace);
        if !text.is_empty() {
            body.push_str(&text);
            body.push('\n');
        }
    }

    body
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::heading::HeadingRule;

    fn sections(html: &str) -> Vec<ExtractedSection> {
        segment_sections(&Html::parse_document(html), &ExtractorConfig::default())
    }

    fn section(label: &str, body: &str) -> ExtractedSection {
        ExtractedSection {
            label: label.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn splits_on_consecutive_item_headings() {
        let got = sections(
            "<div>Item 1. Business</div><p>We make widgets.</p>\
             <div>Item 1A. Risk Factors</div><p>Widgets may fail.</p>",
        );
        assert_eq!(
            got,
            vec![
                section("Item 1. Business", "We make widgets.\n"),
                section("Item 1A. Risk Factors", "Widgets may fail.\n"),
            ]
        );
    }

    #[test]
    fn body_runs_to_end_of_siblings() {
        let got = sections(
            "<p>Item 7. MD&amp;A</p><p>Revenue grew.</p><span>Margins held.</span>loose text<!-- skip -->",
        );
        assert_eq!(
            got,
            vec![section("Item 7. MD&A", "Revenue grew.\nMargins held.\nloose text\n")]
        );
    }

    #[test]
    fn whitespace_only_siblings_contribute_nothing() {
        let got = sections("<div>Item 2. Properties</div>\n   \n<p>  </p><p>Offices.</p>\n");
        assert_eq!(got, vec![section("Item 2. Properties", "Offices.\n")]);
    }

    #[test]
    fn text_before_first_heading_is_dropped() {
        let got = sections("<p>Cover page</p><p>Table of contents</p><div>Item 1. Business</div><p>Body</p>");
        assert_eq!(got, vec![section("Item 1. Business", "Body\n")]);
        assert!(sections("<p>Cover page</p><p>Nothing else</p>").is_empty());
    }

    #[test]
    fn non_eligible_siblings_do_not_end_a_section() {
        let got = sections("<div>Item 1. Business</div><h2>Item 2. Properties</h2><p>More.</p>");
        assert_eq!(
            got,
            vec![section("Item 1. Business", "Item 2. Properties\nMore.\n")]
        );
    }

    #[test]
    fn out_of_order_and_duplicate_headings_are_kept() {
        let got = sections(
            "<div>Item 7. MD&amp;A</div><p>a</p><div>Item 1. Business</div><p>b</p><div>Item 7. MD&amp;A</div><p>c</p>",
        );
        let labels: Vec<_> = got.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Item 7. MD&A", "Item 1. Business", "Item 7. MD&A"]);
        assert_eq!(got[2].body, "c\n");
    }

    #[test]
    fn heading_with_no_following_content_has_empty_body() {
        let got = sections("<p>Intro</p><div>Item 9B. Other Information</div>");
        assert_eq!(got, vec![section("Item 9B. Other Information", "")]);
    }

    #[test]
    fn nested_eligible_headings_are_both_detected() {
        let doc = Html::parse_document("<p><b>Item 5. Market</b></p><p>Shares trade.</p>");
        let found = find_headings(&doc, &ExtractorConfig::default());
        let tags: Vec<_> = found.iter().map(|(el, _)| el.value().name()).collect();
        assert_eq!(tags, ["p", "b"]);
    }

    #[test]
    fn custom_rule_changes_what_counts_as_a_heading() {
        let config = ExtractorConfig {
            headings: HeadingRule::new(r"PART [IVX]+", &["h2"]).unwrap(),
            ..ExtractorConfig::default()
        };
        let doc = Html::parse_document(
            "<h2>PART I</h2><div>Item 1. Business</div><h2>PART II</h2><p>Market data</p>",
        );
        let got = segment_sections(&doc, &config);
        assert_eq!(
            got,
            vec![
                section("PART I", "Item 1. Business\n"),
                section("PART II", "Market data\n"),
            ]
        );
    }
}
