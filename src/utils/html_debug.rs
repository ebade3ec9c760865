// src/utils/html_debug.rs
use crate::utils::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static TABLE_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<table\b[^>]*>").expect("Failed to compile TABLE_OPEN_RE"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Highlight {
    Heading,
    Table,
}

impl Highlight {
    fn css_class(self) -> &'static str {
        match self {
            Highlight::Heading => "highlight-heading",
            Highlight::Table => "highlight-table",
        }
    }
}

/// Copy of `html` with each detected heading label and each `<table>` tag highlighted.
/// Overlapping matches keep the earliest one.
pub fn annotate_filing<'a, I>(html: &str, labels: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut highlights: Vec<(usize, usize, Highlight)> = Vec::new();
    for label in labels.into_iter().filter(|l| !l.is_empty()) {
        highlights.extend(
            html.match_indices(label)
                .map(|(start, m)| (start, start + m.len(), Highlight::Heading)),
        );
    }
    highlights.extend(
        TABLE_OPEN_RE
            .find_iter(html)
            .map(|m| (m.start(), m.end(), Highlight::Table)),
    );
    highlights.sort_by_key(|h| (h.0, h.1));

    // Add debug styling in head
    let mut out = String::with_capacity(html.len() + 256);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    out.push_str(".highlight-heading { background-color: #90EE90; }\n");
    out.push_str(".highlight-table { outline: 2px solid #FFA500; }\n");
    out.push_str("</style>\n</head>\n<body>\n");

    let mut last_pos = 0;
    for (start, end, kind) in highlights {
        if start < last_pos {
            continue; // overlaps the previous highlight
        }
        out.push_str(&html[last_pos..start]);
        match kind {
            Highlight::Heading => {
                out.push_str(&format!(
                    "<span class=\"{}\" title=\"Position: {}-{}\">",
                    kind.css_class(),
                    start,
                    end
                ));
                out.push_str(&html[start..end]);
                out.push_str("</span>");
            }
            // Spans can't wrap a bare opening tag; mark the table itself instead.
            Highlight::Table => {
                out.push_str(&format!(
                    "<span class=\"{}\" title=\"Position: {}-{}\"></span>",
                    kind.css_class(),
                    start,
                    end
                ));
                out.push_str(&html[start..end]);
            }
        }
        last_pos = end;
    }
    out.push_str(&html[last_pos..]);
    out.push_str("\n</body>\n</html>");
    out
}

/// Writes [`annotate_filing`] output to `path`, creating parent directories.
pub fn write_annotated_filing<'a, I>(html: &str, labels: I, path: &Path) -> Result<PathBuf, AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, annotate_filing(html, labels))?;
    tracing::info!("Saved debug HTML to {}", path.display());
    Ok(path.to_path_buf())
}
