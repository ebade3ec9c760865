// src/extractors/filing.rs

use crate::extractors::heading::HeadingRule;
use crate::extractors::node::has_markup;
use crate::extractors::section::segment_sections;
use crate::extractors::table::{extract_tables, ExtractedTable};
use crate::utils::error::{ExtractError, ParseCause};
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Knobs for the extractor. The defaults reproduce the plain "Item N." heuristic.
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    pub headings: HeadingRule,
    /// Fold whitespace runs (including `&nbsp;`) to single spaces in labels, bodies and cells.
    pub collapse_whitespace: bool,
    /// Reject inputs larger than this many bytes.
    pub max_input_bytes: Option<usize>,
}

/// What one filing yields: sections keyed by heading label, and tables in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingExtract {
    pub sections: BTreeMap<String, String>,
    pub tables: Vec<ExtractedTable>,
}

impl FilingExtract {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.tables.is_empty()
    }
}

/// Stateless HTM extractor; share one instance across threads freely.
#[derive(Debug, Clone, Default)]
pub struct FilingExtractor {
    config: ExtractorConfig,
}

impl FilingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Decodes `raw` as UTF-8 and extracts it.
    pub fn extract_bytes(&self, raw: &[u8], source_id: &str) -> Result<FilingExtract, ExtractError> {
        let text = std::str::from_utf8(raw).map_err(|e| ExtractError::Parse {
            source_id: source_id.to_string(),
            size: raw.len(),
            cause: ParseCause::InvalidEncoding {
                valid_up_to: e.valid_up_to(),
            },
        })?;
        self.extract(text, source_id)
    }

    /// Extracts sections and tables from already-decoded markup.
    pub fn extract(&self, raw: &str, source_id: &str) -> Result<FilingExtract, ExtractError> {
        let parse_error = |cause| ExtractError::Parse {
            source_id: source_id.to_string(),
            size: raw.len(),
            cause,
        };

        if let Some(limit) = self.config.max_input_bytes {
            if raw.len() > limit {
                return Err(parse_error(ParseCause::TooLarge { limit }));
            }
        }
        if raw.trim().is_empty() {
            return Err(parse_error(ParseCause::Empty));
        }

        if !has_markup(raw) {
            return Err(parse_error(ParseCause::NoMarkup));
        }
        let document = Html::parse_document(raw);
        if !document.errors.is_empty() {
            tracing::trace!(
                "{}: parser recovered from {} markup errors",
                source_id,
                document.errors.len()
            );
        }

        let found = segment_sections(&document, &self.config);
        let heading_count = found.len();
        let mut sections = BTreeMap::new();
        for section in found {
            if let Some(previous) = sections.insert(section.label.clone(), section.body) {
                tracing::debug!(
                    "{}: heading '{}' repeated, dropping earlier body ({} bytes)",
                    source_id,
                    section.label,
                    previous.len()
                );
            }
        }

        let tables = extract_tables(&document, self.config.collapse_whitespace);

        tracing::info!(
            source_id,
            headings = heading_count,
            sections = sections.len(),
            tables = tables.len(),
            "Extracted filing"
        );

        Ok(FilingExtract { sections, tables })
    }
}

/// Extracts with the default configuration.
pub fn extract(raw: &str, source_id: &str) -> Result<FilingExtract, ExtractError> {
    FilingExtractor::new().extract(raw, source_id)
}

/// Byte-oriented variant of [`extract`].
pub fn extract_bytes(raw: &[u8], source_id: &str) -> Result<FilingExtract, ExtractError> {
    FilingExtractor::new().extract_bytes(raw, source_id)
}
