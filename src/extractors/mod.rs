// src/extractors/mod.rs
pub mod filing;
pub mod heading;
pub mod node;
pub mod section;
pub mod table;

// Re-export key extraction types for convenience
pub use filing::{extract, extract_bytes, ExtractorConfig, FilingExtract, FilingExtractor};
pub use heading::{HeadingRule, DEFAULT_HEADING_PATTERN, DEFAULT_HEADING_TAGS};
pub use section::ExtractedSection;
pub use table::ExtractedTable;
