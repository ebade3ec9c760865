// src/lib.rs
//! Extracts "Item N." sections and tables from SEC EDGAR HTM filings, with the
//! EDGAR client and JSON warehouse that feed and keep the results.

pub mod config;
pub mod edgar;
pub mod extractors;
pub mod ingest;
pub mod storage;
pub mod utils;

pub use extractors::{extract, extract_bytes, ExtractorConfig, FilingExtract, FilingExtractor};
pub use utils::error::{ExtractError, ParseCause};
