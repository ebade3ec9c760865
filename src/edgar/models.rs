// src/edgar/models.rs
use crate::utils::error::EdgarError;
use serde::{Deserialize, Serialize};

/// One entry of https://www.sec.gov/files/company_tickers.json
/// Example: {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTickerEntry {
    pub cik_str: u64,
    pub ticker: String,
    pub title: String,
}

/// Resolved company identity for a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyTicker {
    pub cik: String, // zero-padded to 10 digits
    pub ticker: String,
    pub name: String,
}

impl From<CompanyTickerEntry> for CompanyTicker {
    fn from(entry: CompanyTickerEntry) -> Self {
        Self {
            cik: format_cik(entry.cik_str),
            ticker: entry.ticker,
            name: entry.title,
        }
    }
}

/// EDGAR writes class shares with a dash: "BRK.B" -> "BRK-B".
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase().replace('.', "-")
}

/// Format CIK with leading zeros to 10 digits
pub fn format_cik(cik: u64) -> String {
    format!("{:010}", cik)
}

/// Identity of a filing document derived from its archive URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRef {
    pub url: String,
    pub file_name: String,
    pub accession_number: String,
}

impl FilingRef {
    /// `https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/aapl-20230930.htm`
    /// gives file name `aapl-20230930.htm` and accession `aapl-20230930`.
    pub fn from_url(url: &str) -> Result<Self, EdgarError> {
        let without_query = url.split(['?', '#']).next().unwrap_or_default();
        let file_name = without_query
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && !name.contains(':'))
            .ok_or_else(|| EdgarError::Parse(format!("No document name in URL {}", url)))?
            .to_string();

        Ok(Self {
            url: url.to_string(),
            accession_number: document_stem(&file_name).to_string(),
            file_name,
        })
    }
}

/// File name without its `.htm` / `.html` extension.
pub fn document_stem(file_name: &str) -> &str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".html") {
        &file_name[..file_name.len() - 5]
    } else if lower.ends_with(".htm") {
        &file_name[..file_name.len() - 4]
    } else {
        file_name
    }
}
