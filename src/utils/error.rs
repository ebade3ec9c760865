// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 500 Internal Server Error, 400 Bad Request

    #[error("SEC Rate limit likely exceeded")]
    RateLimited, // 429, or 403 which EDGAR returns for throttled clients

    #[error("Could not find specified filing: {0}")]
    FilingDocNotFound(String),

    #[error("Ticker {0} not found in EDGAR company tickers")]
    TickerNotFound(String),

    #[error("Failed to parse EDGAR response: {0}")]
    Parse(String),

    #[error("Failed to save downloaded filing: {0}")]
    Io(#[from] std::io::Error),
}

impl EdgarError {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EdgarError::Network(_) | EdgarError::RateLimited => true,
            EdgarError::Http(status) => status.is_server_error(),
            _ => false,
        }
    }
}

/// Why a document could not be turned into a tree worth walking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCause {
    #[error("input is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidEncoding { valid_up_to: usize },

    #[error("input is empty")]
    Empty,

    #[error("input contains no markup")]
    NoMarkup,

    #[error("input exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid heading pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Failed to parse {source_id} ({size} bytes): {cause}")]
    Parse {
        source_id: String,
        size: usize,
        cause: ParseCause,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Filing {accession} already exists for company {cik}")]
    FilingExists { cik: String, accession: String },

    #[error("Company {0} not found")]
    CompanyNotFound(String),

    #[error("Filing {accession} not found for company {cik}")]
    FilingNotFound { cik: String, accession: String },

    #[error("Invalid record key: {0:?}")]
    InvalidKey(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError), // Automatically convert Edgar errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}
