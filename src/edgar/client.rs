// src/edgar/client.rs
use crate::edgar::models::{normalize_ticker, CompanyTicker, CompanyTickerEntry};
use crate::utils::error::EdgarError;
use reqwest::header;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const SEC_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
// SEC asks for 10 requests/second max. Be conservative. >100ms delay.
const EDGAR_REQUEST_DELAY_MS: u64 = 150;

/// Exponential backoff: wait `multiplier * 2^(attempt-1)`, clamped to `[min_wait, max_wait]`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_wait: Duration::from_secs(4),
            max_wait: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping. Handy for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    /// How long to wait after failed attempt number `attempt` (1-based).
    pub fn wait_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.multiplier
            .saturating_mul(factor)
            .max(self.min_wait)
            .min(self.max_wait)
    }
}

/// Everything the client needs to talk to EDGAR politely.
#[derive(Debug, Clone)]
pub struct EdgarConfig {
    /// SEC requires a descriptive User-Agent with contact details.
    pub user_agent: String,
    pub tickers_url: String,
    pub request_delay: Duration,
    pub retry: RetryPolicy,
}

impl EdgarConfig {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            tickers_url: SEC_TICKERS_URL.to_string(),
            request_delay: Duration::from_millis(EDGAR_REQUEST_DELAY_MS),
            retry: RetryPolicy::default(),
        }
    }
}

/// EDGAR HTTP client with User-Agent, politeness delay and retry/backoff.
#[derive(Debug, Clone)]
pub struct EdgarClient {
    http: reqwest::Client,
    config: EdgarConfig,
}

impl EdgarClient {
    pub fn new(config: EdgarConfig) -> Result<Self, EdgarError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str()) // Set the required User-Agent
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &EdgarConfig {
        &self.config
    }

    /// Gets the CIK (Central Index Key) and company name for a ticker symbol
    pub async fn cik_ticker(&self, ticker: &str) -> Result<CompanyTicker, EdgarError> {
        let ticker = normalize_ticker(ticker);
        let body = self.fetch_text(&self.config.tickers_url).await?;

        let companies: HashMap<String, CompanyTickerEntry> = serde_json::from_str(&body)
            .map_err(|e| EdgarError::Parse(format!("Invalid company tickers JSON: {}", e)))?;

        let company = companies
            .into_values()
            .find(|entry| entry.ticker.to_uppercase() == ticker)
            .map(CompanyTicker::from)
            .ok_or_else(|| EdgarError::TickerNotFound(ticker.clone()))?;

        tracing::info!("Resolved ticker {} to CIK {} ({})", ticker, company.cik, company.name);
        Ok(company)
    }

    /// Downloads a specific filing document from its URL.
    pub async fn download_filing(&self, url: &str) -> Result<String, EdgarError> {
        tracing::info!("Downloading document from: {}", url);
        let body = self.fetch_text(url).await?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }

    /// Downloads a filing and keeps a copy at `save_path`.
    pub async fn download_filing_to(&self, url: &str, save_path: &Path) -> Result<String, EdgarError> {
        let body = self.download_filing(url).await?;
        if let Some(parent) = save_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(save_path, &body).await?;
        tracing::info!("Downloaded filing from {} to {}", url, save_path.display());
        Ok(body)
    }

    /// GET with retry on rate limiting, server errors and transport failures.
    async fn fetch_text(&self, url: &str) -> Result<String, EdgarError> {
        let policy = &self.config.retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_text_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff = policy.wait_for(attempt);
                    tracing::warn!(
                        "Request to {} failed (attempt {}/{}): {}. Backing off {:.1}s",
                        url,
                        attempt,
                        max_attempts,
                        e,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Request to {} failed after {} attempt(s): {}", url, attempt, e);
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_text_once(&self, url: &str) -> Result<String, EdgarError> {
        // --- Basic Rate Limiting ---
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }

        let response = self
            .http
            .get(url)
            // SEC uses various content types, but often text/html for filings
            .header(header::ACCEPT, "application/json,text/html,text/plain,*/*")
            .send()
            .await?; // Propagates reqwest::Error as EdgarError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(EdgarError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EdgarError::FilingDocNotFound(url.to_string()));
            }
            return Err(EdgarError::Http(status));
        }

        Ok(response.text().await?)
    }
}
