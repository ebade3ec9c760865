// src/config.rs
use crate::edgar::client::EdgarConfig;
use crate::extractors::{ExtractorConfig, HeadingRule};
use crate::utils::AppError;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_WAREHOUSE_DIR: &str = "warehouse";

/// Env vars consulted for the EDGAR User-Agent, in order.
pub const USER_AGENT_VARS: &[&str] = &["EDGAR_USER_AGENT", "USER_AGENT_EMAIL"];

/// Runtime configuration assembled from CLI arguments, env vars and `.env`.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where downloaded filings and `*_parsed.json` outputs go.
    pub data_dir: PathBuf,
    pub warehouse_dir: PathBuf,
    pub user_agent: Option<String>,
    pub extractor: ExtractorConfig,
    pub debug: bool,
}

impl Settings {
    /// EDGAR settings; only commands that touch the network need these.
    pub fn edgar_config(&self) -> Result<EdgarConfig, AppError> {
        let user_agent = self.user_agent.clone().ok_or_else(|| {
            AppError::Config(format!(
                "An EDGAR User-Agent is required (--user-agent or one of {})",
                USER_AGENT_VARS.join(", ")
            ))
        })?;
        Ok(EdgarConfig::new(user_agent))
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.data_dir.join("debug")
    }
}

/// Picks the CLI value when given, otherwise the first non-empty env var from `lookup`.
pub fn resolve_user_agent<F>(cli_value: Option<String>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    cli_value
        .into_iter()
        .chain(USER_AGENT_VARS.iter().filter_map(|var| lookup(*var)))
        .map(|ua| ua.trim().to_string())
        .find(|ua| !ua.is_empty())
}

/// Builds the extractor configuration from optional overrides.
pub fn extractor_config(
    heading_pattern: Option<&str>,
    heading_tags: Option<&[String]>,
    collapse_whitespace: bool,
    max_input_bytes: Option<usize>,
) -> Result<ExtractorConfig, AppError> {
    let mut headings = HeadingRule::default();
    if let Some(pattern) = heading_pattern {
        headings = headings.with_pattern(pattern)?;
    }
    if let Some(tags) = heading_tags {
        if tags.iter().all(|t| t.trim().is_empty()) {
            return Err(AppError::Config("--heading-tags needs at least one tag".to_string()));
        }
        headings = headings.with_tags(tags);
    }

    tracing::debug!(
        "Heading pattern '{}' on tags {:?}",
        headings.pattern(),
        headings.tags()
    );
    Ok(ExtractorConfig {
        headings,
        collapse_whitespace,
        max_input_bytes,
    })
}
