// src/main.rs
use clap::{Parser, Subcommand};
use sec_htm_extractor::config::{self, Settings, DEFAULT_DATA_DIR, DEFAULT_WAREHOUSE_DIR};
use sec_htm_extractor::edgar::EdgarClient;
use sec_htm_extractor::extractors::FilingExtractor;
use sec_htm_extractor::ingest::{self, IngestRequest};
use sec_htm_extractor::storage::Warehouse;
use sec_htm_extractor::utils::logging::{self, LogFormat};
use sec_htm_extractor::utils::AppError;
use sec_htm_extractor::FilingExtract;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Command Line Interface for the SEC HTM filing extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory for downloaded filings and parsed JSON output
    #[arg(long, env = "DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    data_dir: PathBuf,

    /// Root directory of the JSON warehouse
    #[arg(long, env = "WAREHOUSE_DIR", default_value = DEFAULT_WAREHOUSE_DIR, global = true)]
    warehouse_dir: PathBuf,

    /// EDGAR User-Agent ("Company Name contact@example.com"); falls back to USER_AGENT_EMAIL
    #[arg(long, env = "EDGAR_USER_AGENT", global = true)]
    user_agent: Option<String>,

    /// Regex a heading's text must start with (default: "^Item \d+[A-Za-z]?\.")
    #[arg(long, global = true)]
    heading_pattern: Option<String>,

    /// Comma-separated tags eligible as headings (default: font,span,div,p,b)
    #[arg(long, value_delimiter = ',', global = true)]
    heading_tags: Option<Vec<String>>,

    /// Fold whitespace runs (including &nbsp;) into single spaces
    #[arg(long, global = true)]
    collapse_whitespace: bool,

    /// Refuse filings larger than this many bytes
    #[arg(long, global = true)]
    max_input_bytes: Option<usize>,

    /// Debug mode - verbose logs and annotated HTML files for debugging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract one filing to <data-dir>/<name>_parsed.json
    ProcessHtm {
        /// URL of the SEC HTM filing to download
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        url: Option<String>,

        /// Filing already on disk
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Download, extract and store a filing in the warehouse
    Ingest {
        /// HTM filing URL
        #[arg(long)]
        url: String,

        /// Company ticker
        #[arg(short, long)]
        ticker: Option<String>,

        /// Company CIK
        #[arg(long)]
        cik: Option<String>,
    },
    /// Resolve a ticker to its CIK and company name
    Lookup {
        #[arg(short, long)]
        ticker: String,
    },
    /// Print stored companies, a company's filings, one filing's records, or one named section
    Show {
        #[arg(long)]
        cik: Option<String>,

        #[arg(long, requires = "cik")]
        accession: Option<String>,

        /// Only sections with this exact name, e.g. "Item 1A. Risk Factors"
        #[arg(long, requires = "accession")]
        section: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Environment (.env) and logging (reads RUST_LOG env var)
    dotenvy::dotenv().ok();
    let args = Args::parse();
    logging::setup_logging(if args.debug { "debug" } else { "info" }, args.log_format);
    tracing::debug!("Starting processing for args: {:?}", args);

    // 2. Settings
    let settings = Settings {
        data_dir: args.data_dir.clone(),
        warehouse_dir: args.warehouse_dir.clone(),
        user_agent: config::resolve_user_agent(args.user_agent.clone(), |var| std::env::var(var).ok()),
        extractor: config::extractor_config(
            args.heading_pattern.as_deref(),
            args.heading_tags.as_deref(),
            args.collapse_whitespace,
            args.max_input_bytes,
        )?,
        debug: args.debug,
    };
    let extractor = FilingExtractor::with_config(settings.extractor.clone());

    // 3. Dispatch
    match args.command {
        Command::ProcessHtm { url, file } => {
            let processed = match (url, file) {
                (_, Some(path)) => ingest::process_local(&extractor, &path, Some(settings.data_dir.as_path()))?,
                (Some(url), None) => {
                    let client = EdgarClient::new(settings.edgar_config()?)?;
                    ingest::process_htm(&client, &extractor, &settings.data_dir, &url).await?
                }
                (None, None) => {
                    return Err(AppError::Config("--url or --file is required for process-htm".to_string()))
                }
            };
            if settings.debug {
                debug_annotate(&settings, &processed.source, &processed.extract);
            }
            tracing::info!(
                "Parsed {} sections and {} tables; saved to {}",
                processed.extract.sections.len(),
                processed.extract.tables.len(),
                processed.output.display()
            );
        }
        Command::Ingest { url, ticker, cik } => {
            let client = EdgarClient::new(settings.edgar_config()?)?;
            let warehouse = Warehouse::open(&settings.warehouse_dir)?;
            let request = IngestRequest { url, ticker, cik };
            let report = ingest::ingest_htm(&client, &extractor, &warehouse, &settings.data_dir, &request).await?;

            if settings.debug {
                if let Some(local) = report.filing.local_path.as_deref() {
                    debug_annotate(&settings, Path::new(local), &report.extract);
                }
            }
            tracing::info!(
                "Ingested filing {} for company {}: {} sections, {} tables",
                report.filing.accession_number,
                report.company.cik,
                report.stored.sections,
                report.stored.tables
            );
        }
        Command::Lookup { ticker } => {
            let client = EdgarClient::new(settings.edgar_config()?)?;
            print_json(&client.cik_ticker(&ticker).await?)?;
        }
        Command::Show { cik, accession, section } => {
            let warehouse = Warehouse::open(&settings.warehouse_dir)?;
            match (cik, accession, section) {
                (None, _, _) => print_json(&warehouse.list_companies()?)?,
                (Some(cik), None, _) => print_json(&warehouse.list_filings(&ingest::normalize_cik(&cik))?)?,
                (Some(cik), Some(accession), Some(name)) => {
                    let cik = ingest::normalize_cik(&cik);
                    print_json(&warehouse.section(&cik, &accession, &name)?)?
                }
                (Some(cik), Some(accession), None) => {
                    let cik = ingest::normalize_cik(&cik);
                    print_json(&serde_json::json!({
                        "filing": warehouse.filing(&cik, &accession)?,
                        "sections": warehouse.sections(&cik, &accession)?,
                        "tables": warehouse.tables(&cik, &accession)?,
                    }))?
                }
            }
        }
    }

    Ok(())
}

fn debug_annotate(settings: &Settings, html_path: &Path, extract: &FilingExtract) {
    match ingest::annotate_saved_filing(html_path, extract, &settings.debug_dir()) {
        Ok(path) => tracing::info!("Created annotated debug HTML: {}", path.display()),
        Err(e) => tracing::warn!("Failed to create debug HTML: {}", e),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
