// src/ingest.rs
//
// Glue between the EDGAR client, the extractor and the warehouse.

use crate::edgar::client::EdgarClient;
use crate::edgar::models::{document_stem, format_cik, FilingRef};
use crate::extractors::{FilingExtract, FilingExtractor};
use crate::storage::{save_extract_json, Company, Filing, NewFiling, StoredCounts, Warehouse};
use crate::utils::error::StorageError;
use crate::utils::html_debug::write_annotated_filing;
use crate::utils::AppError;
use std::path::{Path, PathBuf};

/// Form type recorded for filings ingested from a raw HTM document.
pub const HTM_FORM_TYPE: &str = "HTM";

#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub url: String,
    pub ticker: Option<String>,
    pub cik: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub company: Company,
    pub company_created: bool,
    pub filing: Filing,
    pub stored: StoredCounts,
    pub extract: FilingExtract,
}

/// A filing extracted to `<stem>_parsed.json`.
#[derive(Debug, Clone)]
pub struct ProcessedFiling {
    pub source: PathBuf,
    pub output: PathBuf,
    pub extract: FilingExtract,
}

/// Downloads `url` into `data_dir`, extracts it and writes the parsed JSON beside it.
pub async fn process_htm(
    client: &EdgarClient,
    extractor: &FilingExtractor,
    data_dir: &Path,
    url: &str,
) -> Result<ProcessedFiling, AppError> {
    let filing = FilingRef::from_url(url)?;
    let save_path = data_dir.join(&filing.file_name);
    let html = client.download_filing_to(url, &save_path).await?;

    let extract = extractor.extract(&html, &filing.file_name)?;
    warn_if_sparse(&filing.file_name, &extract);

    let output = save_extract_json(&parsed_output_path(data_dir, &filing.file_name), &extract)?;
    Ok(ProcessedFiling {
        source: save_path,
        output,
        extract,
    })
}

/// Extracts a filing already on disk; output goes next to it unless `output_dir` is given.
pub fn process_local(
    extractor: &FilingExtractor,
    path: &Path,
    output_dir: Option<&Path>,
) -> Result<ProcessedFiling, AppError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Config(format!("Not a file path: {}", path.display())))?;
    let raw = std::fs::read(path)?;

    let extract = extractor.extract_bytes(&raw, file_name)?;
    warn_if_sparse(file_name, &extract);

    let dir = output_dir
        .or_else(|| path.parent())
        .unwrap_or_else(|| Path::new("."));
    let output = save_extract_json(&parsed_output_path(dir, file_name), &extract)?;
    Ok(ProcessedFiling {
        source: path.to_path_buf(),
        output,
        extract,
    })
}

/// `<dir>/<stem>_parsed.json`
pub fn parsed_output_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(format!("{}_parsed.json", document_stem(file_name)))
}

/// Company identity for a request: (cik, ticker, name).
/// Without a CIK the ticker is resolved through EDGAR; with one, the name falls back to ticker or CIK.
pub async fn resolve_company(
    client: &EdgarClient,
    request: &IngestRequest,
) -> Result<(String, Option<String>, String), AppError> {
    let ticker = request
        .ticker
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let cik = request.cik.as_deref().map(str::trim).filter(|c| !c.is_empty());

    match (cik, ticker) {
        (Some(cik), ticker) => {
            let cik = normalize_cik(cik);
            let name = ticker.map(str::to_string).unwrap_or_else(|| cik.clone());
            Ok((cik, ticker.map(str::to_string), name))
        }
        (None, Some(ticker)) => {
            let company = client.cik_ticker(ticker).await?;
            Ok((company.cik, Some(ticker.to_string()), company.name))
        }
        (None, None) => Err(AppError::Config("Provide either --ticker or --cik".to_string())),
    }
}

/// Numeric CIKs are zero-padded to ten digits so they key the warehouse consistently.
pub fn normalize_cik(cik: &str) -> String {
    cik.parse::<u64>().map(format_cik).unwrap_or_else(|_| cik.to_string())
}

/// Resolves the company, downloads and extracts the filing, then records it with its
/// sections and tables.
pub async fn ingest_htm(
    client: &EdgarClient,
    extractor: &FilingExtractor,
    warehouse: &Warehouse,
    data_dir: &Path,
    request: &IngestRequest,
) -> Result<IngestReport, AppError> {
    let filing_ref = FilingRef::from_url(&request.url)?;
    let (cik, ticker, name) = resolve_company(client, request).await?;
    let (company, company_created) = warehouse.get_or_create_company(&cik, ticker.as_deref(), &name)?;

    if warehouse.filing(&company.cik, &filing_ref.accession_number).is_ok() {
        return Err(StorageError::FilingExists {
            cik: company.cik,
            accession: filing_ref.accession_number,
        }
        .into());
    }

    let save_path = data_dir.join(&filing_ref.file_name);
    let html = client.download_filing_to(&request.url, &save_path).await?;
    let extract = extractor.extract(&html, &filing_ref.file_name)?;
    warn_if_sparse(&filing_ref.file_name, &extract);

    let filing = warehouse.create_filing(
        &company,
        NewFiling {
            accession_number: filing_ref.accession_number.clone(),
            form_type: HTM_FORM_TYPE.to_string(),
            url: Some(request.url.clone()),
            local_path: Some(save_path.display().to_string()),
            metadata: serde_json::json!({"source": "HTM-ingest"}),
            ..NewFiling::default()
        },
    )?;
    let stored = warehouse.store_extract(&filing, &extract)?;

    tracing::info!(
        "Ingested filing {} for company {} ({})",
        filing_ref.file_name,
        company.cik,
        company.name
    );
    Ok(IngestReport {
        company,
        company_created,
        filing,
        stored,
        extract,
    })
}

/// Writes `<debug_dir>/<stem>_annotated.html` for a filing saved at `html_path`.
pub fn annotate_saved_filing(
    html_path: &Path,
    extract: &FilingExtract,
    debug_dir: &Path,
) -> Result<PathBuf, AppError> {
    let html = std::fs::read_to_string(html_path)?;
    let stem = html_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(document_stem)
        .unwrap_or("filing");
    let labels = extract.sections.keys().map(String::as_str);
    write_annotated_filing(&html, labels, &debug_dir.join(format!("{}_annotated.html", stem)))
}

// Empty results are legitimate outcomes, just worth a look.
fn warn_if_sparse(source_id: &str, extract: &FilingExtract) {
    if extract.sections.is_empty() {
        tracing::warn!("No 'Item N.' sections found in {}", source_id);
    }
    if extract.tables.is_empty() {
        tracing::warn!("No tables found in {}", source_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::client::{EdgarConfig, RetryPolicy};
    use crate::utils::error::{EdgarError, ExtractError};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FILING_HTML: &str = "<html><body>\
        <p>VALMONT INDUSTRIES, INC.</p>\
        <div>Item 1. Business</div><p>Engineered support structures.</p>\
        <table><tr><td></td><td></td></tr><tr><td>Net sales</td><td>4,345.2</td></tr></table>\
        <div>Item 1A. Risk Factors</div><p>Steel prices.</p>\
        </body></html>";

    fn client_for(server: &MockServer) -> EdgarClient {
        EdgarClient::new(EdgarConfig {
            tickers_url: format!("{}/files/company_tickers.json", server.uri()),
            request_delay: Duration::ZERO,
            retry: RetryPolicy::immediate(2),
            ..EdgarConfig::new("Filing Warehouse ops@example.com")
        })
        .unwrap()
    }

    async fn serve(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn serve_tickers(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "0": {"cik_str": 106640, "ticker": "VMI", "title": "VALMONT INDUSTRIES INC"}
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn ingest_by_ticker_stores_everything() {
        let server = MockServer::start().await;
        serve_tickers(&server, 1).await;
        serve(&server, "/Archives/vmi-20231230.htm", FILING_HTML).await;

        let dir = tempfile::tempdir().unwrap();
        let warehouse = Warehouse::open(dir.path().join("warehouse")).unwrap();
        let request = IngestRequest {
            url: format!("{}/Archives/vmi-20231230.htm", server.uri()),
            ticker: Some("vmi".to_string()),
            cik: None,
        };

        let report = ingest_htm(
            &client_for(&server),
            &FilingExtractor::new(),
            &warehouse,
            &dir.path().join("data"),
            &request,
        )
        .await
        .unwrap();

        assert!(report.company_created);
        assert_eq!(report.company.cik, "0000106640");
        assert_eq!(report.company.name, "VALMONT INDUSTRIES INC");
        assert_eq!(report.filing.accession_number, "vmi-20231230");
        assert_eq!(report.filing.form_type, "HTM");
        assert_eq!(report.stored, StoredCounts { sections: 2, tables: 1 });
        assert!(dir.path().join("data").join("vmi-20231230.htm").exists());

        let sections = warehouse.sections("0000106640", "vmi-20231230").unwrap();
        assert_eq!(sections[0].name, "Item 1. Business");
        assert_eq!(sections[0].content, "Engineered support structures.\nNet sales4,345.2\n");
        let tables = warehouse.tables("0000106640", "vmi-20231230").unwrap();
        assert_eq!(tables[0].data, vec![vec!["Net sales".to_string(), "4,345.2".to_string()]]);
    }

    #[tokio::test]
    async fn ingest_by_cik_skips_ticker_lookup() {
        let server = MockServer::start().await;
        serve_tickers(&server, 0).await;
        serve(&server, "/vmi.htm", FILING_HTML).await;

        let dir = tempfile::tempdir().unwrap();
        let warehouse = Warehouse::open(dir.path().join("warehouse")).unwrap();
        let request = IngestRequest {
            url: format!("{}/vmi.htm", server.uri()),
            ticker: None,
            cik: Some("106640".to_string()),
        };

        let report = ingest_htm(
            &client_for(&server),
            &FilingExtractor::new(),
            &warehouse,
            dir.path(),
            &request,
        )
        .await
        .unwrap();
        assert_eq!(report.company.cik, "0000106640");
        assert_eq!(report.company.name, "0000106640");
        assert_eq!(report.company.ticker, None);
    }

    #[tokio::test]
    async fn second_ingest_of_same_filing_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vmi.htm"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FILING_HTML))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let warehouse = Warehouse::open(dir.path().join("warehouse")).unwrap();
        let client = client_for(&server);
        let extractor = FilingExtractor::new();
        let request = IngestRequest {
            url: format!("{}/vmi.htm", server.uri()),
            ticker: Some("VMI".to_string()),
            cik: Some("0000106640".to_string()),
        };

        ingest_htm(&client, &extractor, &warehouse, dir.path(), &request).await.unwrap();
        let err = ingest_htm(&client, &extractor, &warehouse, dir.path(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::FilingExists { .. })));
    }

    #[tokio::test]
    async fn unparseable_filing_is_not_recorded() {
        let server = MockServer::start().await;
        serve(&server, "/notes.htm", "plain text, no markup at all").await;

        let dir = tempfile::tempdir().unwrap();
        let warehouse = Warehouse::open(dir.path().join("warehouse")).unwrap();
        let request = IngestRequest {
            url: format!("{}/notes.htm", server.uri()),
            ticker: None,
            cik: Some("0000000042".to_string()),
        };

        let err = ingest_htm(
            &client_for(&server),
            &FilingExtractor::new(),
            &warehouse,
            dir.path(),
            &request,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractError::Parse { ref source_id, .. }) if source_id == "notes.htm"
        ));
        assert!(warehouse.filing("0000000042", "notes").is_err());
    }

    #[tokio::test]
    async fn download_failures_surface_as_edgar_errors() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let warehouse = Warehouse::open(dir.path().join("warehouse")).unwrap();
        let request = IngestRequest {
            url: format!("{}/missing.htm", server.uri()),
            ticker: None,
            cik: Some("42".to_string()),
        };

        let err = ingest_htm(
            &client_for(&server),
            &FilingExtractor::new(),
            &warehouse,
            dir.path(),
            &request,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Edgar(EdgarError::FilingDocNotFound(_))));
    }

    #[tokio::test]
    async fn missing_identity_is_a_config_error() {
        let server = MockServer::start().await;
        let request = IngestRequest {
            url: format!("{}/x.htm", server.uri()),
            ticker: Some("  ".to_string()),
            cik: None,
        };
        let err = resolve_company(&client_for(&server), &request).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn process_htm_writes_parsed_json() {
        let server = MockServer::start().await;
        serve(&server, "/aapl-20230930.htm", FILING_HTML).await;

        let dir = tempfile::tempdir().unwrap();
        let processed = process_htm(
            &client_for(&server),
            &FilingExtractor::new(),
            dir.path(),
            &format!("{}/aapl-20230930.htm", server.uri()),
        )
        .await
        .unwrap();

        assert_eq!(processed.output, dir.path().join("aapl-20230930_parsed.json"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&processed.output).unwrap()).unwrap();
        assert_eq!(json["sections"]["Item 1A. Risk Factors"], "Steel prices.\n");
        assert_eq!(json["tables"], serde_json::json!([[["Net sales", "4,345.2"]]]));
    }

    #[test]
    fn process_local_and_annotate() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("vmi-10k.htm");
        std::fs::write(&source, FILING_HTML).unwrap();

        let processed = process_local(&FilingExtractor::new(), &source, None).unwrap();
        assert_eq!(processed.output, dir.path().join("vmi-10k_parsed.json"));
        assert_eq!(processed.extract.sections.len(), 2);

        let annotated = annotate_saved_filing(&source, &processed.extract, &dir.path().join("debug")).unwrap();
        assert_eq!(annotated, dir.path().join("debug").join("vmi-10k_annotated.html"));
        let html = std::fs::read_to_string(annotated).unwrap();
        assert!(html.contains(">Item 1A. Risk Factors</span>"));
    }

    #[test]
    fn cik_normalization() {
        assert_eq!(normalize_cik("320193"), "0000320193");
        assert_eq!(normalize_cik("0000320193"), "0000320193");
        assert_eq!(normalize_cik("CIK-X"), "CIK-X");
    }
}
