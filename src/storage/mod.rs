// src/storage/mod.rs
use crate::extractors::FilingExtract;
use crate::utils::error::StorageError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const COMPANIES_DIR: &str = "companies";
const FILINGS_DIR: &str = "filings";
const COMPANY_FILE: &str = "company.json";
const FILING_FILE: &str = "filing.json";
const SECTIONS_FILE: &str = "sections.json";
const TABLES_FILE: &str = "tables.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub cik: String,
    pub ticker: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub profile: CompanyProfile,
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Descriptive company attributes. All optional; records written without them
/// load with empty values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    pub industry: Option<String>,
    pub headquarters: Option<String>,
    pub size: Option<String>,
    pub management: serde_json::Value,
    pub locations: serde_json::Value,
    pub business_units: serde_json::Value,
    pub product_types: serde_json::Value,
    pub extra_attributes: serde_json::Value,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            industry: None,
            headquarters: None,
            size: None,
            management: serde_json::json!({}),
            locations: serde_json::json!([]),
            business_units: serde_json::json!([]),
            product_types: serde_json::json!([]),
            extra_attributes: serde_json::json!({}),
        }
    }
}

/// Fields the caller supplies when registering a filing.
#[derive(Debug, Clone, Default)]
pub struct NewFiling {
    pub accession_number: String,
    pub form_type: String,
    pub filing_date: Option<NaiveDate>,
    pub period_of_report: Option<NaiveDate>,
    pub url: Option<String>,
    pub local_path: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    pub cik: String,
    pub accession_number: String,
    pub form_type: String,
    #[serde(default)]
    pub filing_date: Option<NaiveDate>,
    #[serde(default)]
    pub period_of_report: Option<NaiveDate>,
    pub url: Option<String>,
    pub local_path: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub index: usize,
    pub data: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoredCounts {
    pub sections: usize,
    pub tables: usize,
}

/// File-backed warehouse of companies, filings and their extracted content:
///
/// ```text
/// <base>/companies/<cik>/company.json
/// <base>/companies/<cik>/filings/<accession>/{filing,sections,tables}.json
/// ```
pub struct Warehouse {
    base_dir: PathBuf,
}

impl Warehouse {
    /// Opens (creating if needed) a warehouse rooted at `base_dir`.
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(base_path.join(COMPANIES_DIR))?;
        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn company_dir(&self, cik: &str) -> Result<PathBuf, StorageError> {
        Ok(self.base_dir.join(COMPANIES_DIR).join(record_key(cik)?))
    }

    fn filing_dir(&self, cik: &str, accession: &str) -> Result<PathBuf, StorageError> {
        Ok(self
            .company_dir(cik)?
            .join(FILINGS_DIR)
            .join(record_key(accession)?))
    }

    /// Returns the stored company, or records a new one. The flag is true when created.
    pub fn get_or_create_company(
        &self,
        cik: &str,
        ticker: Option<&str>,
        name: &str,
    ) -> Result<(Company, bool), StorageError> {
        if let Some(existing) = self.company(cik)? {
            return Ok((existing, false));
        }

        let now = Utc::now();
        let company = Company {
            cik: cik.to_string(),
            ticker: ticker.map(str::to_uppercase),
            name: name.to_string(),
            profile: CompanyProfile::default(),
            created_at: now,
            updated_at: now,
        };
        let dir = self.company_dir(cik)?;
        fs::create_dir_all(dir.join(FILINGS_DIR))?;
        write_json(&dir.join(COMPANY_FILE), &company)?;

        tracing::info!("Created company {} ({})", company.cik, company.name);
        Ok((company, true))
    }

    /// Replaces a stored company's profile and bumps `updated_at`.
    pub fn update_company_profile(&self, cik: &str, profile: CompanyProfile) -> Result<Company, StorageError> {
        let mut company = self
            .company(cik)?
            .ok_or_else(|| StorageError::CompanyNotFound(cik.to_string()))?;
        company.profile = profile;
        company.updated_at = Utc::now();
        write_json(&self.company_dir(cik)?.join(COMPANY_FILE), &company)?;

        tracing::info!("Updated profile of company {}", company.cik);
        Ok(company)
    }

    pub fn company(&self, cik: &str) -> Result<Option<Company>, StorageError> {
        read_json(&self.company_dir(cik)?.join(COMPANY_FILE))
    }

    pub fn find_company_by_ticker(&self, ticker: &str) -> Result<Option<Company>, StorageError> {
        Ok(self.list_companies()?.into_iter().find(|c| {
            c.ticker
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(ticker))
        }))
    }

    /// All companies, ordered by name.
    pub fn list_companies(&self) -> Result<Vec<Company>, StorageError> {
        let mut companies: Vec<Company> = subdirs(&self.base_dir.join(COMPANIES_DIR))?
            .into_iter()
            .map(|dir| read_json::<Company>(&dir.join(COMPANY_FILE)))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    /// Registers a filing; (company, accession number) must be unique.
    pub fn create_filing(&self, company: &Company, new: NewFiling) -> Result<Filing, StorageError> {
        let dir = self.filing_dir(&company.cik, &new.accession_number)?;
        if dir.join(FILING_FILE).exists() {
            return Err(StorageError::FilingExists {
                cik: company.cik.clone(),
                accession: new.accession_number,
            });
        }

        let filing = Filing {
            cik: company.cik.clone(),
            accession_number: new.accession_number,
            form_type: new.form_type,
            filing_date: new.filing_date,
            period_of_report: new.period_of_report,
            url: new.url,
            local_path: new.local_path,
            metadata: new.metadata,
            created_at: Utc::now(),
        };
        fs::create_dir_all(&dir)?;
        write_json(&dir.join(FILING_FILE), &filing)?;

        tracing::info!("Created filing {} for company {}", filing.accession_number, filing.cik);
        Ok(filing)
    }

    pub fn filing(&self, cik: &str, accession: &str) -> Result<Filing, StorageError> {
        read_json(&self.filing_dir(cik, accession)?.join(FILING_FILE))?.ok_or_else(|| {
            StorageError::FilingNotFound {
                cik: cik.to_string(),
                accession: accession.to_string(),
            }
        })
    }

    /// Filings of one company, newest first.
    pub fn list_filings(&self, cik: &str) -> Result<Vec<Filing>, StorageError> {
        if self.company(cik)?.is_none() {
            return Err(StorageError::CompanyNotFound(cik.to_string()));
        }
        let mut filings: Vec<Filing> = subdirs(&self.company_dir(cik)?.join(FILINGS_DIR))?
            .into_iter()
            .map(|dir| read_json::<Filing>(&dir.join(FILING_FILE)))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        filings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(filings)
    }

    /// Persists one record per section and one per table of `extract` under `filing`.
    pub fn store_extract(&self, filing: &Filing, extract: &FilingExtract) -> Result<StoredCounts, StorageError> {
        let dir = self.filing_dir(&filing.cik, &filing.accession_number)?;
        if !dir.join(FILING_FILE).exists() {
            return Err(StorageError::FilingNotFound {
                cik: filing.cik.clone(),
                accession: filing.accession_number.clone(),
            });
        }

        let sections: Vec<SectionRecord> = extract
            .sections
            .iter()
            .map(|(name, content)| SectionRecord {
                name: name.clone(),
                content: content.clone(),
            })
            .collect();
        let tables: Vec<TableRecord> = extract
            .tables
            .iter()
            .enumerate()
            .map(|(index, table)| TableRecord {
                index,
                data: table.rows.clone(),
            })
            .collect();

        write_json(&dir.join(SECTIONS_FILE), &sections)?;
        write_json(&dir.join(TABLES_FILE), &tables)?;

        tracing::info!(
            "Stored {} sections and {} tables for filing {}",
            sections.len(),
            tables.len(),
            filing.accession_number
        );
        Ok(StoredCounts {
            sections: sections.len(),
            tables: tables.len(),
        })
    }

    pub fn sections(&self, cik: &str, accession: &str) -> Result<Vec<SectionRecord>, StorageError> {
        self.filing(cik, accession)?;
        Ok(read_json(&self.filing_dir(cik, accession)?.join(SECTIONS_FILE))?.unwrap_or_default())
    }

    /// Sections of a filing whose name is exactly `name`.
    pub fn section(&self, cik: &str, accession: &str, name: &str) -> Result<Vec<SectionRecord>, StorageError> {
        let mut sections = self.sections(cik, accession)?;
        sections.retain(|s| s.name == name);
        Ok(sections)
    }

    pub fn tables(&self, cik: &str, accession: &str) -> Result<Vec<TableRecord>, StorageError> {
        self.filing(cik, accession)?;
        Ok(read_json(&self.filing_dir(cik, accession)?.join(TABLES_FILE))?.unwrap_or_default())
    }
}

/// Writes a pretty-printed extraction result, creating parent directories.
pub fn save_extract_json(path: &Path, extract: &FilingExtract) -> Result<PathBuf, StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_json(path, extract)?;
    tracing::info!("Parsed data saved to {}", path.display());
    Ok(path.to_path_buf())
}

/// Keys become directory names; keep them to a single plain path component.
fn record_key(key: &str) -> Result<&str, StorageError> {
    let key = key.trim();
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if bad {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(key)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn subdirs(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}
