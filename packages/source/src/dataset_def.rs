//! Config-driven accident dataset definition.
//!
//! [`DatasetDefinition`] captures everything unique about an upstream
//! dataset in a serializable config struct: where to fetch it, its
//! license, and which JSON fields hold the values the pipeline needs.

use accident_map_accident_models::RawAccidentRecord;
use serde::Deserialize;

use crate::ckan::{CkanConfig, fetch_ckan};
use crate::parsing::{parse_code, parse_lat_lng, parse_text};
use crate::{FetchOptions, SourceError};

/// Default number of rows requested from the upstream API.
pub const DEFAULT_ROW_LIMIT: u64 = 300_000;

// ── Top-level dataset definition ─────────────────────────────────────────

/// A complete, config-driven accident dataset definition.
///
/// Loaded from TOML files embedded at compile time.
#[derive(Debug, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"montreal"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// City covered by the dataset.
    pub city: String,
    /// Province or state abbreviation.
    pub region: String,
    /// Human-readable data portal page.
    #[serde(default)]
    pub portal_url: Option<String>,
    /// Licensing and attribution metadata.
    pub license: LicenseInfo,
    /// CKAN endpoint settings.
    pub ckan: CkanSettings,
    /// Field name mappings for extraction.
    pub fields: FieldMapping,
}

// ── License metadata ─────────────────────────────────────────────────────

/// Licensing and attribution requirements for a dataset.
#[derive(Debug, Deserialize)]
pub struct LicenseInfo {
    /// License type identifier (e.g., `"cc_by"`, `"open_data"`).
    pub license_type: String,
    /// URL to the license page, if available.
    pub tos_url: Option<String>,
    /// Whether attribution is required when displaying the data.
    pub attribution_required: bool,
    /// Verbatim attribution text.
    pub attribution_text: Option<String>,
}

// ── Fetcher config ───────────────────────────────────────────────────────

/// CKAN `datastore_search` settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CkanSettings {
    /// `datastore_search` endpoint URL.
    pub api_url: String,
    /// CKAN resource ID.
    pub resource_id: String,
    /// Maximum number of rows to request.
    #[serde(default = "default_row_limit")]
    pub limit: u64,
}

const fn default_row_limit() -> u64 {
    DEFAULT_ROW_LIMIT
}

// ── Field mapping ────────────────────────────────────────────────────────

/// Maps dataset-specific JSON field names to raw record fields.
#[derive(Debug, Deserialize)]
pub struct FieldMapping {
    /// Latitude field (number or numeric string).
    pub latitude: String,
    /// Longitude field (number or numeric string).
    pub longitude: String,
    /// Severity label field.
    pub severity: String,
    /// Numeric weather code field.
    pub weather_code: String,
    /// Time-of-day field.
    pub time: String,
}

impl FieldMapping {
    /// Extracts a raw record from one JSON row.
    ///
    /// Returns `None` when the row has no usable coordinate pair; all other
    /// fields are optional.
    #[must_use]
    pub fn extract(&self, record: &serde_json::Value) -> Option<RawAccidentRecord> {
        let (latitude, longitude) =
            parse_lat_lng(record.get(&self.latitude), record.get(&self.longitude))?;

        Some(RawAccidentRecord {
            latitude,
            longitude,
            severity: parse_text(record.get(&self.severity)),
            weather_code: parse_code(record.get(&self.weather_code)),
            time: parse_text(record.get(&self.time)),
        })
    }
}

/// Raw records extracted from one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRecords {
    /// Rows that had usable coordinates.
    pub records: Vec<RawAccidentRecord>,
    /// Rows dropped for missing or invalid coordinates.
    pub skipped: usize,
}

impl ExtractedRecords {
    /// Total rows received from upstream.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.records.len() + self.skipped
    }
}

impl DatasetDefinition {
    /// Returns the unique dataset identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the licensing metadata for this dataset.
    #[must_use]
    pub const fn license(&self) -> &LicenseInfo {
        &self.license
    }

    /// Converts JSON rows into raw records, skipping rows without
    /// coordinates.
    #[must_use]
    pub fn extract_records(&self, rows: &[serde_json::Value]) -> ExtractedRecords {
        let mut records = Vec::with_capacity(rows.len());
        let mut skipped = 0;

        for row in rows {
            if let Some(record) = self.fields.extract(row) {
                records.push(record);
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            log::debug!(
                "{}: skipped {skipped} of {} rows without usable coordinates",
                self.id,
                rows.len()
            );
        }

        ExtractedRecords { records, skipped }
    }

    /// Fetches the dataset and extracts its records.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the upstream request fails, returns
    /// something other than a CKAN record list, or does not finish before
    /// `options.deadline`.
    pub async fn fetch(
        &self,
        client: &reqwest::Client,
        options: &FetchOptions,
    ) -> Result<ExtractedRecords, SourceError> {
        let config = CkanConfig {
            api_url: options.api_url.as_deref().unwrap_or(&self.ckan.api_url),
            resource_id: &self.ckan.resource_id,
            limit: options.limit.unwrap_or(self.ckan.limit),
            label: &self.city,
        };

        let fetch = fetch_ckan(client, &config, &options.retry, options.deadline);
        let rows = match options.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fetch)
                .await
                .map_err(|_| SourceError::Timeout)??,
            None => fetch.await?,
        };

        Ok(self.extract_records(&rows))
    }
}

/// Parses a [`DatasetDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or missing required fields.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
