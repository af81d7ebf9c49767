#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident dataset definitions, CKAN fetching, and record extraction.
//!
//! Each upstream dataset is described by an embedded TOML config (see
//! [`registry`]). A [`dataset_def::DatasetDefinition`] knows how to fetch
//! its raw JSON rows and how to turn them into
//! [`accident_map_accident_models::RawAccidentRecord`]s. Rows without
//! usable coordinates are skipped and counted rather than failing the
//! fetch.

pub mod ckan;
pub mod dataset_def;
pub mod http;
pub mod parsing;
pub mod registry;

use accident_map_retry::{RetryPolicy, Retryable};
use tokio::time::Instant;

/// Errors that can occur while fetching or decoding a dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream answered with a non-success status.
    #[error("Upstream returned HTTP {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// Response JSON had no `result.records` array.
    #[error("Response from {url} has no result.records array")]
    MissingRecords {
        /// Request URL.
        url: String,
    },

    /// The request deadline passed before the fetch completed.
    #[error("Upstream fetch timed out")]
    Timeout,

    /// No dataset is registered under the requested id.
    #[error("Unknown dataset: {id}")]
    UnknownDataset {
        /// The requested id.
        id: String,
    },
}

impl Retryable for SourceError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => http::is_transient(e),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Json(_)
            | Self::MissingRecords { .. }
            | Self::Timeout
            | Self::UnknownDataset { .. } => false,
        }
    }
}

/// Per-request settings for fetching a dataset.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Overrides the dataset's API URL (e.g. a mirror or a test server).
    pub api_url: Option<String>,
    /// Overrides the dataset's row limit.
    pub limit: Option<u64>,
    /// Abandon the fetch once this instant passes.
    pub deadline: Option<Instant>,
    /// Retry policy for transient HTTP failures.
    pub retry: RetryPolicy,
}

impl FetchOptions {
    /// Builds options from `ACCIDENT_MAP_API_URL` and
    /// `ACCIDENT_MAP_ROW_LIMIT`, leaving unset values to the dataset
    /// definition.
    #[must_use]
    pub fn from_env() -> Self {
        let api_url = std::env::var("ACCIDENT_MAP_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let limit = std::env::var("ACCIDENT_MAP_ROW_LIMIT").ok().and_then(|s| {
            s.trim().parse::<u64>().map_or_else(
                |_| {
                    log::warn!("Ignoring invalid ACCIDENT_MAP_ROW_LIMIT={s:?}");
                    None
                },
                Some,
            )
        });

        Self {
            api_url,
            limit,
            ..Self::default()
        }
    }

    /// Returns a copy of these options bound to `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
