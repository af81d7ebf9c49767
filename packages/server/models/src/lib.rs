#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the accident hotspot server.
//!
//! These types are serialized to JSON for the REST API. They wrap the
//! engine's [`HotspotSummary`] values with request metadata so the API
//! contract can evolve independently of the engine.

use accident_map_hotspot_models::HotspotSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Query parameters for `GET /api/hotspots`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotQueryParams {
    /// Occurrence threshold; a location needs strictly more accidents.
    pub threshold: Option<u64>,
    /// Maximum number of hotspots to return.
    pub limit: Option<usize>,
}

/// Query parameters for `GET /api/hotspots/advisories`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryQueryParams {
    /// Occurrence threshold; a location needs strictly more accidents.
    pub threshold: Option<u64>,
    /// Count a hotspot must exceed to receive an advisory.
    pub severe_threshold: Option<u64>,
    /// Language the advisories are written in.
    pub language: Option<String>,
    /// Maximum number of hotspots to return.
    pub limit: Option<usize>,
}

/// Outcome counts of an advisory pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAnnotationReport {
    /// Hotspots above the severe threshold.
    pub eligible: usize,
    /// Hotspots that received an advisory.
    pub annotated: usize,
    /// Hotspots whose advisory request failed.
    pub failed: usize,
    /// Hotspots skipped because the request deadline passed.
    pub skipped: usize,
}

/// Ranked hotspot list returned by both hotspot endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHotspotList {
    /// Dataset the records came from.
    pub dataset_id: String,
    /// Rows returned by the upstream portal.
    pub fetched: usize,
    /// Rows dropped for missing or invalid coordinates.
    pub skipped: usize,
    /// Distinct rounded locations.
    pub locations: usize,
    /// Occurrence threshold that was applied.
    pub threshold: u64,
    /// When this list was computed.
    pub generated_at: DateTime<Utc>,
    /// Hotspots, busiest first.
    pub hotspots: Vec<HotspotSummary>,
    /// Present only on the advisories endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<ApiAnnotationReport>,
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}
