//! CKAN Datastore API fetcher.
//!
//! Issues a single `datastore_search` request for a resource and returns
//! the `result.records` array. Used by the Montréal collision dataset.

use accident_map_retry::RetryPolicy;
use tokio::time::Instant;

use crate::{SourceError, http};

/// Configuration for a CKAN fetch operation.
pub struct CkanConfig<'a> {
    /// Base API URL (e.g.,
    /// `"https://donnees.montreal.ca/api/3/action/datastore_search"`).
    pub api_url: &'a str,
    /// CKAN resource ID for the dataset.
    pub resource_id: &'a str,
    /// Maximum number of rows to request.
    pub limit: u64,
    /// Label for log messages (e.g., `"Montréal"`).
    pub label: &'a str,
}

/// Fetches up to `config.limit` rows from a CKAN Datastore endpoint.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails after retries, the body is
/// not JSON, or the body has no `result.records` array.
pub async fn fetch_ckan(
    client: &reqwest::Client,
    config: &CkanConfig<'_>,
    policy: &RetryPolicy,
    deadline: Option<Instant>,
) -> Result<Vec<serde_json::Value>, SourceError> {
    log::info!(
        "Fetching {} data: resource={}, limit={}",
        config.label,
        config.resource_id,
        config.limit
    );

    let limit = config.limit.to_string();
    let body = http::send_json(
        || {
            client
                .get(config.api_url)
                .header(reqwest::header::ACCEPT, "application/json")
                .query(&[("resource_id", config.resource_id), ("limit", limit.as_str())])
        },
        policy,
        deadline,
    )
    .await?;

    let records = records_from_body(body).ok_or_else(|| SourceError::MissingRecords {
        url: config.api_url.to_string(),
    })?;

    log::info!("Downloaded {} {} records", records.len(), config.label);

    Ok(records)
}

/// Takes the `result.records` array out of a `datastore_search` response.
fn records_from_body(mut body: serde_json::Value) -> Option<Vec<serde_json::Value>> {
    match body.get_mut("result")?.get_mut("records")?.take() {
        serde_json::Value::Array(records) => Some(records),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_records_array() {
        let body = serde_json::json!({
            "success": true,
            "result": {"records": [{"LOC_LAT": 45.5}, {"LOC_LAT": 45.6}]}
        });
        let records = records_from_body(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["LOC_LAT"], 45.6);
    }

    #[test]
    fn empty_records_array_is_valid() {
        let body = serde_json::json!({"result": {"records": []}});
        assert_eq!(records_from_body(body).unwrap().len(), 0);
    }

    #[test]
    fn missing_result_is_rejected() {
        assert!(records_from_body(serde_json::json!({"success": false})).is_none());
        assert!(records_from_body(serde_json::json!({"result": {}})).is_none());
        assert!(records_from_body(serde_json::json!({"result": {"records": {}}})).is_none());
    }
}
