//! End-to-end tests of the HTTP API against a mock CKAN portal.

use std::sync::Arc;
use std::time::Duration;

use accident_map_ai::{AiError, LlmProvider};
use accident_map_retry::RetryPolicy;
use accident_map_server::{AppState, ServerConfig, configure};
use accident_map_source::FetchOptions;
use accident_map_source::registry::{DEFAULT_DATASET, find_dataset};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/api/3/action/datastore_search";
const FAST: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(1), 2);

struct FixedProvider(&'static str);

#[async_trait::async_trait]
impl LlmProvider for FixedProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, AiError> {
        Ok(self.0.to_string())
    }

    fn model(&self) -> &str {
        "fixed"
    }
}

fn row(lat: f64, lng: f64, severity: &str) -> Value {
    json!({
        "LOC_LAT": lat,
        "LOC_LONG": lng,
        "GRAVITE": severity,
        "CD_COND_METEO": 11,
        "HEURE_ACCDN": "16:00:00-16:59:00"
    })
}

/// 12 accidents at one corner, 3 at another, and one row without
/// coordinates.
fn rows() -> Vec<Value> {
    let mut rows: Vec<Value> = (0..12).map(|_| row(45.5, -73.5, "Léger")).collect();
    rows.extend((0..3).map(|_| row(45.6, -73.6, "Grave")));
    rows.push(json!({"LOC_LAT": "", "LOC_LONG": null, "GRAVITE": "Léger"}));
    rows
}

async fn portal(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

async fn healthy_portal() -> MockServer {
    portal(ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "result": {"records": rows()}
    })))
    .await
}

fn state(server: &MockServer, provider: Option<Arc<dyn LlmProvider>>) -> web::Data<AppState> {
    let config = ServerConfig {
        fetch: FetchOptions {
            api_url: Some(format!("{}{SEARCH_PATH}", server.uri())),
            limit: Some(1000),
            deadline: None,
            retry: FAST,
        },
        advisory_retry: FAST,
        ..ServerConfig::default()
    };

    web::Data::new(AppState {
        client: reqwest::Client::new(),
        dataset: find_dataset(DEFAULT_DATASET).unwrap(),
        provider,
        config,
    })
}

async fn get(state: web::Data<AppState>, uri: &str) -> (StatusCode, Value) {
    let app = test::init_service(App::new().app_data(state).configure(configure)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

#[actix_web::test]
async fn health_reports_version() {
    let server = healthy_portal().await;
    let (status, body) = get(state(&server, None), "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_web::test]
async fn hotspots_use_default_threshold() {
    let server = healthy_portal().await;
    let (status, body) = get(state(&server, None), "/api/hotspots").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["datasetId"], "montreal");
    assert_eq!(body["fetched"], 16);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["locations"], 2);
    assert_eq!(body["threshold"], 10);
    assert!(body.get("annotation").is_none());

    let hotspots = body["hotspots"].as_array().unwrap();
    assert_eq!(hotspots.len(), 1);
    assert_eq!(hotspots[0]["count"], 12);
    assert_eq!(hotspots[0]["latitude"], 45.5);
    assert_eq!(hotspots[0]["severities"]["Léger"], 12);
    assert_eq!(hotspots[0]["weather"], "clear");
    assert_eq!(hotspots[0]["time"], "16:59:00");
    assert!(hotspots[0]["advisory"].is_null());
}

#[actix_web::test]
async fn hotspots_respect_threshold_and_limit() {
    let server = healthy_portal().await;

    let (_, body) = get(state(&server, None), "/api/hotspots?threshold=2").await;
    let counts: Vec<u64> = body["hotspots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["count"].as_u64().unwrap())
        .collect();
    assert_eq!(counts, vec![12, 3]);

    let (_, body) = get(state(&server, None), "/api/hotspots?threshold=2&limit=1").await;
    assert_eq!(body["hotspots"].as_array().unwrap().len(), 1);
    assert_eq!(body["locations"], 2);
}

#[actix_web::test]
async fn upstream_failure_is_bad_gateway() {
    let server = portal(ResponseTemplate::new(500)).await;
    let (status, body) = get(state(&server, None), "/api/hotspots").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn missing_records_is_bad_gateway() {
    let server = portal(ResponseTemplate::new(200).set_body_json(json!({"success": false}))).await;
    let (status, _) = get(state(&server, None), "/api/hotspots").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn advisories_need_a_provider() {
    let server = healthy_portal().await;
    let (status, body) = get(state(&server, None), "/api/hotspots/advisories").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "No AI provider is configured");
}

#[actix_web::test]
async fn advisories_annotate_severe_hotspots() {
    let server = healthy_portal().await;
    let provider: Arc<dyn LlmProvider> = Arc::new(FixedProvider("Slow down at this corner."));
    let (status, body) = get(
        state(&server, Some(provider)),
        "/api/hotspots/advisories?threshold=2&severeThreshold=11&language=French",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let hotspots = body["hotspots"].as_array().unwrap();
    assert_eq!(hotspots[0]["advisory"], "Slow down at this corner.");
    assert!(hotspots[1]["advisory"].is_null());
    assert_eq!(body["annotation"]["eligible"], 1);
    assert_eq!(body["annotation"]["annotated"], 1);
    assert_eq!(body["annotation"]["failed"], 0);
}

#[actix_web::test]
async fn default_severe_threshold_leaves_small_hotspots_alone() {
    let server = healthy_portal().await;
    let provider: Arc<dyn LlmProvider> = Arc::new(FixedProvider("unused"));
    let (status, body) = get(state(&server, Some(provider)), "/api/hotspots/advisories").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["annotation"]["eligible"], 0);
    assert!(body["hotspots"][0]["advisory"].is_null());
}
