#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for accident hotspots.
//!
//! Every request re-fetches the configured dataset, aggregates it, and
//! returns the ranked hotspots. The advisories endpoint additionally asks
//! the configured LLM provider for a prevention tip per severe hotspot.
//! Nothing is cached between requests.

mod handlers;
pub mod interactive;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use accident_map_ai::LlmProvider;
use accident_map_ai::annotate::{DEFAULT_LANGUAGE, DEFAULT_SEVERE_THRESHOLD};
use accident_map_hotspot::DEFAULT_OCCURRENCE_THRESHOLD;
use accident_map_retry::RetryPolicy;
use accident_map_source::FetchOptions;
use accident_map_source::dataset_def::DatasetDefinition;
use accident_map_source::registry::{self, DEFAULT_DATASET};
use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use tokio::time::Instant;

/// Default request budget covering fetch and annotation.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Runtime settings for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Dataset served by this instance.
    pub dataset_id: String,
    /// Default occurrence threshold.
    pub threshold: u64,
    /// Default severe threshold for advisories.
    pub severe_threshold: u64,
    /// Default advisory language.
    pub language: String,
    /// Maximum advisory requests in flight per request.
    pub concurrency: usize,
    /// Budget for one request, fetch and annotation included.
    pub request_timeout: Duration,
    /// Upstream fetch settings.
    pub fetch: FetchOptions,
    /// Retry policy for rate-limited advisory requests.
    pub advisory_retry: RetryPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            dataset_id: DEFAULT_DATASET.to_string(),
            threshold: DEFAULT_OCCURRENCE_THRESHOLD,
            severe_threshold: DEFAULT_SEVERE_THRESHOLD,
            language: DEFAULT_LANGUAGE.to_string(),
            concurrency: 1,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fetch: FetchOptions::default(),
            advisory_retry: RetryPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Reads settings from the environment, falling back to defaults for
    /// anything unset or unparseable.
    ///
    /// Recognized variables: `BIND_ADDR`, `PORT`, `ACCIDENT_MAP_DATASET`,
    /// `HOTSPOT_THRESHOLD`, `SEVERE_THRESHOLD`, `ADVISORY_LANGUAGE`,
    /// `ANNOTATION_CONCURRENCY`, `REQUEST_TIMEOUT_SECS`, plus the fetch
    /// overrides read by [`FetchOptions::from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: env_or("PORT", defaults.port),
            dataset_id: std::env::var("ACCIDENT_MAP_DATASET").unwrap_or(defaults.dataset_id),
            threshold: env_or("HOTSPOT_THRESHOLD", defaults.threshold),
            severe_threshold: env_or("SEVERE_THRESHOLD", defaults.severe_threshold),
            language: std::env::var("ADVISORY_LANGUAGE").unwrap_or(defaults.language),
            concurrency: env_or("ANNOTATION_CONCURRENCY", defaults.concurrency).max(1),
            request_timeout: request_timeout_from_env(),
            fetch: FetchOptions::from_env(),
            advisory_retry: defaults.advisory_retry,
        }
    }

    /// Deadline for a request starting now.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.request_timeout
    }
}

/// Reads `REQUEST_TIMEOUT_SECS`, falling back to
/// [`DEFAULT_REQUEST_TIMEOUT`].
#[must_use]
pub fn request_timeout_from_env() -> Duration {
    Duration::from_secs(env_or(
        "REQUEST_TIMEOUT_SECS",
        DEFAULT_REQUEST_TIMEOUT.as_secs(),
    ))
}

fn env_or<T: FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {name}={raw:?}");
            default
        }),
        Err(_) => default,
    }
}

/// Shared application state.
pub struct AppState {
    /// HTTP client for upstream requests.
    pub client: reqwest::Client,
    /// Dataset served by this instance.
    pub dataset: DatasetDefinition,
    /// LLM provider for advisories, if one is configured.
    pub provider: Option<Arc<dyn LlmProvider>>,
    /// Runtime settings.
    pub config: ServerConfig,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/hotspots", web::get().to(handlers::hotspots))
            .route(
                "/hotspots/advisories",
                web::get().to(handlers::hotspot_advisories),
            ),
    );
}

/// Starts the accident hotspot API server.
///
/// Resolves the configured dataset, creates the LLM provider from the
/// environment (advisories are disabled when none is configured), and
/// starts the Actix-Web HTTP server. The caller is responsible for
/// providing the async runtime (e.g. via `#[actix_web::main]`) and for
/// initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset id is unknown, or if
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let dataset = registry::find_dataset(&config.dataset_id).map_err(std::io::Error::other)?;
    log::info!("Serving dataset {} ({})", dataset.id(), dataset.name());

    let provider: Option<Arc<dyn LlmProvider>> = match accident_map_ai::create_provider_from_env() {
        Ok(provider) => {
            log::info!("Advisories enabled using model {}", provider.model());
            Some(Arc::from(provider))
        }
        Err(e) => {
            log::warn!("Advisories disabled: {e}");
            None
        }
    };

    let bind_addr = config.bind_addr.clone();
    let port = config.port;

    let state = web::Data::new(AppState {
        client: reqwest::Client::new(),
        dataset,
        provider,
        config,
    });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.threshold, 10);
        assert_eq!(config.severe_threshold, 90);
        assert_eq!(config.language, "English");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.dataset_id, "montreal");
    }

    #[test]
    fn unset_variable_uses_default() {
        assert_eq!(env_or("ACCIDENT_MAP_TEST_SURELY_UNSET", 42_u64), 42);
    }
}
