//! HTTP handler functions for the accident hotspot API.

use accident_map_ai::annotate::{AnnotateOptions, annotate_hotspots};
use accident_map_hotspot::{HotspotError, HotspotOptions, HotspotReport, find_hotspots};
use accident_map_server_models::{
    AdvisoryQueryParams, ApiAnnotationReport, ApiError, ApiHealth, ApiHotspotList,
    HotspotQueryParams,
};
use accident_map_source::SourceError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use tokio::time::Instant;

use crate::AppState;

/// Why a hotspot request could not be answered.
#[derive(Debug, thiserror::Error)]
enum HandlerError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Hotspot(#[from] HotspotError),
    #[error("No AI provider is configured")]
    NoProvider,
}

impl HandlerError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Source(SourceError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::Source(SourceError::UnknownDataset { .. }) | Self::Hotspot(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Source(_) => StatusCode::BAD_GATEWAY,
            Self::NoProvider => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn into_response(self) -> HttpResponse {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            log::error!("Hotspot request failed: {self}");
        } else {
            log::warn!("Hotspot request rejected: {self}");
        }
        HttpResponse::build(status).json(ApiError {
            error: self.to_string(),
        })
    }
}

/// Fetched and ranked hotspots plus the counts reported alongside them.
struct Loaded {
    fetched: usize,
    skipped: usize,
    report: HotspotReport,
}

async fn load_hotspots(
    state: &AppState,
    options: &HotspotOptions,
    deadline: Instant,
) -> Result<Loaded, HandlerError> {
    let fetch = state.config.fetch.clone().with_deadline(deadline);
    let extracted = state.dataset.fetch(&state.client, &fetch).await?;
    let report = find_hotspots(&extracted.records, options)?;

    Ok(Loaded {
        fetched: extracted.fetched(),
        skipped: extracted.skipped,
        report,
    })
}

fn to_api_list(
    state: &AppState,
    loaded: Loaded,
    threshold: u64,
    annotation: Option<ApiAnnotationReport>,
) -> ApiHotspotList {
    ApiHotspotList {
        dataset_id: state.dataset.id().to_string(),
        fetched: loaded.fetched,
        skipped: loaded.skipped,
        locations: loaded.report.locations,
        threshold,
        generated_at: chrono::Utc::now(),
        hotspots: loaded.report.hotspots,
        annotation,
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/hotspots`
///
/// Returns locations with more accidents than `threshold`, busiest first.
pub async fn hotspots(
    state: web::Data<AppState>,
    params: web::Query<HotspotQueryParams>,
) -> HttpResponse {
    let options = HotspotOptions {
        threshold: params.threshold.unwrap_or(state.config.threshold),
        limit: params.limit,
    };

    match load_hotspots(&state, &options, state.config.deadline()).await {
        Ok(loaded) => HttpResponse::Ok().json(to_api_list(&state, loaded, options.threshold, None)),
        Err(e) => e.into_response(),
    }
}

/// `GET /api/hotspots/advisories`
///
/// Same list as [`hotspots`], with a prevention tip attached to every
/// hotspot above `severeThreshold`. Locations whose advisory could not be
/// generated are returned without one.
pub async fn hotspot_advisories(
    state: web::Data<AppState>,
    params: web::Query<AdvisoryQueryParams>,
) -> HttpResponse {
    let Some(provider) = state.provider.clone() else {
        return HandlerError::NoProvider.into_response();
    };

    let deadline = state.config.deadline();
    let options = HotspotOptions {
        threshold: params.threshold.unwrap_or(state.config.threshold),
        limit: params.limit,
    };

    let mut loaded = match load_hotspots(&state, &options, deadline).await {
        Ok(loaded) => loaded,
        Err(e) => return e.into_response(),
    };

    let annotate_options = AnnotateOptions {
        severe_threshold: params
            .severe_threshold
            .unwrap_or(state.config.severe_threshold),
        language: params
            .language
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| state.config.language.clone()),
        concurrency: state.config.concurrency,
        retry: state.config.advisory_retry,
        deadline: Some(deadline),
    };

    let report =
        annotate_hotspots(&*provider, &mut loaded.report.hotspots, &annotate_options).await;

    let annotation = ApiAnnotationReport {
        eligible: report.eligible,
        annotated: report.annotated,
        failed: report.failed,
        skipped: report.skipped,
    };

    HttpResponse::Ok().json(to_api_list(
        &state,
        loaded,
        options.threshold,
        Some(annotation),
    ))
}
