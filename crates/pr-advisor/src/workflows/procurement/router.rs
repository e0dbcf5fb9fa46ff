use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::error;

use super::advisory::AdvisoryProvider;
use super::domain::PrSubmission;
use super::repository::AnalysisRepository;
use super::service::{FollowUpRequest, ProcurementAnalysisService, ProcurementServiceError};
use super::views::AnalysisView;

/// Router builder exposing analysis, history, stats and health endpoints.
pub fn procurement_router<R, A>(service: Arc<ProcurementAnalysisService<R, A>>) -> Router
where
    R: AnalysisRepository + 'static,
    A: AdvisoryProvider + 'static,
{
    Router::new()
        .route("/api/analyze-pr", post(analyze_handler::<R, A>))
        .route("/api/history", get(history_handler::<R, A>))
        .route("/api/stats", get(stats_handler::<R, A>))
        .route("/api/follow-up", post(follow_up_handler::<R, A>))
        .route("/health", get(health_handler::<R, A>))
        .with_state(service)
}

/// CORS policy for the dashboard. `*.example.com` entries match any subdomain.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed = allowed_origins.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request| {
                origin
                    .to_str()
                    .map(|origin| origin_allowed(origin, &allowed))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

pub(crate) fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    let host = origin
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(origin);

    allowed.iter().any(|entry| match entry.strip_prefix("*.") {
        Some(domain) => host
            .strip_suffix(domain)
            .map(|prefix| prefix.ends_with('.') && prefix.len() > 1)
            .unwrap_or(false),
        None => entry == origin,
    })
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "success": false,
        "error": message.into(),
    });
    (status, Json(payload)).into_response()
}

fn service_failure(err: ProcurementServiceError) -> Response {
    match err {
        ProcurementServiceError::Analysis(err) if err.is_invalid_input() => {
            failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        ProcurementServiceError::Advisory(err) => {
            failure(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        ProcurementServiceError::Repository(err) => {
            error!(error = %err, "analysis store request failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        other => {
            error!(error = %other, "analysis failed unexpectedly");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

pub(crate) async fn analyze_handler<R, A>(
    State(service): State<Arc<ProcurementAnalysisService<R, A>>>,
    payload: Result<Json<PrSubmission>, JsonRejection>,
) -> Response
where
    R: AnalysisRepository + 'static,
    A: AdvisoryProvider + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return failure(StatusCode::INTERNAL_SERVER_ERROR, rejection.body_text());
        }
    };

    match service.analyze(submission).await {
        Ok(outcome) => {
            let view = AnalysisView::new(&outcome.result, outcome.insight.as_ref());
            let payload = json!({
                "success": true,
                "stored": outcome.stored.is_some(),
                "data": view,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_failure(err),
    }
}

pub(crate) async fn history_handler<R, A>(
    State(service): State<Arc<ProcurementAnalysisService<R, A>>>,
) -> Response
where
    R: AnalysisRepository + 'static,
    A: AdvisoryProvider + 'static,
{
    match service.history() {
        Ok(records) => {
            let payload = json!({
                "success": true,
                "count": records.len(),
                "data": records,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_failure(err),
    }
}

pub(crate) async fn stats_handler<R, A>(
    State(service): State<Arc<ProcurementAnalysisService<R, A>>>,
) -> Response
where
    R: AnalysisRepository + 'static,
    A: AdvisoryProvider + 'static,
{
    match service.stats() {
        Ok(stats) => {
            let payload = json!({
                "success": true,
                "data": stats,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_failure(err),
    }
}

pub(crate) async fn follow_up_handler<R, A>(
    State(service): State<Arc<ProcurementAnalysisService<R, A>>>,
    payload: Result<Json<FollowUpRequest>, JsonRejection>,
) -> Response
where
    R: AnalysisRepository + 'static,
    A: AdvisoryProvider + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return failure(StatusCode::INTERNAL_SERVER_ERROR, rejection.body_text());
        }
    };

    match service.follow_up(request).await {
        Ok(answer) => {
            let payload = json!({
                "success": true,
                "answer": answer,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_failure(err),
    }
}

pub(crate) async fn health_handler<R, A>(
    State(service): State<Arc<ProcurementAnalysisService<R, A>>>,
) -> Json<serde_json::Value>
where
    R: AnalysisRepository + 'static,
    A: AdvisoryProvider + 'static,
{
    let db = if service.storage_connected() {
        "connected"
    } else {
        "disconnected"
    };
    Json(json!({ "status": "ok", "db": db }))
}
