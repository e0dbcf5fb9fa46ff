use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use pr_advisor::workflows::procurement::{
    procurement_router, AdvisoryProvider, AnalysisRepository, ProcurementAnalysisService,
};
use serde_json::json;
use std::sync::Arc;

/// Procurement API plus the operational probes the deployment relies on.
pub(crate) fn with_operational_routes<R, A>(
    service: Arc<ProcurementAnalysisService<R, A>>,
) -> axum::Router
where
    R: AnalysisRepository + 'static,
    A: AdvisoryProvider + 'static,
{
    procurement_router(service)
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
