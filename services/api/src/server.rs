use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredRepository};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pr_advisor::config::AppConfig;
use pr_advisor::error::AppError;
use pr_advisor::telemetry;
use pr_advisor::workflows::procurement::{
    cors_layer, ConfiguredAdvisor, ProcurementAnalysisService,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(ConfiguredRepository::from_config(&config.storage)?);
    let advisor = Arc::new(ConfiguredAdvisor::from_config(&config.advisory));
    if !advisor.is_enabled() {
        warn!("GEMINI_API_KEY not set; analyses will be returned without advisory insight");
    }
    let storage_backend = repository.backend();
    let analysis_service = Arc::new(ProcurementAnalysisService::new(
        repository,
        advisor,
        config.storage.history_limit,
    ));

    let app = with_operational_routes(analysis_service)
        .layer(cors_layer(&config.server.allowed_origins))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, storage = storage_backend, "purchase request advisor ready");

    axum::serve(listener, app).await?;
    Ok(())
}
