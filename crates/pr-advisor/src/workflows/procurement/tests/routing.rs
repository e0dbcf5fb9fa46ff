use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::procurement::router::{
    analyze_handler, origin_allowed, procurement_router,
};
use crate::workflows::procurement::service::ProcurementAnalysisService;

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializes")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn analyze_route_returns_success_envelope() {
    let (service, _, _) = build_service();
    let router = procurement_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/analyze-pr",
            json!({
                "project_name": "Scenario A",
                "client_type": "Repeat",
                "project_size": 7_500_000,
                "project_budget": 5_000_000,
                "spent_till_date": 3_200_000,
                "new_pr_value": 1_200_000,
                "historical_win_probability": 0.72
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["stored"], true);
    let data = &payload["data"];
    assert_eq!(data["risk_score"], 40);
    assert_eq!(data["risk_level"], "Medium");
    assert_eq!(data["remaining_budget"], 600_000);
    assert_eq!(data["budget_utilization_after"], 88.0);
    assert_eq!(data["effort_level"], "Concept-level BOQ only");
    assert_eq!(data["ai_insight"]["confidence"], "Medium");
    let generated_at = data["generated_at"].as_str().expect("display string");
    assert!(generated_at.contains(", "), "unexpected display format {generated_at}");
}

#[tokio::test]
async fn analyze_route_rejects_zero_budget_with_500() {
    let (service, repository, _) = build_service();
    let router = procurement_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/analyze-pr",
            json!({
                "project_name": "Broken",
                "client_type": "New",
                "project_size": 100,
                "project_budget": 0,
                "spent_till_date": 0,
                "new_pr_value": 10,
                "historical_win_probability": 0.5
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
    assert_eq!(
        payload["error"],
        "invalid input: project_budget must be greater than zero"
    );
    assert_eq!(repository.len(), 0);
}

#[tokio::test]
async fn analyze_route_wraps_malformed_json() {
    let (service, _, _) = build_service();
    let router = procurement_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::post("/api/analyze-pr")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
    assert!(payload["error"].is_string());
}

#[tokio::test]
async fn analyze_handler_reports_unstored_results() {
    let service = Arc::new(ProcurementAnalysisService::new(
        Arc::new(UnavailableRepository),
        Arc::new(StubAdvisor::default()),
        50,
    ));

    let response = analyze_handler::<UnavailableRepository, StubAdvisor>(
        State(service),
        Ok(axum::Json(scenario_b())),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["stored"], false);
    assert_eq!(payload["data"]["is_overrun"], true);
    assert_eq!(payload["data"]["overrun_amount"], 200_000);
}

#[tokio::test]
async fn history_route_lists_records() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service.analyze(scenario_a()).await.expect("scenario a");
    service.analyze(scenario_c()).await.expect("scenario c");

    let response = procurement_router(service)
        .oneshot(get("/api/history"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["count"], 2);
    let records = payload["data"].as_array().expect("records array");
    assert!(records.iter().all(|record| record["created_at"].is_string()));
    assert!(records.iter().all(|record| record["id"].is_string()));
}

#[tokio::test]
async fn history_route_surfaces_storage_failure() {
    let service = Arc::new(ProcurementAnalysisService::new(
        Arc::new(UnavailableRepository),
        Arc::new(StubAdvisor::default()),
        50,
    ));

    let response = procurement_router(service)
        .oneshot(get("/api/history"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
}

#[tokio::test]
async fn stats_route_returns_counters() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service.analyze(scenario_b()).await.expect("scenario b");

    let response = procurement_router(service)
        .oneshot(get("/api/stats"))
        .await
        .expect("route executes");

    let payload = read_json_body(response).await;
    assert_eq!(
        payload,
        json!({
            "success": true,
            "data": { "total": 1, "critical": 0, "high": 1, "overruns": 1 }
        })
    );
}

#[tokio::test]
async fn follow_up_route_maps_advisor_outage_to_503() {
    let service = Arc::new(ProcurementAnalysisService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(FailingAdvisor),
        50,
    ));

    let response = procurement_router(service)
        .oneshot(post_json(
            "/api/follow-up",
            json!({
                "context": {
                    "project_name": "Scenario A",
                    "risk_level": "Medium",
                    "remaining_budget": 600_000,
                    "new_pr_value": 1_200_000,
                    "effort_level": "Concept-level BOQ only",
                    "historical_win_probability": 0.72
                },
                "question": "Should we phase deliveries?"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
}

#[tokio::test]
async fn health_route_reports_storage_state() {
    let (service, _, _) = build_service();
    let response = procurement_router(Arc::new(service))
        .oneshot(get("/health"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload, json!({ "status": "ok", "db": "connected" }));

    let offline = Arc::new(ProcurementAnalysisService::new(
        Arc::new(UnavailableRepository),
        Arc::new(StubAdvisor::default()),
        50,
    ));
    let response = procurement_router(offline)
        .oneshot(get("/health"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["db"], "disconnected");
}

#[test]
fn cors_origins_match_exact_and_subdomain_entries() {
    let allowed = vec![
        "http://localhost:3000".to_string(),
        "*.onrender.com".to_string(),
    ];
    assert!(origin_allowed("http://localhost:3000", &allowed));
    assert!(origin_allowed("https://hvac-dashboard.onrender.com", &allowed));
    assert!(!origin_allowed("https://onrender.com", &allowed));
    assert!(!origin_allowed("https://evilonrender.com", &allowed));
    assert!(!origin_allowed("http://localhost:5173", &allowed));
}
