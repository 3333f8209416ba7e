use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use floatdeck_core::{AiControls, CapabilityPoller, FetchOrchestrator, SessionEngine};
use floatdeck_gateway::HttpGateway;
use floatdeck_schema::{CapabilityStatus, FilterState, MessageSource, Variable};

fn gateway(server: &MockServer) -> Arc<HttpGateway> {
    Arc::new(HttpGateway::new(server.uri()))
}

async fn mount_empty_float_endpoints(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/floats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"floats": []})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"profile": []})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn empty_daily_avg_is_a_no_data_state_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily-avg"))
        .and(query_param("var", "temperature"))
        .and(query_param("start_date", "2020-03-01"))
        .and(query_param("end_date", "2020-05-30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "variable": "temperature",
            "data": []
        })))
        .mount(&server)
        .await;
    mount_empty_float_endpoints(&server).await;

    let orch = FetchOrchestrator::new(gateway(&server), vec!["2902206".into()], 1);
    orch.refresh(&FilterState::default()).await.join().await;

    let ts = orch.time_series().await;
    assert!(ts.data.is_empty());
    assert!(ts.last_error.is_none());
    assert!(!ts.loading);
}

#[tokio::test]
async fn stale_refresh_never_overwrites_newer_state() {
    let server = MockServer::start().await;
    // The first refresh's response is slow and superseded in flight.
    Mock::given(method("GET"))
        .and(path("/daily-avg"))
        .and(query_param("var", "temperature"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(200))
                .set_body_json(serde_json::json!({
                    "data": [{"day": "2020-03-01", "avg_value": 11.0}]
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/daily-avg"))
        .and(query_param("var", "salinity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"day": "2020-03-01", "avg_value": 35.1}]
        })))
        .mount(&server)
        .await;
    mount_empty_float_endpoints(&server).await;

    let orch = FetchOrchestrator::new(gateway(&server), vec![], 1);
    let stale = orch.refresh(&FilterState::default()).await;
    let current = orch
        .refresh(&FilterState {
            variable: Variable::Salinity,
            ..FilterState::default()
        })
        .await;

    stale.join().await;
    current.join().await;

    let ts = orch.time_series().await;
    assert_eq!(ts.data.len(), 1);
    assert!((ts.data[0].avg_value - 35.1).abs() < f64::EPSILON);
    assert!(!ts.loading);
    assert_eq!(orch.generation(), 2);
}

#[tokio::test]
async fn database_chat_round_trip_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "natural_language_response": "There are 42 ARGO floats in the database.",
            "sql": "SELECT COUNT(DISTINCT float_id) as total_floats FROM argo_profiles",
            "row_count": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = SessionEngine::new(gateway(&server), AiControls::new());
    engine.set_input("How many ARGO floats are active?");
    engine.send().await;

    let transcript = engine.transcript();
    assert_eq!(transcript.len(), 3);
    let reply = transcript.last().unwrap();
    assert_eq!(reply.source, MessageSource::Database);
    assert_eq!(reply.text, "There are 42 ARGO floats in the database.");
    assert_eq!(reply.record_count, Some(1));
}

#[tokio::test]
async fn advanced_route_end_to_end_once_capability_is_loaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ai-status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "loaded"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ai-chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "ai_answer": "The average is roughly 15 degrees Celsius.",
            "model_type": "Fine-tuned Transformers",
            "confidence": "high"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let controls = AiControls::new();
    let poller = CapabilityPoller::new(gateway.clone(), controls.clone());
    poller.probe_once().await;
    assert_eq!(controls.status(), CapabilityStatus::Loaded);

    controls.set_advanced_enabled(true);
    let engine = SessionEngine::new(gateway, controls);
    engine.set_input("What is the average ocean temperature?");
    engine.send().await;

    let reply = engine.transcript().pop().unwrap();
    assert_eq!(reply.source, MessageSource::AdvancedAi);
    assert_eq!(reply.model.as_deref(), Some("Fine-tuned Transformers"));
}
