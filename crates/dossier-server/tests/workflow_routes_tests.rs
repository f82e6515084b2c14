//! Integration tests for workflow routes
//!
//! Drive the full router with `oneshot`, backed by the built-in catalog
//! pointed at a mock provider server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use dossier_engine::{catalog, EngineConfig};
use dossier_server::{config::Config, create_router, features::FeatureState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_router(base_url: &str) -> Router {
    let config = EngineConfig::with_base_url(base_url);
    let orchestrator = catalog::default_orchestrator(&config).unwrap();
    create_router(FeatureState::new(orchestrator), &Config::default())
}

async fn send(app: &Router, verb: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(verb).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_network_world(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/uniprotkb/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [{
            "primaryAccession": "P00533",
            "uniProtkbId": "EGFR_HUMAN",
            "organism": {"scientificName": "Homo sapiens"},
            "proteinDescription": {
                "recommendedName": {"fullName": {"value": "Epidermal growth factor receptor"}}
            },
            "genes": [{"geneName": {"value": "EGFR"}}],
            "sequence": {"length": 1210}
        }]})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/json/interaction_partners"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"preferredName_A": "EGFR", "preferredName_B": "GRB2",
             "stringId_B": "9606.ENSP00000317272",
             "score": 0.999, "escore": 0.99, "dscore": 0.9, "tscore": 0.95}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health_and_listing() {
    let app = test_router("http://127.0.0.1:9");

    let response = send(&app, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["workflows"], 2);

    let response = send(&app, Method::GET, "/api/v1/workflows", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["meta"]["count"], 2);
    assert_eq!(body["data"][0]["name"], catalog::GENE_REPORT);
    assert_eq!(body["data"][0]["stage"], "stage_1");
}

#[tokio::test]
async fn test_stage_violation_is_a_conflict() {
    let app = test_router("http://127.0.0.1:9");

    let response = send(
        &app,
        Method::POST,
        "/api/v1/workflows/gene_report/search-param",
        Some(json!({"value": "EGFR"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "STAGE_VIOLATION");
    assert_eq!(body["error"]["details"]["current"], "stage_1");
    assert_eq!(body["error"]["details"]["required"], "stage_2");
    assert_eq!(body["error"]["details"]["operation"], "set_search_param");

    // nothing moved
    let stage = send(&app, Method::GET, "/api/v1/workflows/gene_report/stage", None).await;
    let body = body_json(stage).await;
    assert_eq!(body["data"]["stage"], "stage_1");
}

#[tokio::test]
async fn test_unknown_workflow() {
    let app = test_router("http://127.0.0.1:9");

    let response = send(&app, Method::POST, "/api/v1/workflows/ghost/stage-2", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "WORKFLOW_NOT_FOUND");

    let response = send(&app, Method::GET, "/api/v1/workflows/ghost/steps", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));

    let response = send(&app, Method::GET, "/api/v1/workflows/ghost/stage", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_configuration_errors() {
    let app = test_router("http://127.0.0.1:9");
    send(&app, Method::POST, "/api/v1/workflows/gene_report/stage-2", None).await;

    let response = send(
        &app,
        Method::POST,
        "/api/v1/workflows/gene_report/optional-method",
        Some(json!({"step": "uniprot", "method": "not_a_method"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "METHOD_NOT_FOUND");

    let response = send(
        &app,
        Method::POST,
        "/api/v1/workflows/gene_report/search-param",
        Some(json!({"value": "   "})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        Method::POST,
        "/api/v1/workflows/gene_report/filter",
        Some(json!({"step": "string", "method": "interaction_partners"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_filters_reflect_customisation() {
    let app = test_router("http://127.0.0.1:9");
    send(&app, Method::POST, "/api/v1/workflows/gene_report/stage-2", None).await;

    let response = send(
        &app,
        Method::POST,
        "/api/v1/workflows/gene_report/optional-method",
        Some(json!({"step": "uniprot", "method": "keywords", "options": {"limit": 5}})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::GET, "/api/v1/workflows/gene_report/filters", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let methods = body["data"]["uniprot"]["METODOS_PARSER"].as_array().unwrap();
    let keywords = methods.iter().find(|m| m["NOMBRE_METODO"] == "keywords").unwrap();
    assert_eq!(keywords["FILTROS_METODO_PARSER"]["limit"], 5);
}

#[tokio::test]
async fn test_reset_returns_to_discovery() {
    let app = test_router("http://127.0.0.1:9");
    send(&app, Method::POST, "/api/v1/workflows/gene_report/stage-2", None).await;

    let response = send(&app, Method::POST, "/api/v1/workflows/gene_report/reset", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["stage"], "stage_1");

    let response = send(&app, Method::GET, "/api/v1/workflows/gene_report/filters", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_full_cycle_over_http() {
    let server = MockServer::start().await;
    mount_network_world(&server).await;
    let app = test_router(&server.uri());
    let base = "/api/v1/workflows/interaction_network";

    let steps = body_json(send(&app, Method::GET, &format!("{base}/steps"), None).await).await;
    assert_eq!(steps["data"].as_array().unwrap().len(), 2);

    assert_eq!(
        send(&app, Method::POST, &format!("{base}/stage-2"), None).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        send(
            &app,
            Method::POST,
            &format!("{base}/search-param"),
            Some(json!({"value": " EGFR "}))
        )
        .await
        .status(),
        StatusCode::OK
    );
    assert_eq!(
        send(&app, Method::POST, &format!("{base}/stage-3"), None).await.status(),
        StatusCode::OK
    );

    let response = send(&app, Method::POST, &format!("{base}/start"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let report = &body["data"];
    assert_eq!(report["search_term"], "EGFR");

    let categories = report["categories"].as_array().unwrap();
    assert_eq!(categories[0]["title"], "Query protein");
    assert_eq!(categories[0]["content"][0]["data"][0]["accession"], "P00533");

    let network = categories[1]["content"].as_array().unwrap();
    let partners = network.iter().find(|item| item["title"] == "Interaction partners").unwrap();
    assert_eq!(partners["data"][0]["partner"], "GRB2");
    assert_eq!(partners["data"][0]["protein_name"], "Epidermal growth factor receptor");

    let stage = body_json(send(&app, Method::GET, &format!("{base}/stage"), None).await).await;
    assert_eq!(stage["data"]["stage"], "stage_1");
}

#[tokio::test]
async fn test_provider_status_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let app = test_router(&server.uri());

    let uri = "/api/v1/workflows/interaction_network/status";
    let response = send(&app, Method::GET, uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["providers"]["string"], 200);
    // no mock for the uniprot ping path
    assert_eq!(body["data"]["providers"]["uniprot"], 404);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_run_does_not_block_health_or_other_workflows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uniprotkb/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let app = test_router(&server.uri());
    let base = "/api/v1/workflows/interaction_network";

    send(&app, Method::POST, &format!("{base}/stage-2"), None).await;
    let search = Some(json!({"value": "EGFR"}));
    send(&app, Method::POST, &format!("{base}/search-param"), search).await;
    send(&app, Method::POST, &format!("{base}/stage-3"), None).await;

    let running = tokio::spawn({
        let app = app.clone();
        async move { send(&app, Method::POST, &format!("{base}/start"), None).await }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;

    let health = send(&app, Method::GET, "/health", None);
    let health = tokio::time::timeout(Duration::from_secs(1), health)
        .await
        .expect("health check waited on a running workflow");
    assert_eq!(health.status(), StatusCode::OK);

    let steps = tokio::time::timeout(
        Duration::from_secs(1),
        send(&app, Method::GET, "/api/v1/workflows/gene_report/steps", None),
    )
    .await
    .expect("discovery of another workflow waited on a running workflow");
    assert_eq!(steps.status(), StatusCode::OK);
    assert!(!body_json(steps).await["data"].as_array().unwrap().is_empty());

    assert!(!running.is_finished());
    assert_eq!(running.await.unwrap().status(), StatusCode::OK);
}
