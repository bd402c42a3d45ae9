mod common;

use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use predict_diabetes::config::ServeConfig;
use predict_diabetes::run_pipeline;
use predict_diabetes::serve::router;
use serde_json::Value;
use tower::ServiceExt;

use common::pipeline_config;

const BOUNDARY: &str = "diabetes-test-boundary";

const SCENARIO_ROW: &str = r#"{"age": 45, "gender": "F", "ethnicity": "Caucasian",
    "height": 165, "weight": 70, "aids": 0, "cirrhosis": 0, "hepatic_failure": 0,
    "immunosuppression": 0, "leukemia": 0, "lymphoma": 0,
    "solid_tumor_with_metastasis": 0}"#;

fn multipart_request(field: &str, payload: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"sample.json\"\r\n\
         Content-Type: application/json\r\n\
         \r\n\
         {payload}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn trained_app(dir: &std::path::Path) -> Router {
    let config = pipeline_config(dir);
    run_pipeline(&config).unwrap();
    router(&ServeConfig {
        model_path: config.model_path,
        ..ServeConfig::default()
    })
}

#[tokio::test]
async fn scenario_row_gets_a_binary_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let app = trained_app(dir.path());

    let (status, body) = call(app, multipart_request("file", SCENARIO_ROW)).await;

    assert_eq!(status, StatusCode::OK);
    let prediction = body["prediction"].as_array().unwrap();
    assert_eq!(prediction.len(), 1);
    let label = prediction[0].as_i64().unwrap();
    assert!(label == 0 || label == 1);
}

#[tokio::test]
async fn row_missing_a_demographic_is_unprocessable() {
    let dir = tempfile::tempdir().unwrap();
    let app = trained_app(dir.path());
    let row = r#"{"age": 45, "ethnicity": "Caucasian", "height": 165, "weight": 70}"#;

    let (status, body) = call(app, multipart_request("file", row)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
    assert!(body["error"].as_str().unwrap().contains("rejected"));
}

#[tokio::test]
async fn missing_model_is_a_server_error() {
    let app = router(&ServeConfig {
        model_path: PathBuf::from("definitely/not/here.json"),
        ..ServeConfig::default()
    });

    let (status, body) = call(app, multipart_request("file", SCENARIO_ROW)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
}

#[tokio::test]
async fn wrong_field_name_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = trained_app(dir.path());

    let (status, body) = call(app, multipart_request("upload", SCENARIO_ROW)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = trained_app(dir.path());

    let (status, _) = call(app, multipart_request("file", "{\"age\": ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router(&ServeConfig::default());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
