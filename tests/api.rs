//! Router-level tests: authentication, parameter validation, and the shape
//! of the query envelope.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use metrics_query_simulator::api::{build_router, AppState};
use metrics_query_simulator::config::Credentials;

const API_KEY: &str = "test-api-key";
const APP_KEY: &str = "test-app-key";

fn test_router(seed: Option<u64>) -> Router {
    build_router(AppState {
        credentials: Credentials {
            api_key: API_KEY.to_string(),
            application_key: APP_KEY.to_string(),
        },
        seed,
    })
}

fn authed(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("DD-API-KEY", API_KEY)
        .header("DD-APPLICATION-KEY", APP_KEY)
        .body(Body::empty())
        .unwrap()
}

async fn send(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_needs_no_keys() {
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(test_router(None), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "healthy" }));
}

#[tokio::test]
async fn validate_accepts_configured_keys() {
    let (status, body) = send(test_router(None), authed("/api/v1/validate")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "valid": true }));
}

#[tokio::test]
async fn missing_keys_are_forbidden() {
    let req = Request::builder()
        .uri("/api/v1/validate")
        .header("DD-API-KEY", API_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_router(None), req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        serde_json::json!({ "errors": ["API key and application key are required"] })
    );
}

#[tokio::test]
async fn wrong_keys_are_forbidden() {
    let req = Request::builder()
        .uri("/api/v1/query?from=0&to=100&query=avg:cpu%7Bhost:a%7D")
        .header("DD-API-KEY", "wrong")
        .header("DD-APPLICATION-KEY", APP_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_router(None), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"][0], "Invalid API key");

    let req = Request::builder()
        .uri("/api/v1/validate")
        .header("DD-API-KEY", API_KEY)
        .header("DD-APPLICATION-KEY", "wrong")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_router(None), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"][0], "Invalid application key");
}

#[tokio::test]
async fn missing_parameters_are_bad_request() {
    for uri in [
        "/api/v1/query",
        "/api/v1/query?from=0&to=100",
        "/api/v1/query?from=0&query=cpu%7Bhost:a%7D",
        "/api/v1/query?from=yesterday&to=100&query=cpu%7Bhost:a%7D",
        "/api/v1/query?from=0&to=100&query=",
    ] {
        let (status, body) = send(test_router(None), authed(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            body["errors"][0], "Missing required parameters: from, to, query",
            "{uri}"
        );
    }
}

#[tokio::test]
async fn invalid_query_format_is_bad_request() {
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=0&to=100&query=no-braces-here"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "errors": ["Invalid query format"] }));
}

#[tokio::test]
async fn invalid_interval_is_bad_request() {
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=0&to=100&query=cpu%7Bhost:a%7D&interval=soon"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0].as_str().unwrap().starts_with("Invalid parameter: interval"));
}

#[test_log::test(tokio::test)]
async fn query_fans_out_by_instance() {
    let uri = "/api/v1/query?from=1764658800&to=1764662400\
               &query=avg:processor.time%7Bhost:AH-CW-AP-104%7D%20by%20%7Bhost,instance%7D";
    let (status, body) = send(test_router(Some(1)), authed(uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["res_type"], "time_series");
    assert_eq!(body["resp_version"], 1);
    assert_eq!(
        body["query"],
        "avg:processor.time{host:AH-CW-AP-104} by {host,instance}"
    );
    assert_eq!(body["from_date"], 1_764_658_800_000i64);
    assert_eq!(body["to_date"], 1_764_662_400_000i64);
    assert_eq!(body["group_by"], serde_json::json!(["host", "instance"]));
    assert_eq!(body["values"], serde_json::json!([]));
    assert_eq!(body["message"], "");

    let series = body["series"].as_array().unwrap();
    assert_eq!(series.len(), 4);
    for (id, s) in series.iter().enumerate() {
        assert_eq!(s["scope"], format!("host:AH-CW-AP-104,instance:{id}"));
        assert_eq!(
            s["expression"],
            format!("avg:processor.time{{host:AH-CW-AP-104,instance:{id}}}")
        );
        assert_eq!(s["interval"], 20);
        // One hour at 20s steps, both ends inclusive.
        assert_eq!(s["length"], 181);
        assert_eq!(s["pointlist"].as_array().unwrap().len(), 181);
        assert_eq!(s["start"], 1_764_658_800_000i64);
        assert_eq!(s["end"], 1_764_662_400_000i64);
    }
}

#[tokio::test]
async fn query_without_instance_returns_one_series() {
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=0&to=100&query=sum:mem%7Bhost:a%7D"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let series = body["series"].as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["tag_set"], serde_json::json!(["host:a"]));
    assert_eq!(series[0]["aggr"], "sum");
    assert_eq!(series[0]["length"], 6);
    assert!(series[0]["unit"].is_null());
}

#[tokio::test]
async fn double_encoded_query_is_decoded() {
    // `{` sent as %257B decodes to %7B in the extractor, then to `{`.
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=0&to=40&query=avg:cpu%257Bhost:a%257D"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "avg:cpu{host:a}");
}

#[tokio::test]
async fn interval_override_changes_spacing() {
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=0&to=120&query=cpu%7Bhost:a%7D&interval=60"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let points = body["series"][0]["pointlist"].as_array().unwrap();
    let timestamps: Vec<f64> = points.iter().map(|p| p[0].as_f64().unwrap()).collect();
    assert_eq!(timestamps, vec![0.0, 60_000.0, 120_000.0]);
    assert_eq!(body["series"][0]["interval"], 60);
}

#[tokio::test]
async fn inverted_range_yields_empty_pointlists() {
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=200&to=100&query=cpu%7Bhost:a%7D"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["series"][0]["length"], 0);
    assert_eq!(body["series"][0]["pointlist"], serde_json::json!([]));
}

#[tokio::test]
async fn seeded_router_is_reproducible() {
    let uri = "/api/v1/query?from=0&to=600&query=avg:cpu%7Bhost:a%7D%20by%20%7Binstance%7D";
    let (_, first) = send(test_router(Some(42)), authed(uri)).await;
    let (_, second) = send(test_router(Some(42)), authed(uri)).await;

    assert_eq!(first["series"], second["series"]);
}

#[tokio::test]
async fn unknown_endpoint_is_not_found() {
    let (status, body) = send(test_router(None), authed("/api/v2/nothing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "errors": ["Endpoint not found"] }));
}

#[tokio::test]
async fn metrics_endpoint_renders_text() {
    let router = test_router(None);
    let _ = send(
        router.clone(),
        authed("/api/v1/query?from=0&to=100&query=cpu%7Bhost:a%7D"),
    )
    .await;

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("requests_total"));
    assert!(text.contains("series_generated_total"));
}

#[tokio::test]
async fn repeated_parameter_is_bad_request_with_error_body() {
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=0&from=5&to=100&query=cpu%7Bhost:a%7D"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["errors"][0].as_str().unwrap();
    assert!(message.starts_with("Invalid parameter:"), "{message}");
    assert!(message.contains("duplicate field"), "{message}");
}

#[tokio::test]
async fn wrong_method_is_method_not_allowed_with_error_body() {
    for uri in ["/api/v1/query?from=0&to=100&query=cpu%7Bhost:a%7D", "/api/v1/validate"] {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("DD-API-KEY", API_KEY)
            .header("DD-APPLICATION-KEY", APP_KEY)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_router(None), req).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert_eq!(body, serde_json::json!({ "errors": ["Method not allowed"] }), "{uri}");
    }

    let req = Request::builder()
        .method("DELETE")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_router(None), req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["errors"][0], "Method not allowed");
}

#[tokio::test]
async fn zero_interval_reports_one_second_step() {
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=0&to=3&query=cpu%7Bhost:a%7D&interval=0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["series"][0]["interval"], 1);
    let points = body["series"][0]["pointlist"].as_array().unwrap();
    let timestamps: Vec<f64> = points.iter().map(|p| p[0].as_f64().unwrap()).collect();
    assert_eq!(timestamps, vec![0.0, 1_000.0, 2_000.0, 3_000.0]);
}

#[tokio::test]
async fn oversized_range_is_refused() {
    let (status, body) = send(
        test_router(None),
        authed("/api/v1/query?from=0&to=1000000000000&query=avg:cpu%7Bhost:a%7D%20by%20%7Binstance%7D"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["errors"][0].as_str().unwrap();
    assert!(message.contains("exceeds the limit"), "{message}");
}
