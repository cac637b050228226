//! In-process tests through the full middleware stack.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use dispatch_core::config::ServerConfig;
use dispatch_core::http::{Controller, ControllerError, X_REQUEST_ID};
use dispatch_core::{HandlerResult, RequestContext, ResponseContext, RouteError};

mod common;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_typed_param_reaches_handler() {
    let response = common::send(&ServerConfig::default(), get("/api/users/42")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert!(response.headers().contains_key(X_REQUEST_ID));
    assert_eq!(common::body_text(response).await, r#"{"id":42}"#);
}

#[tokio::test]
async fn test_nested_params_extracted() {
    let response = common::send(&ServerConfig::default(), get("/api/users/7/posts/99")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_text(response).await, r#"{"post":"99","user":"7"}"#);
}

#[tokio::test]
async fn test_doubled_slashes_select_mounted_controller() {
    for uri in ["//api/users/42", "/api//users/42/"] {
        let response = common::send(&ServerConfig::default(), get(uri)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(common::body_text(response).await, r#"{"id":42}"#);
    }
}

#[tokio::test]
async fn test_unknown_method_is_501() {
    let request = Request::builder()
        .method("PATCH-X")
        .uri("/api/users/42")
        .body(Body::empty())
        .unwrap();
    let response = common::send(&ServerConfig::default(), request).await;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(common::body_text(response).await, "Not Implemented");
}

#[tokio::test]
async fn test_unmatched_path_is_404() {
    for uri in ["/api/users", "/api/users/1/posts", "/apix/users/1", "/nothing"] {
        let response = common::send(&ServerConfig::default(), get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/users/1")
        .body(Body::empty())
        .unwrap();
    let response = common::send(&ServerConfig::default(), request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_typed_param_is_400() {
    let response = common::send(&ServerConfig::default(), get("/api/users/abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=UTF-8"
    );
    assert!(common::body_text(response).await.contains("\"abc\""));
}

#[tokio::test]
async fn test_fault_detail_depends_on_debug() {
    let response = common::send(&ServerConfig::default(), get("/broken")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::body_text(response).await, "Internal Server Error");

    let mut config = ServerConfig::default();
    config.dispatch.debug = true;
    let response = common::send(&config, get("/broken")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = common::body_text(response).await;
    assert!(text.starts_with("Internal Server Error\nparsing upstream port\nCaused by: "));
}

#[tokio::test]
async fn test_json_body_round_trip_and_default_headers() {
    let mut config = ServerConfig::default();
    config
        .dispatch
        .default_headers
        .insert("server".into(), "dispatch-core".into());

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"a": [1, 2]}"#))
        .unwrap();
    let response = common::send(&config, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::SERVER], "dispatch-core");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
    assert_eq!(common::body_text(response).await, r#"{"a":[1,2]}"#);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{"))
        .unwrap();
    let response = common::send(&ServerConfig::default(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let mut config = ServerConfig::default();
    config.listener.max_body_bytes = 8;

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let response = common::send(&config, request).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn test_duplicate_route_names_both_registrations() {
    fn ok(_: &mut RequestContext) -> HandlerResult {
        Ok(ResponseContext::default())
    }

    let err = Controller::builder("accounts", "/")
        .get("/accounts/{id}", ok)
        .get("/accounts/{accountId}", ok)
        .build()
        .unwrap_err();

    match err {
        ControllerError::Route(RouteError::Duplicate {
            pattern,
            existing,
            registrant,
            ..
        }) => {
            assert_eq!(pattern, "/accounts/{accountId}");
            assert_eq!(existing, "/accounts/{id}");
            assert_eq!(registrant, "accounts");
        }
        other => panic!("unexpected error: {other}"),
    }
}
