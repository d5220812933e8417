//! HTTP endpoint tests driven through the router without a socket.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use nrf_access_token::config::{IssuerConfig, JwtAlgorithm};
use nrf_access_token::jwt::SigningKey;
use nrf_access_token::registry::{InMemoryRegistry, NfProfile, NfRegistry, RegistryError};
use nrf_access_token::server::{router, PROBLEM_JSON, TOKEN_PATH};
use nrf_access_token::AccessTokenIssuer;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &[u8] = b"http-test-secret-at-least-32-bytes!!";

fn issuer() -> AccessTokenIssuer {
    let key = SigningKey::from_secret(JwtAlgorithm::HS256, SECRET).unwrap();
    AccessTokenIssuer::new(IssuerConfig::new("nrf-1"), Arc::new(key))
}

fn app() -> Router {
    router(Arc::new(issuer()))
}

fn app_with_registry() -> Router {
    let registry = InMemoryRegistry::new([
        NfProfile::registered("consumer-1", "AMF", Vec::<String>::new()),
        NfProfile::registered("producer-1", "NRF", ["nnrf-disc"]),
    ]);
    router(Arc::new(issuer().with_registry(Arc::new(registry))))
}

/// Registry that blows up inside the issuance task.
struct PanickingRegistry;

#[async_trait]
impl NfRegistry for PanickingRegistry {
    async fn profile(&self, _nf_instance_id: &str) -> Result<Option<NfProfile>, RegistryError> {
        panic!("registry state corrupted");
    }
}

async fn post_form(app: Router, body: &'static str) -> (StatusCode, Value) {
    let (status, _, body) = post_form_raw(app, body).await;
    (status, body)
}

async fn post_form_raw(app: Router, body: &'static str) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(TOKEN_PATH)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_granted_returns_200() {
    let (status, body) = post_form(
        app(),
        "grant_type=client_credentials&nfInstanceId=consumer-1&targetNfInstanceId=producer-1&scope=nnrf-disc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 1000);
    assert_eq!(body["scope"], "nnrf-disc");
    assert!(body["access_token"].as_str().is_some_and(|t| t.split('.').count() == 3));
}

#[tokio::test]
async fn test_missing_scope_returns_400() {
    let (status, body) =
        post_form(app(), "grant_type=client_credentials&nfInstanceId=consumer-1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_wrong_grant_type_returns_400() {
    let (status, body) = post_form(
        app(),
        "grant_type=password&nfInstanceId=consumer-1&scope=nnrf-disc",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_non_form_body_returns_400() {
    let request = Request::builder()
        .method("POST")
        .uri(TOKEN_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"nfInstanceId":"consumer-1"}"#))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_aborted_issuance_returns_403() {
    let app = router(Arc::new(issuer().with_registry(Arc::new(PanickingRegistry))));

    let (status, content_type, body) = post_form_raw(
        app,
        "grant_type=client_credentials&nfInstanceId=consumer-1&scope=nnrf-disc",
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(content_type.as_deref(), Some(PROBLEM_JSON));
    assert_eq!(body["status"], 403);
    assert_eq!(body["cause"], "UNSPECIFIED");
}

#[tokio::test]
async fn test_unknown_target_returns_400_invalid_scope() {
    let (status, content_type, body) = post_form_raw(
        app_with_registry(),
        "grant_type=client_credentials&nfInstanceId=consumer-1&targetNfInstanceId=producer-9&scope=nnrf-disc",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["error"], "invalid_scope");
    assert!(body.get("access_token").is_none());
}

#[tokio::test]
async fn test_unknown_consumer_returns_400_invalid_client() {
    let (status, body) = post_form(
        app_with_registry(),
        "grant_type=client_credentials&nfInstanceId=stranger&targetNfInstanceId=producer-1&scope=nnrf-disc",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_client");
}

#[tokio::test]
async fn test_registered_pair_returns_200() {
    let (status, body) = post_form(
        app_with_registry(),
        "grant_type=client_credentials&nfInstanceId=consumer-1&targetNfInstanceId=producer-1&scope=nnrf-disc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scope"], "nnrf-disc");
}

#[tokio::test]
async fn test_get_is_not_allowed() {
    let request = Request::builder()
        .method("GET")
        .uri(TOKEN_PATH)
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
