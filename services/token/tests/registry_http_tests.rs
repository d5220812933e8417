//! HTTP registry client tests against a mock NRF.

use nrf_access_token::config::{IssuerConfig, JwtAlgorithm};
use nrf_access_token::jwt::SigningKey;
use nrf_access_token::model::{AccessTokenErrorCode, AccessTokenReq};
use nrf_access_token::registry::{HttpRegistry, NfRegistry, NfStatus, RegistryError};
use nrf_access_token::AccessTokenIssuer;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &[u8] = b"registry-test-secret-at-least-32-bytes";

fn client(server: &MockServer) -> HttpRegistry {
    HttpRegistry::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(2)).unwrap()
}

fn profile(id: &str, nf_type: &str, status: &str, services: &[&str]) -> serde_json::Value {
    json!({
        "nfInstanceId": id,
        "nfType": nf_type,
        "nfStatus": status,
        "nfServices": services
            .iter()
            .map(|s| json!({ "serviceName": s }))
            .collect::<Vec<_>>(),
    })
}

#[tokio::test]
async fn test_profile_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nnrf-nfm/v1/nf-instances/producer-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile(
            "producer-1",
            "SMF",
            "REGISTERED",
            &["nsmf-pdusession"],
        )))
        .mount(&server)
        .await;

    let found = client(&server).profile("producer-1").await.unwrap().unwrap();

    assert_eq!(found.nf_instance_id, "producer-1");
    assert_eq!(found.nf_status, NfStatus::Registered);
    assert_eq!(found.service_names(), vec!["nsmf-pdusession".to_string()]);
}

#[tokio::test]
async fn test_profile_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nnrf-nfm/v1/nf-instances/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client(&server).profile("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).profile("producer-1").await.unwrap_err();
    assert!(matches!(err, RegistryError::Unavailable(_)));
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).profile("producer-1").await.unwrap_err();
    assert!(matches!(err, RegistryError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_registry_rejects_instead_of_hanging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile("consumer-1", "AMF", "REGISTERED", &[]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let key = SigningKey::from_secret(JwtAlgorithm::HS256, SECRET).unwrap();
    let issuer = AccessTokenIssuer::new(
        IssuerConfig::new("nrf-1").with_registry_timeout(Duration::from_millis(50)),
        Arc::new(key),
    )
    .with_registry(Arc::new(client(&server)));

    let err = issuer
        .issue(AccessTokenReq::client_credentials("consumer-1", "nsmf-pdusession"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), AccessTokenErrorCode::InvalidClient);
}

#[tokio::test]
async fn test_issuer_narrows_scope_from_remote_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nnrf-nfm/v1/nf-instances/consumer-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile("consumer-1", "AMF", "REGISTERED", &[])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nnrf-nfm/v1/nf-instances/producer-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile(
            "producer-1",
            "SMF",
            "REGISTERED",
            &["nsmf-pdusession"],
        )))
        .mount(&server)
        .await;

    let key = SigningKey::from_secret(JwtAlgorithm::HS256, SECRET).unwrap();
    let issuer = AccessTokenIssuer::new(IssuerConfig::new("nrf-1"), Arc::new(key))
        .with_registry(Arc::new(client(&server)));

    let rsp = issuer
        .issue(
            AccessTokenReq::client_credentials("consumer-1", "nsmf-pdusession nsmf-event-exposure")
                .with_target("producer-1"),
        )
        .await
        .unwrap();

    assert_eq!(rsp.scope, "nsmf-pdusession");
}
