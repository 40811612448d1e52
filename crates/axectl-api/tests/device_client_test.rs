#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use axectl_api::{DeviceClient, Error, TransportConfig, endpoints};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DeviceClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = DeviceClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── System info ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_system_info() {
    let (server, client) = setup().await;

    let body = json!({
        "ASICModel": "BM1370",
        "frequency": 525,
        "coreVoltage": 1150,
        "hashRate": 1021.7,
        "bestDiff": "4.29G",
        "hostname": "bitaxe",
        "overclockEnabled": 0
    });

    Mock::given(method("GET"))
        .and(path("/api/system/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let info = client.get_system_info().await.unwrap();

    assert_eq!(info["ASICModel"], "BM1370");
    assert_eq!(info["frequency"], 525);
    assert_eq!(info["hostname"], "bitaxe");
    assert_eq!(info.len(), 7);
}

#[tokio::test]
async fn test_get_system_info_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/system/info"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client.get_system_info().await;

    match result {
        Err(Error::Status { status, body, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_get_system_info_malformed_json() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/system/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"ASICModel\": "))
        .mount(&server)
        .await;

    let result = client.get_system_info().await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_get_system_info_rejects_non_object() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/system/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    match client.get_system_info().await {
        Err(Error::Deserialization { message, .. }) => {
            assert!(message.contains("an array"), "unexpected message: {message}");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_get_system_info_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/system/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig::default().with_timeout(Duration::from_millis(50));
    let client = DeviceClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    let result = client.get_system_info().await;

    assert!(
        matches!(result, Err(Error::Timeout { .. })),
        "expected Timeout error, got: {result:?}"
    );
    assert!(result.unwrap_err().is_transient());
}

#[tokio::test]
async fn test_connection_refused() {
    // Reserve a free port, then release it so nothing listens there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");
    let client = DeviceClient::with_client(reqwest::Client::new(), Url::parse(&uri).unwrap());

    let err = client.get_system_info().await.unwrap_err();

    assert!(err.is_connect(), "expected connect error, got: {err:?}");
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_patch_system_sends_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/system"))
        .and(body_json(json!({ "frequency": 550 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = serde_json::Map::new();
    fields.insert("frequency".into(), json!(550));

    client.patch_system(&fields).await.unwrap();
}

#[tokio::test]
async fn test_patch_system_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/system"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid value"))
        .mount(&server)
        .await;

    let mut fields = serde_json::Map::new();
    fields.insert("fanspeed".into(), json!(250));

    let err = client.patch_system(&fields).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_restart_and_identify() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(endpoints::RESTART))
        .respond_with(ResponseTemplate::new(200).set_body_string("System will restart shortly."))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(endpoints::IDENTIFY))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.restart().await.unwrap();
    client.identify().await.unwrap();
}
