#![allow(clippy::unwrap_used, clippy::expect_used)]

use parley_core::{ParleyError, ProfileRecord};
use parley_gateway::{StagingServer, StagingStore};
use parley_remote::{HttpStagingClient, RemoteClient, StagingSource};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper: serve the staging routes on a random port, returning the base URL.
async fn start_server(forward_url: Option<&str>) -> (String, Arc<StagingStore>) {
    let store = Arc::new(StagingStore::new());
    let app = StagingServer::build(store.clone(), forward_url);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{}", addr.port()), store)
}

#[tokio::test]
async fn health_reports_service() {
    let (base, _) = start_server(None).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "ok", "service": "parley"}));
}

#[tokio::test]
async fn empty_store_reports_no_data() {
    let (base, _) = start_server(None).await;
    let response = reqwest::get(format!("{base}/api/user-details")).await.unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "message": "No user data found"}));
}

#[tokio::test]
async fn post_unwraps_body_and_get_returns_it() {
    let (base, store) = start_server(None).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/user-details"))
        .json(&json!({"body": {"name": "Sarah Johnson", "email": "sarah@x.com"}}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["success"], true);
    assert_eq!(ack["message"], "User data received successfully");
    assert_eq!(ack["data"]["name"], "Sarah Johnson");

    assert_eq!(store.latest().unwrap()["email"], "sarah@x.com");

    let body: Value = client
        .get(format!("{base}/api/user-details"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!({"name": "Sarah Johnson", "email": "sarah@x.com"}));
}

#[tokio::test]
async fn later_post_replaces_earlier() {
    let (base, _) = start_server(None).await;
    let client = reqwest::Client::new();
    for name in ["Ana", "Bea"] {
        client
            .post(format!("{base}/api/user-details"))
            .json(&json!({"name": name}))
            .send()
            .await
            .unwrap();
    }
    let body: Value = client
        .get(format!("{base}/api/user-details"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"], json!({"name": "Bea"}));
}

#[tokio::test]
async fn malformed_post_is_500() {
    let (base, store) = start_server(None).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/user-details"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"success": false, "error": "Failed to process user data"})
    );
    assert!(store.latest().is_none());
}

#[tokio::test]
async fn staged_record_reads_back_unchanged() {
    let (base, _) = start_server(None).await;
    let staging = HttpStagingClient::new(
        RemoteClient::new(Duration::from_secs(5)).unwrap(),
        format!("{base}/api/user-details"),
    );

    let payload = json!({
        "id": "rec-7",
        "name": "Lee Park",
        "email": "lee@example.com",
        "strengths": ["Mentoring", "Systems thinking"],
        "career_focus": ["Platform engineering"]
    });
    staging.submit(&json!({ "body": payload.clone() })).await.unwrap();

    let envelope = staging.fetch_latest().await.unwrap();
    let fetched = ProfileRecord::from_json(&envelope.data.unwrap()).unwrap();
    assert_eq!(fetched, ProfileRecord::from_json(&payload).unwrap());
}

#[tokio::test]
async fn staging_client_sees_miss_as_envelope_failure() {
    let (base, _) = start_server(None).await;
    let staging = HttpStagingClient::new(
        RemoteClient::new(Duration::from_secs(5)).unwrap(),
        format!("{base}/api/user-details"),
    );
    match staging.fetch_latest().await.unwrap_err() {
        ParleyError::Envelope { message } => {
            assert_eq!(message.as_deref(), Some("No user data found"))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn post_is_forwarded_whole() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/user-details"))
        .and(body_partial_json(json!({"body": {"name": "Ana"}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let forward = format!("{}/webhook/user-details", upstream.uri());
    let (base, _) = start_server(Some(&forward)).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/user-details"))
        .json(&json!({"body": {"name": "Ana"}}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn forward_failure_is_swallowed() {
    let (base, store) = start_server(Some("http://127.0.0.1:1/unreachable")).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/user-details"))
        .json(&json!({"name": "Ana"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(store.latest(), Some(json!({"name": "Ana"})));
}
