use crate::config::ServerConfig;
use crate::store::StagingStore;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

const FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state for the staging handlers.
pub struct AppState {
    pub store: Arc<StagingStore>,
    pub forwarder: Option<Forwarder>,
}

/// Best-effort relay of staged payloads to the workflow backend.
pub struct Forwarder {
    http: reqwest::Client,
    url: String,
}

impl Forwarder {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(FORWARD_TIMEOUT).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Relay `payload`. Failures are logged and swallowed.
    pub async fn relay(&self, payload: &Value) {
        match self.http.post(&self.url).json(payload).send().await {
            Ok(response) => info!(url = %self.url, status = %response.status(), "Forwarded staged payload"),
            Err(e) => warn!(url = %self.url, error = %e, "Failed to forward staged payload"),
        }
    }
}

/// The local staging endpoint.
pub struct StagingServer;

impl StagingServer {
    /// Routes over `store`, relaying to `forward_url` when set.
    pub fn build(store: Arc<StagingStore>, forward_url: Option<&str>) -> Router {
        let forwarder = forward_url.and_then(|url| match Forwarder::new(url) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!(url = %url, error = %e, "Forwarding disabled");
                None
            }
        });
        let state = Arc::new(AppState { store, forwarder });

        Router::new()
            .route("/api/user-details", get(fetch_handler).post(submit_handler))
            .route("/health", get(health_handler))
            .with_state(state)
    }

    /// Bind `config.bind_addr()` and serve until the process stops.
    pub async fn serve(config: &ServerConfig, store: Arc<StagingStore>) -> std::io::Result<()> {
        let app = Self::build(store, config.forward_url.as_deref());
        let listener = TcpListener::bind(config.bind_addr()).await?;
        info!(addr = %listener.local_addr()?, "Staging endpoint listening");
        axum::serve(listener, app).await
    }
}

/// The record to stage: the nested `body` when the caller sent one.
pub fn staged_record(payload: &Value) -> Value {
    match payload.get("body") {
        Some(body) if !body.is_null() => body.clone(),
        _ => payload.clone(),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "parley"}))
}

/// `POST /api/user-details`: stage a tool-invocation payload.
async fn submit_handler(State(state): State<Arc<AppState>>, body: String) -> impl IntoResponse {
    let payload: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "Error processing user details");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": "Failed to process user data"})),
            );
        }
    };
    debug!(payload = %payload, "Received user details");

    let record = staged_record(&payload);
    state.store.write(record.clone());
    info!("Stored user details");

    if let Some(forwarder) = &state.forwarder {
        forwarder.relay(&payload).await;
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "User data received successfully",
            "data": record,
        })),
    )
}

/// `GET /api/user-details`: the last staged record.
async fn fetch_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.latest() {
        Some(data) => {
            debug!(data = %data, "Returning staged user details");
            Json(json!({"success": true, "data": data}))
        }
        None => Json(json!({"success": false, "message": "No user data found"})),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_body_is_unwrapped() {
        let payload = json!({"body": {"name": "Ana"}, "tool": "user-details"});
        assert_eq!(staged_record(&payload), json!({"name": "Ana"}));
    }

    #[test]
    fn flat_payload_is_kept() {
        let payload = json!({"name": "Ana", "email": "ana@x.co"});
        assert_eq!(staged_record(&payload), payload);
    }

    #[test]
    fn null_body_falls_back_to_payload() {
        let payload = json!({"body": null, "name": "Ana"});
        assert_eq!(staged_record(&payload), payload);
    }
}
