use crate::client::RemoteClient;
use crate::config::RemoteConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_core::{Envelope, MalformedKind, ParleyError, ParleyResult, SessionId};
use serde::Serialize;
use tracing::{info, warn};

/// Payload announcing a freshly started session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRegistration {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl SessionRegistration {
    pub fn started(session_id: SessionId) -> Self {
        Self {
            session_id,
            timestamp: Utc::now(),
            status: "started".to_string(),
        }
    }
}

/// The remote workflow backend that ultimately stores profile records.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Announce a session. No response contract; callers log failures.
    async fn register(&self, registration: &SessionRegistration) -> ParleyResult<()>;

    /// Record stored for `session_id`.
    async fn fetch_by_session(&self, session_id: &SessionId) -> ParleyResult<Envelope>;

    /// Most recently stored record, any session.
    async fn fetch_latest(&self) -> ParleyResult<Envelope>;
}

/// [`SessionRegistry`] over plain webhooks.
pub struct HttpSessionRegistry {
    client: RemoteClient,
    register_url: String,
    session_fetch_url: String,
    latest_fetch_url: String,
}

impl HttpSessionRegistry {
    pub fn new(client: RemoteClient, config: &RemoteConfig) -> Self {
        Self {
            client,
            register_url: config.register_url.clone(),
            session_fetch_url: config.session_fetch_url.clone(),
            latest_fetch_url: config.latest_fetch_url.clone(),
        }
    }
}

#[async_trait]
impl SessionRegistry for HttpSessionRegistry {
    async fn register(&self, registration: &SessionRegistration) -> ParleyResult<()> {
        let body = serde_json::to_value(registration)?;
        let status = self.client.post_json(&self.register_url, &body).await?;
        if status.is_success() {
            info!(session_id = %registration.session_id, "Session registered");
            Ok(())
        } else {
            warn!(session_id = %registration.session_id, status = %status, "Session registration rejected");
            Err(ParleyError::malformed(MalformedKind::Status, format!("HTTP status {status}")))
        }
    }

    async fn fetch_by_session(&self, session_id: &SessionId) -> ParleyResult<Envelope> {
        self.client
            .get_envelope(&self.session_fetch_url, &[("sessionId", session_id.as_str())])
            .await
    }

    async fn fetch_latest(&self) -> ParleyResult<Envelope> {
        self.client.get_envelope(&self.latest_fetch_url, &[]).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(server: &MockServer) -> HttpSessionRegistry {
        let config = RemoteConfig {
            register_url: format!("{}/webhook/register-session", server.uri()),
            session_fetch_url: format!("{}/webhook/get-user-data", server.uri()),
            latest_fetch_url: format!("{}/webhook/get-latest-user", server.uri()),
            ..RemoteConfig::default()
        };
        HttpSessionRegistry::new(RemoteClient::new(Duration::from_secs(5)).unwrap(), &config)
    }

    #[tokio::test]
    async fn register_posts_camel_case_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/register-session"))
            .and(body_partial_json(json!({"sessionId": "session_1_abc", "status": "started"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let reg = SessionRegistration::started(SessionId::from_raw("session_1_abc"));
        registry(&server).register(&reg).await.unwrap();
    }

    #[tokio::test]
    async fn register_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let reg = SessionRegistration::started(SessionId::generate());
        assert!(registry(&server).register(&reg).await.is_err());
    }

    #[tokio::test]
    async fn fetch_by_session_sends_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/webhook/get-user-data"))
            .and(query_param("sessionId", "session_9_xyz"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"success": true, "data": {"name": "Ana"}}])),
            )
            .mount(&server)
            .await;

        let env = registry(&server)
            .fetch_by_session(&SessionId::from_raw("session_9_xyz"))
            .await
            .unwrap();
        assert_eq!(env.data.unwrap()["name"], "Ana");
    }

    #[tokio::test]
    async fn fetch_latest_failure_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/webhook/get-latest-user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        let err = registry(&server).fetch_latest().await.unwrap_err();
        assert!(matches!(err, ParleyError::Envelope { message: None }));
    }
}
