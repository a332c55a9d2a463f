use crate::client::RemoteClient;
use async_trait::async_trait;
use parley_core::{Envelope, ParleyError, ParleyResult};

/// Read side of the local staging endpoint.
#[async_trait]
pub trait StagingSource: Send + Sync {
    /// The last record written to staging.
    async fn fetch_latest(&self) -> ParleyResult<Envelope>;
}

/// HTTP client for the staging endpoint served by `parley-gateway`.
pub struct HttpStagingClient {
    client: RemoteClient,
    url: String,
}

impl HttpStagingClient {
    pub fn new(client: RemoteClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Write a tool-invocation payload to staging, as the agent's webhook would.
    pub async fn submit(&self, payload: &serde_json::Value) -> ParleyResult<Envelope> {
        let request = self.client.http().post(&self.url).json(payload);
        self.client.fetch_envelope(request).await
    }
}

#[async_trait]
impl StagingSource for HttpStagingClient {
    async fn fetch_latest(&self) -> ParleyResult<Envelope> {
        self.client.get_envelope(&self.url, &[]).await
    }
}

/// A staging source that never has anything, for setups without the
/// local endpoint.
pub struct NoStaging;

#[async_trait]
impl StagingSource for NoStaging {
    async fn fetch_latest(&self) -> ParleyResult<Envelope> {
        Err(ParleyError::Envelope {
            message: Some("staging disabled".to_string()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_latest_reads_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user-details"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": {"name": "Ana"}})),
            )
            .mount(&server)
            .await;

        let staging = HttpStagingClient::new(
            RemoteClient::new(Duration::from_secs(5)).unwrap(),
            format!("{}/api/user-details", server.uri()),
        );
        let env = staging.fetch_latest().await.unwrap();
        assert_eq!(env.data.unwrap()["name"], "Ana");
    }

    #[tokio::test]
    async fn no_staging_always_misses() {
        assert!(NoStaging.fetch_latest().await.is_err());
    }
}
