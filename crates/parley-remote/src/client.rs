use parley_core::{Envelope, MalformedKind, ParleyError, ParleyResult};
use std::time::Duration;
use tracing::{debug, info};

/// Envelope-validated HTTP fetch-and-decode shared by every remote lookup.
///
/// A call fails with
/// - [`ParleyError::Transport`] when the request cannot complete,
/// - [`ParleyError::MalformedResponse`] on a non-2xx status, a non-JSON
///   content type, an empty body or unparseable JSON,
/// - [`ParleyError::Envelope`] when the envelope's success flag is false.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
}

impl RemoteClient {
    pub fn new(timeout: Duration) -> ParleyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ParleyError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// The underlying HTTP client, for requests that skip envelope handling.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// `GET url` with optional query pairs and decode the envelope.
    pub async fn get_envelope(&self, url: &str, query: &[(&str, &str)]) -> ParleyResult<Envelope> {
        info!(url = %url, "Remote fetch");
        self.fetch_envelope(self.http.get(url).query(query)).await
    }

    /// Send `request` and decode a successful envelope from the response.
    pub async fn fetch_envelope(&self, request: reqwest::RequestBuilder) -> ParleyResult<Envelope> {
        let response = request
            .send()
            .await
            .map_err(|e| ParleyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParleyError::malformed(MalformedKind::Status, format!("HTTP status {status}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("application/json") {
            return Err(ParleyError::malformed(
                MalformedKind::NotJson,
                format!("response is not JSON (content-type: {content_type:?})"),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ParleyError::Transport(format!("failed to read body: {e}")))?;
        debug!(body = %text, "Remote response body");
        if text.trim().is_empty() {
            return Err(ParleyError::malformed(MalformedKind::Empty, "empty response from server"));
        }

        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            ParleyError::malformed(MalformedKind::InvalidJson, format!("invalid JSON: {e}"))
        })?;
        Envelope::from_json(value)?.require_success()
    }

    /// `POST` a JSON body and return the status, without envelope handling.
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> ParleyResult<reqwest::StatusCode> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ParleyError::Transport(e.to_string()))?;
        Ok(response.status())
    }
}
