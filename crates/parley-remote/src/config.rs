use serde::{Deserialize, Serialize};

/// Endpoints of the remote collaborators and how long to wait for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Local staging endpoint (`GET` returns the last tool payload).
    #[serde(default = "default_staging_url")]
    pub staging_url: String,
    /// Session registration webhook.
    #[serde(default = "default_register_url")]
    pub register_url: String,
    /// Session-keyed record lookup; the id is sent as `?sessionId=`.
    #[serde(default = "default_session_fetch_url")]
    pub session_fetch_url: String,
    /// Most recently stored record, regardless of session.
    #[serde(default = "default_latest_fetch_url")]
    pub latest_fetch_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            staging_url: default_staging_url(),
            register_url: default_register_url(),
            session_fetch_url: default_session_fetch_url(),
            latest_fetch_url: default_latest_fetch_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_staging_url() -> String {
    "http://127.0.0.1:3000/api/user-details".to_string()
}
fn default_register_url() -> String {
    "http://127.0.0.1:5678/webhook/register-session".to_string()
}
fn default_session_fetch_url() -> String {
    "http://127.0.0.1:5678/webhook/get-user-data".to_string()
}
fn default_latest_fetch_url() -> String {
    "http://127.0.0.1:5678/webhook/get-latest-user".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_uses_defaults() {
        let config: RemoteConfig = toml::from_str("").unwrap();
        assert_eq!(config.staging_url, "http://127.0.0.1:3000/api/user-details");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn overrides() {
        let config: RemoteConfig = toml::from_str(
            r#"
            latest_fetch_url = "https://wf.example/webhook/get-latest-user"
            request_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.latest_fetch_url, "https://wf.example/webhook/get-latest-user");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.register_url, default_register_url());
    }
}
