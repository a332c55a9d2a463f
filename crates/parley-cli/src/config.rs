use parley_extract::ExtractionConfig;
use parley_gateway::ServerConfig;
use parley_remote::RemoteConfig;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Environment variable that overrides `agent_id`.
pub const AGENT_ID_ENV: &str = "PARLEY_AGENT_ID";

/// Contents of `parley.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParleyConfig {
    /// Dialogue agent to converse with.
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Conversation relay WebSocket URL.
    #[serde(default = "default_channel_url")]
    pub url: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: default_channel_url(),
        }
    }
}

fn default_channel_url() -> String {
    "ws://127.0.0.1:8765/conversation".to_string()
}

impl ParleyConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                String::new()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        };
        let mut config: ParleyConfig = toml::from_str(&text)?;
        config.apply_agent_override(std::env::var(AGENT_ID_ENV).ok());
        Ok(config)
    }

    /// A non-blank override replaces the configured agent id.
    pub fn apply_agent_override(&mut self, value: Option<String>) {
        if let Some(agent_id) = value.filter(|v| !v.trim().is_empty()) {
            self.agent_id = agent_id.trim().to_string();
        }
    }
}
