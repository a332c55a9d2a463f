use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Wait after disconnect before extracting, so a straggling tool
    /// invocation can still land.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// How many of the most recent agent turns the transcript heuristics scan.
    #[serde(default = "default_transcript_window")]
    pub transcript_window: usize,
}

impl ExtractionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            transcript_window: default_transcript_window(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_transcript_window() -> usize {
    10
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let config: ExtractionConfig = toml::from_str("").unwrap();
        assert_eq!(config.settle_delay(), Duration::from_secs(2));
        assert_eq!(config.transcript_window, 10);
    }

    #[test]
    fn partial_override() {
        let config: ExtractionConfig = toml::from_str("settle_delay_ms = 50").unwrap();
        assert_eq!(config.settle_delay_ms, 50);
        assert_eq!(config.transcript_window, 10);
    }
}
