use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a [`TranscriptTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    /// The human on the microphone (or typing).
    User,
    /// The remote dialogue agent.
    Agent,
}

impl Speaker {
    /// Map a live-channel `source` tag: only `"user"` is the user.
    pub fn from_source(source: &str) -> Self {
        if source == "user" {
            Speaker::User
        } else {
            Speaker::Agent
        }
    }
}

/// A single turn of the conversation. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    /// Author of the turn.
    pub speaker: Speaker,
    /// What was said.
    pub text: String,
    /// When the turn was received.
    pub timestamp: DateTime<Utc>,
}

impl TranscriptTurn {
    /// Creates a turn stamped with the current time.
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a [`Speaker::User`] turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    /// Creates a [`Speaker::Agent`] turn.
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Speaker::Agent, text)
    }
}
