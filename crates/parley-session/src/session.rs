use chrono::{DateTime, Utc};
use parley_core::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Ended,
    Failed,
}

impl SessionState {
    /// A session in this state holds the live channel.
    pub fn is_live(self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Active)
    }

    /// A new session may start from this state.
    pub fn can_start(self) -> bool {
        !self.is_live()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Active => "active",
            SessionState::Ended => "ended",
            SessionState::Failed => "failed",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub state: SessionState,
    /// Handle the dialogue engine returned for the conversation.
    #[serde(default)]
    pub handle: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::Connecting,
            handle: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn transition(&mut self, to: SessionState) {
        if matches!(to, SessionState::Ended | SessionState::Failed) && self.ended_at.is_none() {
            self.ended_at = Some(Utc::now());
        }
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_connecting() {
        let session = Session::new(SessionId::generate());
        assert_eq!(session.state, SessionState::Connecting);
        assert!(session.ended_at.is_none());
    }

    #[test]
    fn terminal_transitions_stamp_end_once() {
        let mut session = Session::new(SessionId::generate());
        session.transition(SessionState::Active);
        assert!(session.ended_at.is_none());
        session.transition(SessionState::Ended);
        let ended = session.ended_at;
        assert!(ended.is_some());
        session.transition(SessionState::Failed);
        assert_eq!(session.ended_at, ended);
    }

    #[test]
    fn start_is_rejected_only_while_live() {
        assert!(SessionState::Idle.can_start());
        assert!(SessionState::Ended.can_start());
        assert!(SessionState::Failed.can_start());
        assert!(!SessionState::Connecting.can_start());
        assert!(!SessionState::Active.can_start());
    }
}
