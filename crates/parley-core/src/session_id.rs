use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier allocated on every session start.
///
/// Rendered as `session_<unix-millis>_<9 alphanumerics>`; the middle segment
/// doubles as a short label for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Allocate a fresh identifier.
    pub fn generate() -> Self {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
        Self(format!("session_{}_{suffix}", Utc::now().timestamp_millis()))
    }

    /// Wrap an identifier received from elsewhere (CLI flag, remote store).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The full identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The timestamp segment, or the whole id when it does not follow the
    /// generated format.
    pub fn short_label(&self) -> &str {
        self.0.split('_').nth(1).unwrap_or(&self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
