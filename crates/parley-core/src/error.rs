use thiserror::Error;

/// A convenience `Result` alias using [`ParleyError`].
pub type ParleyResult<T> = Result<T, ParleyError>;

/// Top-level error type for Parley.
///
/// Remote-fetch failures (`Transport`, `MalformedResponse`, `Envelope`) are
/// never fatal to extraction: the pipeline downgrades them to a miss for the
/// strategy that produced them.
#[derive(Error, Debug)]
pub enum ParleyError {
    /// Microphone capability was refused; a session cannot start.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Connect, disconnect or volume failure on the live channel.
    #[error("Channel error: {0}")]
    Channel(String),

    /// The remote call itself could not complete.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote answered, but not with a usable JSON body.
    #[error("Malformed response: {detail}")]
    MalformedResponse {
        /// Which check the response failed.
        kind: MalformedKind,
        /// Human-readable detail for logs.
        detail: String,
    },

    /// The envelope reported `success: false`.
    #[error("Envelope failure: {}", message.as_deref().unwrap_or("no message"))]
    Envelope {
        /// The envelope's `message`, when it carried one.
        message: Option<String>,
    },

    /// Session lifecycle misuse (e.g. starting while a session is live).
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration parsing or validation failure.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a remote response was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// Non-2xx HTTP status.
    Status,
    /// The content type is not JSON.
    NotJson,
    /// Empty body or empty response array.
    Empty,
    /// The body is not parseable JSON.
    InvalidJson,
    /// Valid JSON, but not an envelope.
    NotEnvelope,
}

impl ParleyError {
    /// A [`ParleyError::MalformedResponse`] of the given kind.
    pub fn malformed(kind: MalformedKind, detail: impl Into<String>) -> Self {
        ParleyError::MalformedResponse {
            kind,
            detail: detail.into(),
        }
    }

    /// Message shown to the user when a manual fetch fails with this error.
    pub fn user_facing(&self) -> String {
        match self {
            ParleyError::MalformedResponse {
                kind: MalformedKind::InvalidJson,
                ..
            } => {
                "Invalid response format from server".to_string()
            }
            ParleyError::Transport(_) => "Network error - please check your connection".to_string(),
            ParleyError::Envelope { message } => message
                .clone()
                .unwrap_or_else(|| "Failed to retrieve user data".to_string()),
            other => other.to_string(),
        }
    }
}
