use crate::error::{MalformedKind, ParleyError, ParleyResult};
use serde::{Deserialize, Serialize};

/// The `{success, message?, data?}` wrapper used by every remote JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the remote considers the request successful.
    #[serde(default)]
    pub success: bool,
    /// Optional human-readable status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional payload; `null` is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// A successful envelope carrying `data`.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// A failed envelope carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Decode an envelope from a parsed body.
    ///
    /// Remotes answer either with a bare envelope or with a sequence whose
    /// first element is the envelope; both shapes are accepted. The success
    /// flag is not checked here, see [`Envelope::require_success`].
    pub fn from_json(value: serde_json::Value) -> ParleyResult<Self> {
        let value = match value {
            serde_json::Value::Array(items) => items.into_iter().next().ok_or_else(|| {
                ParleyError::malformed(MalformedKind::Empty, "empty response array")
            })?,
            other => other,
        };
        if !value.is_object() {
            return Err(ParleyError::malformed(
                MalformedKind::NotEnvelope,
                format!("expected an envelope object, got {value}"),
            ));
        }
        serde_json::from_value(value).map_err(|e| {
            ParleyError::malformed(MalformedKind::NotEnvelope, format!("invalid envelope: {e}"))
        })
    }

    /// Fail with [`ParleyError::Envelope`] unless the success flag is set.
    pub fn require_success(self) -> ParleyResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(ParleyError::Envelope {
                message: self.message,
            })
        }
    }
}
