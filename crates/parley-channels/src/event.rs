use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One inbound event from the live channel, as delivered by the dialogue
/// engine.
///
/// The engine is loose about shapes: a transcript line is
/// `{message, source}`, a tool invocation is either `{type: "tool_call", ...}`
/// with the call fields inline or `{tool_call: {...}}`, and an alternate
/// protocol sends `{function_call: {name, arguments}}`. Every field is
/// therefore optional and decoded independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Transcript text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Transcript source tag (`"user"` or anything else for the agent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Event type tag.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Nested tool invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallPayload>,
    /// Alternate protocol function call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallPayload>,
    /// Inline tool-call fields, used when `type == "tool_call"` and there is
    /// no nested `tool_call` object.
    #[serde(flatten)]
    pub inline_call: ToolCallPayload,
}

/// A tool invocation as carried by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    /// Tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Named parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
    /// OpenAI-style `function` wrapper some engines use instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<ToolFunction>,
}

/// The `function` wrapper inside a tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    /// Function name.
    #[serde(default)]
    pub name: Option<String>,
    /// Arguments, either an object or a JSON-encoded string.
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

/// The alternate `function_call` shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallPayload {
    /// Function name.
    #[serde(default)]
    pub name: Option<String>,
    /// Arguments, normally a JSON-encoded string.
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

impl InboundEvent {
    /// Decode an event from raw JSON.
    ///
    /// Each field is decoded on its own, so a badly typed tool shape only
    /// drops that shape and never the transcript line beside it. A
    /// non-object payload becomes an empty (opaque) event.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            tracing::debug!("Inbound event is not a JSON object");
            return Self::default();
        };
        Self {
            message: field(&map, "message"),
            source: field(&map, "source"),
            kind: field(&map, "type"),
            tool_call: field(&map, "tool_call"),
            function_call: field(&map, "function_call"),
            inline_call: ToolCallPayload {
                name: field(&map, "name"),
                parameters: field(&map, "parameters"),
                function: field(&map, "function"),
            },
        }
    }

    /// Convenience constructor for a transcript event.
    pub fn transcript(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// The tool invocation this event carries, if it is typed as one.
    pub fn tool_invocation(&self) -> Option<&ToolCallPayload> {
        if let Some(call) = &self.tool_call {
            return Some(call);
        }
        if self.kind.as_deref() == Some("tool_call") {
            return Some(&self.inline_call);
        }
        None
    }
}

/// Decode one field, treating `null` and mistyped values as absent.
fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let raw = map.get(key).filter(|v| !v.is_null())?;
    match T::deserialize(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(field = key, error = %e, "Inbound event field has an unrecognised shape");
            None
        }
    }
}

impl ToolCallPayload {
    /// The tool name, looking through the `function` wrapper if needed.
    pub fn resolved_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.function.as_ref().and_then(|f| f.name.as_deref()))
    }

    /// The parameters object, looking through the `function` wrapper if
    /// needed. String-encoded arguments are decoded; undecodable ones are
    /// treated as absent.
    pub fn resolved_parameters(&self) -> Option<serde_json::Value> {
        if let Some(params) = &self.parameters {
            return Some(params.clone());
        }
        match self.function.as_ref()?.arguments.as_ref()? {
            serde_json::Value::String(encoded) => serde_json::from_str(encoded).ok(),
            other => Some(other.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transcript_shape() {
        let event = InboundEvent::from_value(json!({"message": "Hello", "source": "user"}));
        assert_eq!(event.message.as_deref(), Some("Hello"));
        assert_eq!(event.source.as_deref(), Some("user"));
        assert!(event.tool_invocation().is_none());
    }

    #[test]
    fn nested_tool_call() {
        let event = InboundEvent::from_value(json!({
            "tool_call": {"name": "user-details", "parameters": {"body": {"name": "Ana"}}}
        }));
        let call = event.tool_invocation().unwrap();
        assert_eq!(call.resolved_name(), Some("user-details"));
        assert_eq!(call.resolved_parameters().unwrap()["body"]["name"], "Ana");
    }

    #[test]
    fn inline_tool_call_requires_type_tag() {
        let typed = InboundEvent::from_value(json!({
            "type": "tool_call",
            "name": "user-details",
            "parameters": {"name": "Ana"}
        }));
        assert_eq!(
            typed.tool_invocation().unwrap().resolved_name(),
            Some("user-details")
        );

        let untyped = InboundEvent::from_value(json!({
            "name": "user-details",
            "parameters": {"name": "Ana"}
        }));
        assert!(untyped.tool_invocation().is_none());
    }

    #[test]
    fn function_wrapper_with_encoded_arguments() {
        let event = InboundEvent::from_value(json!({
            "tool_call": {
                "function": {"name": "user-details", "arguments": "{\"body\":{\"email\":\"a@b.co\"}}"}
            }
        }));
        let call = event.tool_invocation().unwrap();
        assert_eq!(call.resolved_name(), Some("user-details"));
        assert_eq!(call.resolved_parameters().unwrap()["body"]["email"], "a@b.co");
    }

    #[test]
    fn unrecognised_shape_is_opaque() {
        assert_eq!(InboundEvent::from_value(json!("ping")), InboundEvent::default());

        let event = InboundEvent::from_value(json!({"audio": "base64..."}));
        assert!(event.message.is_none());
        assert!(event.tool_invocation().is_none());
        assert!(event.function_call.is_none());
    }

    #[test]
    fn mistyped_field_drops_only_itself() {
        let event = InboundEvent::from_value(json!({"message": 42, "source": "user"}));
        assert!(event.message.is_none());
        assert_eq!(event.source.as_deref(), Some("user"));

        let event = InboundEvent::from_value(json!({
            "message": "Hello",
            "source": "user",
            "tool_call": "pending",
            "function_call": {"name": 7}
        }));
        assert_eq!(event.message.as_deref(), Some("Hello"));
        assert!(event.tool_call.is_none());
        assert!(event.function_call.is_none());
    }
}
