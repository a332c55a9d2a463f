//! Maps one inbound event to the effects it has on the session.
//!
//! Classification is pure: the controller decides whether a proposed
//! resolution may still be committed.

use parley_channels::InboundEvent;
use parley_core::{ProfileRecord, Speaker, TranscriptTurn, PROFILE_TOOL_NAME};
use parley_extract::heuristics::{exposes_contact, first_json_object_after};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// How a resolution candidate was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    ToolCall,
    FunctionCall,
    InlineMention,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AppendTurn(TranscriptTurn),
    ResolveProfile {
        record: ProfileRecord,
        via: ResolutionSource,
    },
}

/// Classify `event`.
///
/// A transcript turn is always emitted for `{message, source}`. After that,
/// at most one resolution is proposed, in priority order: a typed tool
/// invocation, a `function_call`, then a JSON object the agent spoke right
/// after naming the profile tool.
pub fn classify(event: &InboundEvent) -> Vec<Effect> {
    let mut effects = Vec::new();

    let turn = match (&event.message, &event.source) {
        (Some(message), Some(source)) => {
            let turn = TranscriptTurn::new(Speaker::from_source(source), message.clone());
            effects.push(Effect::AppendTurn(turn.clone()));
            Some(turn)
        }
        _ => None,
    };

    if let Some(call) = event.tool_invocation() {
        if call.resolved_name() == Some(PROFILE_TOOL_NAME) {
            let params = call.resolved_parameters().unwrap_or(Value::Null);
            push_candidate(&mut effects, body_or_self(&params), ResolutionSource::ToolCall);
            return effects;
        }
    }

    if let Some(call) = &event.function_call {
        if call.name.as_deref() == Some(PROFILE_TOOL_NAME) {
            let args = match &call.arguments {
                Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(error = %e, "function_call arguments are not valid JSON");
                        return effects;
                    }
                },
                Some(decoded) => decoded.clone(),
                None => Value::Null,
            };
            push_candidate(&mut effects, body_or_self(&args), ResolutionSource::FunctionCall);
            return effects;
        }
    }

    if let Some(turn) = turn.filter(|t| t.speaker == Speaker::Agent) {
        if let Some(span) = first_json_object_after(&turn.text, PROFILE_TOOL_NAME) {
            match serde_json::from_str::<Value>(span) {
                Ok(parsed) if exposes_contact(&parsed) => {
                    push_candidate(&mut effects, &parsed, ResolutionSource::InlineMention);
                }
                Ok(_) => debug!("Inline tool mention carries no contact fields"),
                Err(e) => debug!(error = %e, "Inline tool mention is not valid JSON"),
            }
        }
    }

    effects
}

fn body_or_self(params: &Value) -> &Value {
    match params.get("body") {
        Some(body) if body.is_object() => body,
        _ => params,
    }
}

fn push_candidate(effects: &mut Vec<Effect>, candidate: &Value, via: ResolutionSource) {
    match ProfileRecord::from_json(candidate).filter(ProfileRecord::is_found) {
        Some(record) => effects.push(Effect::ResolveProfile { record, via }),
        None => debug!(?via, "Profile tool payload has neither name nor email"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify_json(value: Value) -> Vec<Effect> {
        classify(&InboundEvent::from_value(value))
    }

    fn resolved(effects: &[Effect]) -> Option<(&ProfileRecord, ResolutionSource)> {
        effects.iter().find_map(|e| match e {
            Effect::ResolveProfile { record, via } => Some((record, *via)),
            _ => None,
        })
    }

    #[test]
    fn user_message_becomes_user_turn() {
        let effects = classify_json(json!({"message": "Hello", "source": "user"}));
        assert_eq!(effects.len(), 1);
        match &effects[0] {
            Effect::AppendTurn(turn) => {
                assert_eq!(turn.speaker, Speaker::User);
                assert_eq!(turn.text, "Hello");
            }
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn any_other_source_is_agent() {
        let effects = classify_json(json!({"message": "Hi", "source": "ai"}));
        assert!(matches!(&effects[0], Effect::AppendTurn(t) if t.speaker == Speaker::Agent));
    }

    #[test]
    fn nested_tool_call_with_body() {
        let effects = classify_json(json!({
            "tool_call": {
                "name": "user-details",
                "parameters": {"body": {"name": "Sarah Johnson", "email": "sarah@x.com"}}
            }
        }));
        let (record, via) = resolved(&effects).unwrap();
        assert_eq!(via, ResolutionSource::ToolCall);
        assert_eq!(record.name, "Sarah Johnson");
        assert_eq!(record.email, "sarah@x.com");
    }

    #[test]
    fn typed_tool_call_with_function_wrapper() {
        let effects = classify_json(json!({
            "type": "tool_call",
            "function": {
                "name": "user-details",
                "arguments": "{\"body\": {\"email\": \"lee@example.com\"}}"
            }
        }));
        let (record, _) = resolved(&effects).unwrap();
        assert_eq!(record.email, "lee@example.com");
    }

    #[test]
    fn parameters_without_body_are_the_record() {
        let effects = classify_json(json!({
            "tool_call": {"name": "user-details", "parameters": {"name": "Ana"}}
        }));
        assert_eq!(resolved(&effects).unwrap().0.name, "Ana");
    }

    #[test]
    fn other_tools_are_ignored() {
        let effects = classify_json(json!({
            "tool_call": {"name": "calendar", "parameters": {"name": "Ana"}}
        }));
        assert!(effects.is_empty());
    }

    #[test]
    fn function_call_string_arguments() {
        let effects = classify_json(json!({
            "function_call": {
                "name": "user-details",
                "arguments": "{\"body\":{\"name\":\"Ana\",\"strengths\":[\"Focus\"]}}"
            }
        }));
        let (record, via) = resolved(&effects).unwrap();
        assert_eq!(via, ResolutionSource::FunctionCall);
        assert_eq!(record.strengths, vec!["Focus"]);
    }

    #[test]
    fn function_call_bad_arguments_stop_quietly() {
        let effects = classify_json(json!({
            "message": "user-details {\"name\": \"Ana\"}",
            "source": "ai",
            "function_call": {"name": "user-details", "arguments": "{not json"}
        }));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::AppendTurn(_)));
    }

    #[test]
    fn transcript_turn_is_kept_alongside_tool_call() {
        let effects = classify_json(json!({
            "message": "Saving your details",
            "source": "ai",
            "tool_call": {"name": "user-details", "parameters": {"body": {"name": "Ana"}}}
        }));
        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], Effect::AppendTurn(_)));
        assert!(matches!(effects[1], Effect::ResolveProfile { .. }));
    }

    #[test]
    fn inline_mention_in_agent_turn() {
        let text = "Calling user-details with {\"name\": \"Ana {A}\", \"email\": \"ana@x.co\"} now";
        let effects = classify_json(json!({"message": text, "source": "ai"}));
        let (record, via) = resolved(&effects).unwrap();
        assert_eq!(via, ResolutionSource::InlineMention);
        assert_eq!(record.name, "Ana {A}");
    }

    #[test]
    fn inline_mention_from_user_is_ignored() {
        let text = "user-details {\"name\": \"Mallory\"}";
        let effects = classify_json(json!({"message": text, "source": "user"}));
        assert!(resolved(&effects).is_none());
    }

    #[test]
    fn inline_mention_without_contact_is_ignored() {
        let text = "user-details {\"background\": \"Design\"}";
        let effects = classify_json(json!({"message": text, "source": "ai"}));
        assert!(resolved(&effects).is_none());
    }

    #[test]
    fn opaque_event_has_no_effects() {
        assert!(classify_json(json!({"type": "ping", "event_id": 4})).is_empty());
        assert!(classify_json(json!(42)).is_empty());
    }

    #[test]
    fn mistyped_tool_fields_keep_the_turn() {
        let events = [
            json!({"message": "Hello", "source": "user", "tool_call": "pending"}),
            json!({"message": "Hi there", "source": "ai", "function_call": {"name": 7}}),
            json!({"message": "Hi there", "source": "ai", "name": ["x"]}),
        ];
        for event in events {
            let effects = classify_json(event.clone());
            assert_eq!(effects.len(), 1, "event {event}");
            assert!(matches!(&effects[0], Effect::AppendTurn(_)), "event {event}");
        }
    }

    #[test]
    fn mistyped_function_call_still_allows_tool_call() {
        let effects = classify_json(json!({
            "message": "Saving",
            "source": "ai",
            "function_call": "later",
            "tool_call": {"name": "user-details", "parameters": {"email": "ana@x.com"}}
        }));
        assert!(matches!(&effects[0], Effect::AppendTurn(_)));
        let (record, via) = resolved(&effects).unwrap();
        assert_eq!(via, ResolutionSource::ToolCall);
        assert_eq!(record.email, "ana@x.com");
    }
}
