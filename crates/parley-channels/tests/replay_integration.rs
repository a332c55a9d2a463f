#![allow(clippy::unwrap_used, clippy::expect_used)]

use parley_channels::{ChannelEvent, InboundEvent, LiveChannel, ScriptedChannel};
use std::io::Write;
use tokio::sync::mpsc;

const RECORDING: &str = r#"{"message": "Hi, I'm here to learn about your goals.", "source": "ai"}
{"message": "My name is Ana", "source": "user"}

{"type": "ping", "event_id": 3}
{"tool_call": {"name": "user-details", "parameters": {"body": {"name": "Ana"}}}}
"#;

#[tokio::test]
async fn recording_file_replays_in_order() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(RECORDING.as_bytes()).unwrap();
    let text = std::fs::read_to_string(file.path()).unwrap();

    let channel = ScriptedChannel::from_jsonl(&text).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    channel.start("agent_123", tx).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(events.len(), 6);
    assert_eq!(events[0], ChannelEvent::Connected);
    assert_eq!(
        events[2],
        ChannelEvent::Message(InboundEvent::transcript("user", "My name is Ana"))
    );
    match &events[4] {
        ChannelEvent::Message(event) => {
            let call = event.tool_invocation().unwrap();
            assert_eq!(call.resolved_name(), Some("user-details"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(events[5], ChannelEvent::Disconnected);
}

#[test]
fn malformed_line_rejects_recording() {
    let err = ScriptedChannel::from_jsonl("{\"message\": \"ok\", \"source\": \"ai\"}\n{oops").err();
    assert!(err.is_some());
}
