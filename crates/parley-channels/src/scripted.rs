use crate::channel::{ChannelEvent, EventSink, LiveChannel};
use crate::event::InboundEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use parley_core::{ParleyError, ParleyResult};

/// A live channel that replays a recorded list of inbound events.
///
/// On `start` it reports `Connected`, delivers every scripted event in order
/// and, unless [`ScriptedChannel::hold_open`] was set, reports
/// `Disconnected`. Used for offline replays and for driving the session
/// controller in tests.
pub struct ScriptedChannel {
    script: Vec<InboundEvent>,
    hold_open: bool,
    fail_start: bool,
    fail_end: bool,
    fail_volume: bool,
    state: Mutex<ScriptState>,
}

#[derive(Default)]
struct ScriptState {
    sink: Option<EventSink>,
    disconnected: bool,
    starts: usize,
    ends: usize,
    volumes: Vec<f32>,
}

impl ScriptedChannel {
    /// Replay `script` on every start.
    pub fn new(script: Vec<InboundEvent>) -> Self {
        Self {
            script,
            hold_open: false,
            fail_start: false,
            fail_end: false,
            fail_volume: false,
            state: Mutex::new(ScriptState::default()),
        }
    }

    /// Parse a JSON Lines recording, one inbound event per non-blank line.
    pub fn from_jsonl(text: &str) -> ParleyResult<Self> {
        let script = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str::<serde_json::Value>(l).map(InboundEvent::from_value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(script))
    }

    /// Keep the conversation open after the script; it then ends only on
    /// [`LiveChannel::end`] or [`ScriptedChannel::push`]ed disconnects.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Make `start` fail.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Make `end` fail. The conversation still drops, as a real engine would.
    pub fn failing_end(mut self) -> Self {
        self.fail_end = true;
        self
    }

    /// Make `set_volume` fail.
    pub fn failing_volume(mut self) -> Self {
        self.fail_volume = true;
        self
    }

    /// Deliver an extra event into the current conversation.
    pub fn push(&self, event: ChannelEvent) {
        let mut state = self.state.lock();
        if matches!(event, ChannelEvent::Disconnected) {
            state.disconnected = true;
        }
        if let Some(sink) = &state.sink {
            let _ = sink.send(event);
        }
    }

    /// How many times `start` was called.
    pub fn start_count(&self) -> usize {
        self.state.lock().starts
    }

    /// How many times `end` was called.
    pub fn end_count(&self) -> usize {
        self.state.lock().ends
    }

    /// Every volume level requested so far.
    pub fn volumes(&self) -> Vec<f32> {
        self.state.lock().volumes.clone()
    }

    fn disconnect(state: &mut ScriptState) {
        if state.disconnected {
            return;
        }
        state.disconnected = true;
        if let Some(sink) = &state.sink {
            let _ = sink.send(ChannelEvent::Disconnected);
        }
    }
}

#[async_trait]
impl LiveChannel for ScriptedChannel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start(&self, agent_id: &str, events: EventSink) -> ParleyResult<String> {
        let mut state = self.state.lock();
        state.starts += 1;
        if self.fail_start {
            return Err(ParleyError::Channel("scripted start failure".to_string()));
        }

        state.disconnected = false;
        let _ = events.send(ChannelEvent::Connected);
        for event in &self.script {
            let _ = events.send(ChannelEvent::Message(event.clone()));
        }
        state.sink = Some(events);
        if !self.hold_open {
            Self::disconnect(&mut state);
        }
        Ok(format!("{agent_id}-replay-{}", state.starts))
    }

    async fn end(&self) -> ParleyResult<()> {
        let mut state = self.state.lock();
        state.ends += 1;
        Self::disconnect(&mut state);
        if self.fail_end {
            return Err(ParleyError::Channel("scripted end failure".to_string()));
        }
        Ok(())
    }

    async fn set_volume(&self, level: f32) -> ParleyResult<()> {
        if self.fail_volume {
            return Err(ParleyError::Channel("scripted volume failure".to_string()));
        }
        self.state.lock().volumes.push(level.clamp(0.0, 1.0));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> Vec<ChannelEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn replays_in_order_then_disconnects() {
        let channel = ScriptedChannel::new(vec![
            InboundEvent::transcript("ai", "Hi there"),
            InboundEvent::transcript("user", "Hello"),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = channel.start("agent-1", tx).await.unwrap();
        assert_eq!(handle, "agent-1-replay-1");

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], ChannelEvent::Connected);
        assert_eq!(
            events[1],
            ChannelEvent::Message(InboundEvent::transcript("ai", "Hi there"))
        );
        assert_eq!(events[3], ChannelEvent::Disconnected);
    }

    #[tokio::test]
    async fn end_disconnects_once() {
        let channel = ScriptedChannel::new(vec![]).hold_open();
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.start("a", tx).await.unwrap();
        channel.end().await.unwrap();
        channel.end().await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events, vec![ChannelEvent::Connected, ChannelEvent::Disconnected]);
        assert_eq!(channel.end_count(), 2);
    }

    #[tokio::test]
    async fn failing_end_still_drops_the_conversation() {
        let channel = ScriptedChannel::new(vec![]).hold_open().failing_end();
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.start("a", tx).await.unwrap();
        assert!(channel.end().await.is_err());
        assert_eq!(drain(&mut rx).last(), Some(&ChannelEvent::Disconnected));
    }

    #[test]
    fn parses_jsonl() {
        let text = "{\"message\":\"Hello\",\"source\":\"user\"}\n\n{\"tool_call\":{\"name\":\"user-details\"}}\n";
        let channel = ScriptedChannel::from_jsonl(text).unwrap();
        assert_eq!(channel.script.len(), 2);
        assert!(ScriptedChannel::from_jsonl("{not json").is_err());
    }
}
