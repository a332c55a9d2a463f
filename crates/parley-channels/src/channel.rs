use crate::event::InboundEvent;
use async_trait::async_trait;
use parley_core::ParleyResult;
use tokio::sync::mpsc;

/// Lifecycle and message notifications from a live channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The conversation is live.
    Connected,
    /// The conversation is over, whoever ended it.
    Disconnected,
    /// One inbound event from the dialogue engine.
    Message(InboundEvent),
    /// The channel reported a failure.
    Error(String),
}

/// Where a channel delivers its events, in delivery order.
pub type EventSink = mpsc::UnboundedSender<ChannelEvent>;

/// A bidirectional real-time connection to the dialogue agent.
///
/// Implementations push [`ChannelEvent`]s into the sink handed to
/// [`LiveChannel::start`] and must report [`ChannelEvent::Disconnected`]
/// exactly once per started conversation, also after [`LiveChannel::end`].
#[async_trait]
pub trait LiveChannel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Open a conversation with `agent_id`; returns the engine's handle for it.
    async fn start(&self, agent_id: &str, events: EventSink) -> ParleyResult<String>;

    /// Request teardown of the current conversation.
    async fn end(&self) -> ParleyResult<()>;

    /// Set output volume, `level` in `[0, 1]`.
    async fn set_volume(&self, level: f32) -> ParleyResult<()>;
}
