//! Live-channel abstraction for conversations with the dialogue agent.
//!
//! Provides the [`LiveChannel`] trait the session controller drives, the
//! [`InboundEvent`] shapes the dialogue engine delivers, and two
//! implementations.
//!
//! # Main types
//!
//! - [`LiveChannel`]: Start, end and volume control for one conversation.
//! - [`ChannelEvent`]: Connection lifecycle and inbound messages.
//! - [`WebSocketChannel`]: JSON-over-WebSocket relay connection.
//! - [`ScriptedChannel`]: Replays a recorded event list.

/// Live channel trait and lifecycle events.
pub mod channel;
/// Inbound event shapes.
pub mod event;
/// Replay channel.
pub mod scripted;
/// WebSocket relay channel.
pub mod websocket;

pub use channel::{ChannelEvent, EventSink, LiveChannel};
pub use event::{FunctionCallPayload, InboundEvent, ToolCallPayload, ToolFunction};
pub use scripted::ScriptedChannel;
pub use websocket::WebSocketChannel;
