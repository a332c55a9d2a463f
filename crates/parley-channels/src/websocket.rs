use crate::channel::{ChannelEvent, EventSink, LiveChannel};
use crate::event::InboundEvent;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use parley_core::{ParleyError, ParleyResult};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Live channel speaking JSON text frames to a conversation relay.
///
/// Inbound frames are decoded as [`InboundEvent`]s. Control requests go out
/// as `{"type":"end"}` and `{"type":"set_volume","volume":v}`. The relay may
/// name the conversation through an `x-conversation-id` handshake header;
/// otherwise the agent id is used as the handle.
pub struct WebSocketChannel {
    url: String,
    control: Mutex<Option<mpsc::UnboundedSender<Message>>>,
}

impl WebSocketChannel {
    /// Channel connecting to the relay at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            control: Mutex::new(None),
        }
    }

    fn conversation_url(&self, agent_id: &str) -> String {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{sep}agent_id={agent_id}", self.url)
    }

    fn send_control(&self, frame: serde_json::Value) -> ParleyResult<()> {
        let control = self.control.lock();
        let tx = control
            .as_ref()
            .ok_or_else(|| ParleyError::Channel("no active conversation".to_string()))?;
        tx.send(Message::Text(frame.to_string()))
            .map_err(|_| ParleyError::Channel("conversation already closed".to_string()))
    }
}

#[async_trait]
impl LiveChannel for WebSocketChannel {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn start(&self, agent_id: &str, events: EventSink) -> ParleyResult<String> {
        let url = self.conversation_url(agent_id);
        let (stream, response) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| ParleyError::Channel(format!("connect to {url} failed: {e}")))?;

        let handle = response
            .headers()
            .get("x-conversation-id")
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| agent_id.to_string(), str::to_string);
        info!(url = %url, handle = %handle, "Live channel connected");

        let (mut write, mut read) = stream.split();
        let (control_tx, mut control_rx) = mpsc::unbounded_channel::<Message>();
        *self.control.lock() = Some(control_tx.clone());

        tokio::spawn(async move {
            while let Some(frame) = control_rx.recv().await {
                let closing = matches!(frame, Message::Close(_));
                if let Err(e) = write.send(frame).await {
                    debug!(error = %e, "Live channel write failed");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let _ = events.send(ChannelEvent::Connected);
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str(&text) {
                        Ok(value) => {
                            let _ = events.send(ChannelEvent::Message(InboundEvent::from_value(value)));
                        }
                        Err(e) => warn!(error = %e, "Dropping non-JSON frame"),
                    },
                    Ok(Message::Ping(payload)) => {
                        let _ = control_tx.send(Message::Pong(payload));
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        let _ = events.send(ChannelEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            let _ = events.send(ChannelEvent::Disconnected);
        });

        Ok(handle)
    }

    async fn end(&self) -> ParleyResult<()> {
        self.send_control(serde_json::json!({"type": "end"}))?;
        let tx = self.control.lock().take();
        if let Some(tx) = tx {
            let _ = tx.send(Message::Close(None));
        }
        Ok(())
    }

    async fn set_volume(&self, level: f32) -> ParleyResult<()> {
        self.send_control(serde_json::json!({
            "type": "set_volume",
            "volume": level.clamp(0.0, 1.0),
        }))
    }
}
