//! Delivery of change events to the external transport.

use crate::error::{FsError, Result};
use crate::events::ChangeEvent;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Channel every change event is addressed to.
pub const CHANNEL: &str = "file-system";

/// Contract assumed from the transport layer: deliver `payload` to the
/// listeners of `channel` at least once, preserving per-sender order.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, channel: &str, payload: Value) -> Result<()>;
}

/// Forwards translated change events to the transport, addressed by the
/// fixed subsystem channel. No transformation happens here.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn dispatch(&self, event: &ChangeEvent) -> Result<()> {
        let payload = serde_json::to_value(event)?;
        trace!(kind = ?event.event_kind, path = %event.path, "dispatching change event");
        self.transport.send(CHANNEL, payload).await
    }
}

/// In-process transport over an unbounded channel.
///
/// Delivers exactly once in send order, which satisfies the at-least-
/// once, order-preserving contract. Used by the CLI and by tests.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<(String, Value)>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, Value)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, channel: &str, payload: Value) -> Result<()> {
        self.tx
            .send((channel.to_string(), payload))
            .map_err(|e| FsError::Dispatch { channel: channel.to_string(), message: e.to_string() })
    }
}
