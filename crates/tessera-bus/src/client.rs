//! Bus client contract.

use crate::error::BusResult;
use async_trait::async_trait;
use tessera_core::ConnectionConfig;
use tokio::sync::{broadcast, watch};

/// An inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Concrete topic the message was published on
    pub topic: String,
    /// Payload, decoded as UTF-8 (lossy)
    pub payload: String,
}

impl BusMessage {
    /// Create a message.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Adapter over exactly one broker connection.
///
/// Only the adapter touches the connection; everything else goes through
/// these calls and streams.
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Establish the session. Connecting while connected is a no-op.
    async fn connect(&self, config: &ConnectionConfig) -> BusResult<()>;

    /// Subscribe to a topic filter. Repeated subscriptions are no-ops.
    async fn subscribe(&self, topic: &str) -> BusResult<()>;

    /// Publish a payload.
    async fn publish(&self, topic: &str, payload: &str) -> BusResult<()>;

    /// Tear the session down. Disconnecting while disconnected is a no-op.
    async fn disconnect(&self) -> BusResult<()>;

    /// Connectivity stream; new receivers see the latest value.
    fn connectivity(&self) -> watch::Receiver<bool>;

    /// Inbound messages; every receiver sees every message published after
    /// it subscribed, minus whatever it lost by lagging.
    fn incoming(&self) -> broadcast::Receiver<BusMessage>;

    /// Current connectivity.
    fn is_connected(&self) -> bool {
        *self.connectivity().borrow()
    }
}
