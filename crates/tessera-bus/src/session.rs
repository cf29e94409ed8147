//! Session bookkeeping shared by every [`BusClient`](crate::BusClient)
//! implementation: connectivity flag, inbound fan-out and the subscription set.

use crate::client::BusMessage;
use crate::error::{BusError, BusResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::{broadcast, watch};

fn default_incoming_capacity() -> usize {
    256
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_request_capacity() -> usize {
    32
}

/// Tunables for a broker session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSettings {
    /// Inbound buffer depth per receiver before the oldest message is dropped
    #[serde(default = "default_incoming_capacity")]
    pub incoming_capacity: usize,

    /// Keep-alive interval negotiated with the broker
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Outgoing request queue depth
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            incoming_capacity: default_incoming_capacity(),
            keep_alive_secs: default_keep_alive_secs(),
            request_capacity: default_request_capacity(),
        }
    }
}

/// Connectivity, fan-out and subscription state of one broker session.
#[derive(Debug)]
pub struct BusSession {
    connected_tx: watch::Sender<bool>,
    incoming_tx: broadcast::Sender<BusMessage>,
    subscriptions: Mutex<HashSet<String>>,
}

impl BusSession {
    /// A disconnected session buffering at most `incoming_capacity` messages
    /// per receiver (at least one).
    pub fn new(incoming_capacity: usize) -> Self {
        let (connected_tx, _) = watch::channel(false);
        let (incoming_tx, _) = broadcast::channel(incoming_capacity.max(1));
        Self {
            connected_tx,
            incoming_tx,
            subscriptions: Mutex::new(HashSet::new()),
        }
    }

    /// Whether the session is live.
    pub fn is_connected(&self) -> bool {
        *self.connected_tx.borrow()
    }

    /// Fail with [`BusError::NotConnected`] unless the session is live.
    pub fn ensure_connected(&self) -> BusResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(BusError::NotConnected)
        }
    }

    /// Mark the session live.
    pub fn set_connected(&self) {
        self.connected_tx.send_if_modified(|connected| {
            let changed = !*connected;
            *connected = true;
            changed
        });
    }

    /// Mark the session lost. The broker forgets subscriptions of a closed
    /// clean session, so the local set is cleared too.
    pub fn set_disconnected(&self) {
        self.subscriptions.lock().clear();
        self.connected_tx.send_if_modified(|connected| {
            let changed = *connected;
            *connected = false;
            changed
        });
    }

    /// Record a subscription. Returns `false` if it already existed, in which
    /// case the caller must not subscribe again.
    pub fn begin_subscribe(&self, topic: &str) -> bool {
        self.subscriptions.lock().insert(topic.to_string())
    }

    /// Forget a subscription that failed to reach the broker.
    pub fn rollback_subscribe(&self, topic: &str) {
        self.subscriptions.lock().remove(topic);
    }

    /// Whether `topic` is currently subscribed.
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.lock().contains(topic)
    }

    /// Number of distinct subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Fan a message out to every receiver.
    pub fn deliver(&self, message: BusMessage) {
        // No receivers is not an error: nobody is watching yet.
        let _ = self.incoming_tx.send(message);
    }

    /// Connectivity stream.
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.connected_tx.subscribe()
    }

    /// Inbound message stream.
    pub fn incoming(&self) -> broadcast::Receiver<BusMessage> {
        self.incoming_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_set_is_cleared_on_disconnect() {
        let session = BusSession::new(4);
        session.set_connected();
        assert!(session.begin_subscribe("a/b"));
        assert!(!session.begin_subscribe("a/b"));
        assert_eq!(session.subscription_count(), 1);

        session.set_disconnected();
        assert!(!session.is_subscribed("a/b"));
        assert_eq!(session.ensure_connected(), Err(BusError::NotConnected));
    }

    #[test]
    fn slow_receivers_lose_the_oldest_messages() {
        let session = BusSession::new(2);
        let mut rx = session.incoming();
        for n in 0..5 {
            session.deliver(BusMessage::new("t", n.to_string()));
        }

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(3))
        ));
        assert_eq!(rx.try_recv().map(|m| m.payload), Ok("3".to_string()));
        assert_eq!(rx.try_recv().map(|m| m.payload), Ok("4".to_string()));
    }

    #[test]
    fn connectivity_replays_latest() {
        let session = BusSession::new(1);
        session.set_connected();
        let rx = session.connectivity();
        assert!(*rx.borrow());
    }
}
