//! In-process broker
//!
//! A broker living inside the process, for tests and simulation. It routes
//! publishes to every connected client holding a matching filter, delivering
//! each message at most once per client however many of its filters match.
//! The broker can be made unreachable to simulate a network drop, and can
//! require credentials to simulate authentication failures.

use crate::client::{BusClient, BusMessage};
use crate::error::{BusError, BusResult};
use crate::session::BusSession;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tessera_core::{is_valid_filter, topic_matches, ConnectionConfig};
use tokio::sync::{broadcast, watch};

#[derive(Debug)]
struct ClientEntry {
    session: Arc<BusSession>,
    filters: HashSet<String>,
    connected: bool,
}

#[derive(Debug)]
struct BrokerInner {
    clients: HashMap<u64, ClientEntry>,
    next_client: u64,
    reachable: bool,
    required_credentials: Option<(String, String)>,
    published: Vec<BusMessage>,
    subscribe_requests: usize,
}

impl Default for BrokerInner {
    fn default() -> Self {
        Self {
            clients: HashMap::new(),
            next_client: 0,
            reachable: true,
            required_credentials: None,
            published: Vec::new(),
            subscribe_requests: 0,
        }
    }
}

/// Shared handle to an in-process broker.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Mutex<BrokerInner>>,
}

impl MemoryBroker {
    /// A reachable broker accepting anonymous clients.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a user name and password from connecting clients.
    #[must_use]
    pub fn with_credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.inner.lock().required_credentials = Some((username.into(), password.into()));
        self
    }

    /// Create a client owning its own session on this broker.
    pub fn client(&self, incoming_capacity: usize) -> MemoryBusClient {
        let session = Arc::new(BusSession::new(incoming_capacity));
        let mut inner = self.inner.lock();
        inner.next_client += 1;
        let id = inner.next_client;
        inner.clients.insert(
            id,
            ClientEntry {
                session: session.clone(),
                filters: HashSet::new(),
                connected: false,
            },
        );
        MemoryBusClient {
            broker: self.clone(),
            id,
            session,
        }
    }

    /// Publish from outside any client, e.g. a device on the network.
    pub fn publish(&self, topic: &str, payload: &str) {
        self.route(BusMessage::new(topic, payload));
    }

    /// Make the broker (un)reachable. Going unreachable drops every session.
    pub fn set_reachable(&self, reachable: bool) {
        let dropped: Vec<Arc<BusSession>> = {
            let mut inner = self.inner.lock();
            inner.reachable = reachable;
            if reachable {
                Vec::new()
            } else {
                inner
                    .clients
                    .values_mut()
                    .filter(|c| c.connected)
                    .map(|c| {
                        c.connected = false;
                        c.filters.clear();
                        c.session.clone()
                    })
                    .collect()
            }
        };
        for session in dropped {
            session.set_disconnected();
        }
    }

    /// Every message published by clients, in order.
    pub fn published(&self) -> Vec<BusMessage> {
        self.inner.lock().published.clone()
    }

    /// Number of subscribe requests that actually reached the broker.
    pub fn subscribe_requests(&self) -> usize {
        self.inner.lock().subscribe_requests
    }

    /// Whether any connected client holds exactly `filter`.
    pub fn has_subscription(&self, filter: &str) -> bool {
        self.inner
            .lock()
            .clients
            .values()
            .any(|c| c.connected && c.filters.contains(filter))
    }

    fn route(&self, message: BusMessage) {
        let targets: Vec<Arc<BusSession>> = {
            let inner = self.inner.lock();
            inner
                .clients
                .values()
                .filter(|c| c.connected)
                .filter(|c| c.filters.iter().any(|f| topic_matches(f, &message.topic)))
                .map(|c| c.session.clone())
                .collect()
        };
        for session in targets {
            session.deliver(message.clone());
        }
    }
}

/// A client session on a [`MemoryBroker`].
#[derive(Debug)]
pub struct MemoryBusClient {
    broker: MemoryBroker,
    id: u64,
    session: Arc<BusSession>,
}

impl MemoryBusClient {
    /// The session bookkeeping of this client.
    pub fn session(&self) -> &Arc<BusSession> {
        &self.session
    }
}

#[async_trait]
impl BusClient for MemoryBusClient {
    async fn connect(&self, config: &ConnectionConfig) -> BusResult<()> {
        {
            let mut inner = self.broker.inner.lock();
            if !inner.reachable {
                return Err(BusError::connect(format!("{} is unreachable", config.endpoint())));
            }
            if let Some((user, pass)) = &inner.required_credentials {
                if &config.username != user || &config.password != pass {
                    return Err(BusError::connect("bad user name or password"));
                }
            }
            let entry = inner
                .clients
                .get_mut(&self.id)
                .ok_or_else(|| BusError::connect("client was removed from the broker"))?;
            if entry.connected {
                return Ok(());
            }
            entry.connected = true;
            entry.filters.clear();
        }
        self.session.set_connected();
        tracing::debug!(client_id = %config.client_id, "Memory bus client connected");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> BusResult<()> {
        self.session.ensure_connected()?;
        if !is_valid_filter(topic) {
            return Err(BusError::subscribe(topic, "invalid topic filter"));
        }
        if !self.session.begin_subscribe(topic) {
            return Ok(());
        }
        let mut inner = self.broker.inner.lock();
        match inner.clients.get_mut(&self.id) {
            Some(entry) if entry.connected => {
                entry.filters.insert(topic.to_string());
                inner.subscribe_requests += 1;
                Ok(())
            }
            _ => {
                self.session.rollback_subscribe(topic);
                Err(BusError::NotConnected)
            }
        }
    }

    async fn publish(&self, topic: &str, payload: &str) -> BusResult<()> {
        self.session.ensure_connected()?;
        if topic.is_empty() || tessera_core::topic::has_wildcards(topic) {
            return Err(BusError::publish(topic, "publish topic must be concrete"));
        }
        let message = BusMessage::new(topic, payload);
        self.broker.inner.lock().published.push(message.clone());
        self.broker.route(message);
        Ok(())
    }

    async fn disconnect(&self) -> BusResult<()> {
        if let Some(entry) = self.broker.inner.lock().clients.get_mut(&self.id) {
            entry.connected = false;
            entry.filters.clear();
        }
        self.session.set_disconnected();
        Ok(())
    }

    fn connectivity(&self) -> watch::Receiver<bool> {
        self.session.connectivity()
    }

    fn incoming(&self) -> broadcast::Receiver<BusMessage> {
        self.session.incoming()
    }
}

impl Drop for MemoryBusClient {
    fn drop(&mut self) {
        self.broker.inner.lock().clients.remove(&self.id);
    }
}
