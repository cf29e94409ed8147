//! MQTT broker sessions over `rumqttc`.
//!
//! `connect` drives the event loop until the broker acknowledges the session,
//! then hands the loop to a background task that fans inbound publishes out
//! through the [`BusSession`]. The loop is not restarted after an error:
//! reconnecting is an explicit user action.

use crate::client::{BusClient, BusMessage};
use crate::error::{BusError, BusResult};
use crate::session::{BusSession, BusSettings};
use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, MqttOptions, Outgoing, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::ConnectionConfig;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

struct Connection {
    client: AsyncClient,
    event_loop: JoinHandle<()>,
}

/// [`BusClient`] backed by an MQTT broker.
pub struct MqttBusClient {
    settings: BusSettings,
    session: Arc<BusSession>,
    connection: Mutex<Option<Connection>>,
}

impl MqttBusClient {
    /// A disconnected client.
    pub fn new(settings: BusSettings) -> Self {
        let session = Arc::new(BusSession::new(settings.incoming_capacity));
        Self {
            settings,
            session,
            connection: Mutex::new(None),
        }
    }

    fn options(&self, config: &ConnectionConfig) -> MqttOptions {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(self.settings.keep_alive_secs.max(5)));
        options.set_clean_session(true);
        if config.has_credentials() {
            options.set_credentials(&config.username, &config.password);
        }
        options
    }
}

#[async_trait]
impl BusClient for MqttBusClient {
    async fn connect(&self, config: &ConnectionConfig) -> BusResult<()> {
        let mut connection = self.connection.lock().await;
        if self.session.is_connected() {
            return Ok(());
        }
        if let Some(stale) = connection.take() {
            stale.event_loop.abort();
        }

        let (client, mut event_loop) =
            AsyncClient::new(self.options(config), self.settings.request_capacity.max(1));

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        break;
                    }
                    return Err(BusError::connect(format!("broker refused session: {:?}", ack.code)));
                }
                Ok(_) => {}
                Err(e) => return Err(BusError::connect(e.to_string())),
            }
        }

        self.session.set_connected();
        tracing::info!(endpoint = %config.endpoint(), client_id = %config.client_id, "MQTT session established");

        let session = self.session.clone();
        let task = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                        session.deliver(BusMessage::new(publish.topic, payload));
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        session.set_disconnected();
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "MQTT session lost");
                        session.set_disconnected();
                        break;
                    }
                }
            }
        });

        *connection = Some(Connection {
            client,
            event_loop: task,
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> BusResult<()> {
        self.session.ensure_connected()?;
        if !self.session.begin_subscribe(topic) {
            return Ok(());
        }
        let connection = self.connection.lock().await;
        let Some(connection) = connection.as_ref() else {
            self.session.rollback_subscribe(topic);
            return Err(BusError::NotConnected);
        };
        if let Err(e) = connection.client.subscribe(topic, QoS::AtLeastOnce).await {
            self.session.rollback_subscribe(topic);
            return Err(BusError::subscribe(topic, e.to_string()));
        }
        tracing::debug!(topic, "Subscribed");
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> BusResult<()> {
        self.session.ensure_connected()?;
        let connection = self.connection.lock().await;
        let Some(connection) = connection.as_ref() else {
            return Err(BusError::NotConnected);
        };
        connection
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
            .await
            .map_err(|e| BusError::publish(topic, e.to_string()))
    }

    async fn disconnect(&self) -> BusResult<()> {
        let Some(mut connection) = self.connection.lock().await.take() else {
            self.session.set_disconnected();
            return Ok(());
        };
        let result = connection
            .client
            .disconnect()
            .await
            .map_err(|e| BusError::Disconnect(e.to_string()));
        if tokio::time::timeout(DISCONNECT_GRACE, &mut connection.event_loop)
            .await
            .is_err()
        {
            connection.event_loop.abort();
        }
        self.session.set_disconnected();
        result
    }

    fn connectivity(&self) -> watch::Receiver<bool> {
        self.session.connectivity()
    }

    fn incoming(&self) -> broadcast::Receiver<BusMessage> {
        self.session.incoming()
    }
}

impl Drop for MqttBusClient {
    fn drop(&mut self) {
        if let Ok(mut connection) = self.connection.try_lock() {
            if let Some(connection) = connection.take() {
                connection.event_loop.abort();
            }
        }
    }
}
