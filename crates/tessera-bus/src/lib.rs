//! # Tessera Bus - Broker Session Adapter
//!
//! **Purpose**: Own exactly one broker connection and expose it through the
//! [`BusClient`] contract:
//!
//! - `connect` / `subscribe` / `publish` / `disconnect`, each returning a
//!   [`BusResult`] the caller must branch on
//! - a replay-latest connectivity stream (`tokio::sync::watch`)
//! - a multicast inbound message stream (`tokio::sync::broadcast`) whose
//!   bounded buffer drops the oldest message when a consumer falls behind
//!
//! Subscribing twice to the same topic is a no-op. After a connection loss
//! every operation fails with [`BusError::NotConnected`] instead of queueing,
//! and the subscription set is cleared so the next session resubscribes.
//!
//! [`MemoryBroker`] provides an in-process broker for tests and simulation;
//! `MqttBusClient` (feature `mqtt`) talks to a real MQTT broker.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Client contract and message type
pub mod client;

/// Bus error types
pub mod error;

/// In-process broker
pub mod memory;

/// MQTT broker sessions
#[cfg(feature = "mqtt")]
pub mod mqtt;

/// Session bookkeeping shared by client implementations
pub mod session;

pub use client::{BusClient, BusMessage};
pub use error::{BusError, BusResult};
pub use memory::{MemoryBroker, MemoryBusClient};
#[cfg(feature = "mqtt")]
pub use mqtt::MqttBusClient;
pub use session::{BusSession, BusSettings};
