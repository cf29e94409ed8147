//! Contract tests for the in-process broker client.
#![allow(missing_docs)]

use assert_matches::assert_matches;
use tessera_bus::{BusClient, BusError, MemoryBroker};
use tessera_core::ConnectionConfig;
use tokio::sync::broadcast::error::TryRecvError;

fn config() -> ConnectionConfig {
    ConnectionConfig::anonymous("panel-test", "memory", 1883)
}

#[tokio::test]
async fn repeated_subscribe_delivers_once() {
    let broker = MemoryBroker::new();
    let client = broker.client(16);
    client.connect(&config()).await.unwrap();
    let mut rx = client.incoming();

    for _ in 0..5 {
        client.subscribe("sensors/temp").await.unwrap();
    }
    assert_eq!(broker.subscribe_requests(), 1);

    broker.publish("sensors/temp", "21.5");
    assert_eq!(rx.try_recv().map(|m| m.payload), Ok("21.5".to_string()));
    assert_matches!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn overlapping_filters_deliver_once() {
    let broker = MemoryBroker::new();
    let client = broker.client(16);
    client.connect(&config()).await.unwrap();
    client.subscribe("sensors/temp").await.unwrap();
    client.subscribe("sensors/+").await.unwrap();
    let mut rx = client.incoming();

    broker.publish("sensors/temp", "1");
    assert!(rx.try_recv().is_ok());
    assert_matches!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn operations_fail_after_connection_loss() {
    let broker = MemoryBroker::new();
    let client = broker.client(16);
    let mut connectivity = client.connectivity();
    assert!(!*connectivity.borrow_and_update());

    client.connect(&config()).await.unwrap();
    assert!(client.is_connected());
    client.subscribe("a").await.unwrap();

    broker.set_reachable(false);
    connectivity.changed().await.unwrap();
    assert!(!*connectivity.borrow());

    assert_eq!(client.publish("a", "x").await, Err(BusError::NotConnected));
    assert_eq!(client.subscribe("a").await, Err(BusError::NotConnected));
    assert_matches!(client.connect(&config()).await, Err(BusError::Connect(_)));
    assert!(broker.published().is_empty());

    // The next session starts without subscriptions and must resubscribe.
    broker.set_reachable(true);
    client.connect(&config()).await.unwrap();
    assert!(!broker.has_subscription("a"));
    client.subscribe("a").await.unwrap();
    assert!(broker.has_subscription("a"));
}

#[tokio::test]
async fn credentials_are_checked() {
    let broker = MemoryBroker::new().with_credentials("plant", "s3cret");
    let client = broker.client(4);

    assert_matches!(client.connect(&config()).await, Err(BusError::Connect(_)));

    let mut good = config();
    good.username = "plant".to_string();
    good.password = "s3cret".to_string();
    client.connect(&good).await.unwrap();
    assert!(client.is_connected());
}

#[tokio::test]
async fn publishes_reach_other_clients_and_are_logged() {
    let broker = MemoryBroker::new();
    let panel = broker.client(4);
    let device = broker.client(4);
    panel.connect(&config()).await.unwrap();
    device.connect(&config()).await.unwrap();
    device.subscribe("lights/#").await.unwrap();
    let mut rx = device.incoming();

    panel.publish("lights/porch", "1").await.unwrap();
    assert_eq!(rx.try_recv().map(|m| m.topic), Ok("lights/porch".to_string()));
    assert_eq!(broker.published().len(), 1);

    assert_matches!(
        panel.publish("lights/+", "1").await,
        Err(BusError::Publish { .. })
    );
    assert_matches!(
        panel.subscribe("lights/#/bad").await,
        Err(BusError::Subscribe { .. })
    );

    panel.disconnect().await.unwrap();
    panel.disconnect().await.unwrap();
    assert!(!panel.is_connected());
}
