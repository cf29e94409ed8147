//! Session lifecycle: initial connectivity, connection loss and recovery.

mod support;

use assert_matches::assert_matches;
use support::Harness;
use tessera_app::{
    AppError, ConnectionConfig, DataSource, Intent, MemoryBroker, Notice, Screen, Stores, Widget,
    WidgetType,
};
use tessera_bus::BusClient;

#[tokio::test]
async fn init_while_disconnected_only_reports_it() {
    let mut h = Harness::start();
    h.core.add_environment("Home").await.unwrap();
    h.core.execute(Intent::Init).await.unwrap();

    let notice = h.notices.recv().await.unwrap();
    assert_eq!(notice, Notice::Disconnected);
    assert!(!h.core.state().connected);
    assert_eq!(h.broker.subscribe_requests(), 0);

    // A second Init does not start a second observer.
    h.core.execute(Intent::Init).await.unwrap();
    tokio::task::yield_now().await;
    assert!(h.notices.try_recv().is_none());
}

#[tokio::test]
async fn lost_connection_is_reported_and_resubscribed_on_reconnect() {
    let mut h = Harness::start();
    h.connect().await;
    h.core.add_environment("Home").await.unwrap();
    let widget = Widget::new(WidgetType::Gauge, "Temp", DataSource::mqtt("sensors/temp"));
    let id = widget.id.clone();
    h.core.execute(Intent::AddWidget(widget)).await.unwrap();
    assert_eq!(h.broker.subscribe_requests(), 1);

    h.broker.set_reachable(false);
    h.expect_notice(|n| *n == Notice::Disconnected).await;
    assert!(!h.client.is_connected());
    h.wait_for(|s| !s.connected).await;

    // Nothing queues while the broker is gone.
    h.broker.set_reachable(true);
    h.broker.publish("sensors/temp", "lost");

    h.core.execute(Intent::ConnectSaved).await.unwrap();
    h.expect_notice(|n| *n == Notice::Navigate(Screen::Dashboard))
        .await;
    h.wait_for_subscription("sensors/temp").await;
    assert_eq!(h.broker.subscribe_requests(), 2);

    h.broker.publish("sensors/temp", "23.0");
    let state = h.wait_for(|s| s.value_of(&id) == Some("23.0")).await;
    assert!(state.connected);
}

#[tokio::test]
async fn rejected_credentials_become_connection_failure() {
    let broker_user = "plant";
    let broker = MemoryBroker::new().with_credentials(broker_user, "secret");
    let mut h = Harness::with_broker(broker, Stores::in_memory());

    let mut wrong = ConnectionConfig::anonymous("dash", "localhost", 1883);
    wrong.username = broker_user.into();
    wrong.password = "guess".into();
    let result = h.core.execute(Intent::Connect(wrong.clone())).await;
    assert_matches!(result, Err(AppError::Bus(_)));

    h.core.dispatch(Intent::Connect(wrong));
    h.expect_notice(|n| matches!(n, Notice::ConnectionFailed { .. }))
        .await;

    let mut right = ConnectionConfig::anonymous("dash", "localhost", 1883);
    right.username = broker_user.into();
    right.password = "secret".into();
    h.core.execute(Intent::Connect(right)).await.unwrap();
}

#[tokio::test]
async fn saved_credentials_are_required_and_forgettable() {
    let mut h = Harness::start();
    let result = h.core.execute(Intent::ConnectSaved).await;
    assert_matches!(result, Err(AppError::NoCredentials));

    h.connect().await;
    h.core.execute(Intent::Disconnect).await.unwrap();
    h.wait_for(|s| !s.connected).await;

    h.core.execute(Intent::ForgetCredentials).await.unwrap();
    h.expect_notice(|n| *n == Notice::Navigate(Screen::Connection))
        .await;
    let result = h.core.execute(Intent::ConnectSaved).await;
    assert_matches!(result, Err(AppError::NoCredentials));
}
