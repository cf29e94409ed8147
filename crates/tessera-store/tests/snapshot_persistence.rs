//! On-disk snapshot behaviour of the local store.
#![allow(missing_docs)]

use assert_matches::assert_matches;
use tessera_core::{ConnectionConfig, DataSource, Environment, EnvironmentId, Widget, WidgetType};
use tessera_store::{CredentialStore, EnvironmentStore, LocalStore, StoreError, WidgetStore};

#[tokio::test]
async fn reopened_store_sees_previous_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let env_id = {
        let store = LocalStore::open(&path).await.unwrap();
        let env_id = store
            .insert_environment(Environment::new("Greenhouse"))
            .await
            .unwrap();
        let mut widget = Widget::new(WidgetType::Gauge, "Humidity", DataSource::mqtt("gh/hum"));
        widget.environment_id = env_id;
        store.insert_widget(&widget).await.unwrap();
        store.set_last_used_environment_id(env_id).await.unwrap();
        store
            .save_credentials(&ConnectionConfig::anonymous("gh", "10.0.0.2", 1883))
            .await
            .unwrap();
        env_id
    };

    let reopened = LocalStore::open(&path).await.unwrap();
    assert_eq!(reopened.path(), Some(path.as_path()));
    assert_eq!(reopened.last_used_environment_id().await.unwrap(), Some(env_id));
    assert_eq!(reopened.widgets_for(env_id).await.unwrap().len(), 1);
    assert_eq!(
        reopened.credentials().await.unwrap().map(|c| c.host),
        Some("10.0.0.2".to_string())
    );

    // Ids keep increasing across restarts.
    let next = reopened
        .insert_environment(Environment::new("Shed"))
        .await
        .unwrap();
    assert!(next > env_id);
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn corrupt_snapshot_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, b"{ definitely not a snapshot").unwrap();

    match LocalStore::open(&path).await {
        Err(StoreError::Corrupt(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("corrupt snapshot accepted"),
    }
}

#[tokio::test]
async fn failed_snapshot_write_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    let store = LocalStore::open(data.join("store.json")).await.unwrap();
    let home = store.insert_environment(Environment::new("Home")).await.unwrap();
    let mut widget = Widget::new(WidgetType::Switch, "Lamp", DataSource::mqtt("home/lamp"));
    widget.environment_id = home;
    store.insert_widget(&widget).await.unwrap();
    let mut listed = store.environments();
    listed.borrow_and_update();

    std::fs::remove_dir_all(&data).unwrap();

    assert_matches!(
        store.insert_environment(Environment::new("Ghost")).await,
        Err(StoreError::Io { .. })
    );
    assert_matches!(
        store.rename_environment(home, "Renamed").await,
        Err(StoreError::Io { .. })
    );
    assert_matches!(
        store.update_widget_position(&widget.id, 9.0, 9.0).await,
        Err(StoreError::Io { .. })
    );
    assert_matches!(store.delete_environment(home).await, Err(StoreError::Io { .. }));

    assert_eq!(store.environment(EnvironmentId(2)).await.unwrap(), None);
    assert_eq!(store.environment(home).await.unwrap().map(|e| e.name), Some("Home".to_string()));
    let widgets = store.widgets_for(home).await.unwrap();
    assert_eq!((widgets[0].x, widgets[0].y), (0.0, 0.0));
    assert!(!listed.has_changed().unwrap());

    // Once writes succeed again, the failed insert left no trace behind.
    std::fs::create_dir_all(&data).unwrap();
    let next = store.insert_environment(Environment::new("Office")).await.unwrap();
    assert_eq!(next, EnvironmentId(2));
}
