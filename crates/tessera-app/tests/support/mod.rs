//! Shared harness for dashboard scenario tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tessera_app::{
    AppConfig, ConnectionConfig, DashboardCore, DashboardState, Intent, MemoryBroker, Notice,
    NoticeStream, Stores,
};
use tessera_bus::MemoryBusClient;

pub const WAIT: Duration = Duration::from_secs(2);

pub struct Harness {
    pub core: DashboardCore,
    pub notices: NoticeStream,
    pub broker: MemoryBroker,
    pub client: Arc<MemoryBusClient>,
}

impl Harness {
    /// A core over in-memory stores and an in-process broker.
    pub fn start() -> Self {
        Self::with_stores(Stores::in_memory())
    }

    pub fn with_stores(stores: Stores) -> Self {
        Self::with_broker(MemoryBroker::new(), stores)
    }

    pub fn with_broker(broker: MemoryBroker, stores: Stores) -> Self {
        let client = Arc::new(broker.client(16));
        let (core, notices) = DashboardCore::start(&AppConfig::ephemeral(), stores, client.clone());
        Self {
            core,
            notices,
            broker,
            client,
        }
    }

    /// Observe connectivity and connect; returns once state shows the session live.
    pub async fn connect(&mut self) {
        self.core.execute(Intent::Init).await.unwrap();
        self.core
            .execute(Intent::Connect(ConnectionConfig::anonymous(
                "test", "localhost", 1883,
            )))
            .await
            .unwrap();
        self.wait_for(|s| s.connected).await;
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&Arc<DashboardState>) -> bool,
    ) -> Arc<DashboardState> {
        let mut states = self.core.subscribe();
        let state = tokio::time::timeout(WAIT, states.wait_for(predicate))
            .await
            .expect("state condition not reached in time")
            .expect("state channel closed");
        state.clone()
    }

    /// Skip notices until one satisfies `predicate`.
    pub async fn expect_notice(&mut self, mut predicate: impl FnMut(&Notice) -> bool) -> Notice {
        tokio::time::timeout(WAIT, async {
            loop {
                let notice = self.notices.recv().await.expect("notice stream closed");
                if predicate(&notice) {
                    return notice;
                }
            }
        })
        .await
        .expect("expected notice not posted in time")
    }

    /// Poll until the broker holds `filter` for a connected client.
    pub async fn wait_for_subscription(&self, filter: &str) {
        tokio::time::timeout(WAIT, async {
            while !self.broker.has_subscription(filter) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscription not made in time");
    }
}
