//! Standing subscriptions.
//!
//! - connectivity: lives in the container scope for the container's lifetime
//! - environment list: lives in the container scope
//! - inbound messages and the widget load: live in the per-session child
//!   scope, replaced whenever the connection comes back or the environment
//!   changes while connected

use super::context::AppContext;
use super::notice::Notice;
use super::reducer::Reduction;
use crate::workflows::widget::WidgetManager;
use tessera_bus::BusError;
use tokio::sync::broadcast::error::RecvError;

/// Start following the bus connectivity stream.
///
/// The current value is handled immediately: a disconnected bus posts
/// [`Notice::Disconnected`], a connected one starts a session.
pub(crate) fn observe_connectivity(ctx: &AppContext) {
    if !ctx.start_connectivity_observer() {
        tracing::debug!("Connectivity already observed");
        return;
    }
    let mut connectivity = ctx.bus.connectivity();
    let ctx = ctx.clone();
    let scope = ctx.scope.clone();
    scope.spawn(async move {
        let mut connected = *connectivity.borrow_and_update();
        on_connectivity(&ctx, connected).await;
        while connectivity.changed().await.is_ok() {
            let now = *connectivity.borrow_and_update();
            if now == connected {
                continue;
            }
            connected = now;
            on_connectivity(&ctx, connected).await;
        }
    });
}

async fn on_connectivity(ctx: &AppContext, connected: bool) {
    tracing::info!(connected, "Broker connectivity changed");
    if connected {
        // Forward inbound messages before state reports the session as live.
        let session = start_session(ctx);
        if ctx.reduce(Reduction::Connectivity(true)).await.is_err() {
            return;
        }
        let loader = ctx.clone();
        session.spawn(async move {
            let environment_id = loader.snapshot().environment.id;
            if let Err(error) = WidgetManager::new(&loader).load_widgets(environment_id).await {
                tracing::warn!(%environment_id, %error, "Loading widgets failed");
                loader.post(Notice::operation_failed("load_widgets", &error));
            }
        });
    } else {
        ctx.cancel_session();
        if ctx.reduce(Reduction::Connectivity(false)).await.is_err() {
            return;
        }
        ctx.post(Notice::Disconnected);
    }
}

/// Replace the session scope and start forwarding inbound messages.
///
/// The broadcast receiver is taken before the observer is spawned so nothing
/// published in between is lost. Messages are forwarded in arrival order and
/// reduced one at a time by the owner task.
pub(crate) fn start_session(ctx: &AppContext) -> crate::tasks::TaskScope {
    let session = ctx.replace_session();
    let mut incoming = ctx.bus.incoming();
    let forwarder = ctx.clone();
    session.spawn(async move {
        loop {
            match incoming.recv().await {
                Ok(message) => {
                    if forwarder
                        .reduce_detached(Reduction::Inbound(message))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Inbound messages dropped, consumer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    session
}

/// Subscribe to a widget topic, reporting failures instead of returning them.
///
/// Losing the connection mid-way is not reported: the next session
/// resubscribes every topic anyway.
pub(crate) async fn subscribe_topic(ctx: &AppContext, topic: &str) {
    match ctx.bus.subscribe(topic).await {
        Ok(()) => tracing::debug!(%topic, "Subscribed"),
        Err(BusError::NotConnected) => {
            tracing::debug!(%topic, "Not connected, subscription deferred");
        }
        Err(error) => {
            tracing::warn!(%topic, %error, "Subscribe failed");
            ctx.post(Notice::SubscribeFailed {
                topic: topic.to_string(),
                reason: error.to_string(),
            });
        }
    }
}

/// Mirror the persisted environment list into state.
pub(crate) fn observe_environments(ctx: &AppContext) {
    if !ctx.start_environment_listing() {
        return;
    }
    let mut environments = ctx.stores.environments.environments();
    let ctx = ctx.clone();
    let scope = ctx.scope.clone();
    scope.spawn(async move {
        loop {
            let list = environments.borrow_and_update().clone();
            if ctx
                .reduce_detached(Reduction::EnvironmentsListed(list))
                .await
                .is_err()
            {
                break;
            }
            if environments.changed().await.is_err() {
                break;
            }
        }
    });
}
