//! # DashboardCore
//!
//! Handle to a running state container. Creating one spawns the owner task;
//! dropping it (or calling [`DashboardCore::shutdown`]) cancels the owner
//! task and every standing subscription.

use super::actor;
use super::context::AppContext;
use super::intent::{Intent, IntentOutcome};
use super::notice::{self, Notice, NoticeStream};
use super::state::DashboardState;
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::tasks::TaskScope;
use crate::workflows;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tessera_bus::{BusClient, BusError};
use tessera_core::{Environment, EnvironmentId};
use tessera_store::Stores;
use tokio::sync::{mpsc, watch};

/// The dashboard state container.
///
/// # Example
///
/// ```rust,ignore
/// let (core, mut notices) = DashboardCore::start(&AppConfig::ephemeral(), stores, bus);
/// core.dispatch(Intent::Init);
/// let id = core.add_environment("Home").await?;
/// assert_eq!(core.state().environment.id, id);
/// ```
pub struct DashboardCore {
    ctx: AppContext,
}

impl DashboardCore {
    /// Spawn the owner task and return the container plus its notice stream.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        config: &AppConfig,
        stores: Stores,
        bus: Arc<dyn BusClient>,
    ) -> (Self, NoticeStream) {
        let scope = TaskScope::new("dashboard");
        let (notices, stream) = notice::channel(config.notices.capacity);
        let (inbox_tx, inbox_rx) = mpsc::channel(config.core.inbox_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(Arc::new(DashboardState::default()));

        scope.spawn(actor::run(inbox_rx, state_tx, notices.clone()));
        let ctx = AppContext::new(stores, bus, scope, notices, inbox_tx, state_rx);
        tracing::info!("Dashboard core started");
        (Self { ctx }, stream)
    }

    /// Run an intent in the background.
    ///
    /// Failures and panics are contained and reported as notices; the owner
    /// task and the standing subscriptions keep running.
    pub fn dispatch(&self, intent: Intent) {
        let ctx = self.ctx.clone();
        self.ctx.scope.spawn(async move {
            let name = intent.name();
            if let Err(error) = run_contained(&ctx, intent).await {
                tracing::warn!(intent = name, %error, "Intent failed");
                ctx.post(failure_notice(name, &error));
            }
        });
    }

    /// Run an intent and return its outcome.
    ///
    /// On success the state already reflects the intent's reductions.
    /// Success notices are posted exactly as with [`dispatch`](Self::dispatch);
    /// failures are returned instead of posted.
    pub async fn execute(&self, intent: Intent) -> AppResult<IntentOutcome> {
        run_contained(&self.ctx, intent).await
    }

    /// Latest state snapshot.
    pub fn state(&self) -> Arc<DashboardState> {
        self.ctx.snapshot()
    }

    /// Subscribe to state snapshots; the receiver starts at the latest one.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.ctx.subscribe()
    }

    /// Create an environment named `name` and make it current.
    pub async fn add_environment(&self, name: impl Into<String>) -> AppResult<EnvironmentId> {
        match self.execute(Intent::AddEnvironment { name: name.into() }).await? {
            IntentOutcome::EnvironmentCreated(id) => Ok(id),
            other => Err(unexpected("add_environment", &other)),
        }
    }

    /// Reopen the environment used before the last restart.
    ///
    /// Returns `None` when no environment has been saved yet.
    pub async fn load_previous_environment(&self) -> AppResult<Option<Environment>> {
        match self.execute(Intent::LoadPreviousEnvironment).await? {
            IntentOutcome::PreviousEnvironment(environment) => Ok(environment),
            other => Err(unexpected("load_previous_environment", &other)),
        }
    }

    /// Export the last used environment to `path`.
    pub async fn export_layout(&self, path: impl AsRef<Path>) -> AppResult<Environment> {
        let path = path.as_ref().to_path_buf();
        match self.execute(Intent::Export { path }).await? {
            IntentOutcome::Exported(environment) => Ok(environment),
            other => Err(unexpected("export", &other)),
        }
    }

    /// Import the layout at `path` as a new environment.
    pub async fn import_layout(&self, path: impl AsRef<Path>) -> AppResult<Environment> {
        let path = path.as_ref().to_path_buf();
        match self.execute(Intent::Import { path }).await? {
            IntentOutcome::Imported(environment) => Ok(environment),
            other => Err(unexpected("import", &other)),
        }
    }

    /// Stop the owner task and every standing subscription.
    pub async fn shutdown(&self) {
        if self.ctx.scope.is_cancelled() {
            return;
        }
        self.ctx.scope.cancel();
        tokio::task::yield_now().await;
        tracing::info!("Dashboard core stopped");
    }
}

impl Drop for DashboardCore {
    fn drop(&mut self) {
        self.ctx.scope.cancel();
    }
}

async fn run_contained(ctx: &AppContext, intent: Intent) -> AppResult<IntentOutcome> {
    let name = intent.name();
    tracing::debug!(intent = name, "Executing intent");
    match AssertUnwindSafe(workflows::execute(ctx, intent))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(intent = name, "Intent panicked");
            Err(AppError::Panicked(name))
        }
    }
}

/// Map an intent failure to the notice a frontend expects for it.
fn failure_notice(intent: &'static str, error: &AppError) -> Notice {
    match (intent, error) {
        ("export", _) => Notice::ExportFailed {
            reason: error.to_string(),
        },
        ("import", _) => Notice::ImportFailed {
            reason: error.to_string(),
        },
        ("connect" | "connect_saved", _) => Notice::ConnectionFailed {
            reason: error.to_string(),
        },
        (_, AppError::Bus(BusError::Publish { topic, reason })) => Notice::PublishFailed {
            topic: topic.clone(),
            reason: reason.clone(),
        },
        _ => Notice::operation_failed(intent, error),
    }
}

fn unexpected(intent: &'static str, outcome: &IntentOutcome) -> AppError {
    tracing::error!(intent, ?outcome, "Unexpected intent outcome");
    AppError::Panicked(intent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn failures_map_to_specific_notices() {
        let error = AppError::NoEnvironment;
        assert_matches!(failure_notice("export", &error), Notice::ExportFailed { .. });
        assert_matches!(failure_notice("import", &error), Notice::ImportFailed { .. });
        assert_matches!(
            failure_notice("connect_saved", &AppError::NoCredentials),
            Notice::ConnectionFailed { .. }
        );
        assert_matches!(
            failure_notice("widget_event", &AppError::Bus(BusError::publish("a/b", "offline"))),
            Notice::PublishFailed { topic, .. } if topic == "a/b"
        );
        assert_matches!(
            failure_notice("move_widget", &error),
            Notice::OperationFailed { operation: "move_widget", .. }
        );
    }
}
