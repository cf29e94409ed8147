//! Persistence traits consumed by the state container.
//!
//! Implementations are assumed to be the source of truth: the container
//! performs the persistence call first and only then reduces its in-memory
//! state to match.

use crate::error::StoreResult;
use async_trait::async_trait;
use tessera_core::{ConnectionConfig, Environment, EnvironmentId, Widget, WidgetId};
use tokio::sync::watch;

/// Environment persistence.
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// Insert a new environment; its `id` is ignored and a fresh one assigned.
    async fn insert_environment(&self, environment: Environment) -> StoreResult<EnvironmentId>;

    /// Overwrite an existing environment.
    async fn update_environment(&self, environment: &Environment) -> StoreResult<()>;

    /// Rename an environment, leaving its transform untouched.
    async fn rename_environment(&self, id: EnvironmentId, name: &str) -> StoreResult<Environment>;

    /// Set an environment's pan/zoom, leaving its name untouched.
    async fn update_environment_transform(
        &self,
        id: EnvironmentId,
        scale: f32,
        offset_x: f32,
        offset_y: f32,
    ) -> StoreResult<Environment>;

    /// Delete an environment and every widget it owns.
    async fn delete_environment(&self, id: EnvironmentId) -> StoreResult<()>;

    /// Stream of the full environment list; replays the current list.
    fn environments(&self) -> watch::Receiver<Vec<Environment>>;

    /// Fetch one environment.
    async fn environment(&self, id: EnvironmentId) -> StoreResult<Option<Environment>>;

    /// The most recently inserted environment.
    async fn newest_environment(&self) -> StoreResult<Option<Environment>>;

    /// The persisted "last used" environment pointer.
    async fn last_used_environment_id(&self) -> StoreResult<Option<EnvironmentId>>;

    /// Move the "last used" environment pointer.
    async fn set_last_used_environment_id(&self, id: EnvironmentId) -> StoreResult<()>;
}

/// Widget persistence.
#[async_trait]
pub trait WidgetStore: Send + Sync {
    /// Every widget owned by `environment`, in insertion order.
    async fn widgets_for(&self, environment: EnvironmentId) -> StoreResult<Vec<Widget>>;

    /// Insert a widget; fails if the id is already taken.
    async fn insert_widget(&self, widget: &Widget) -> StoreResult<()>;

    /// Overwrite an existing widget.
    async fn update_widget(&self, widget: &Widget) -> StoreResult<()>;

    /// Overwrite the editable fields of a widget (see
    /// [`Widget::apply_settings`]) and return the stored record.
    async fn update_widget_settings(&self, widget: &Widget) -> StoreResult<Widget>;

    /// Lock or unlock a widget.
    async fn update_widget_pin(&self, id: &WidgetId, pinned: bool) -> StoreResult<()>;

    /// Delete a widget.
    async fn delete_widget(&self, id: &WidgetId) -> StoreResult<()>;

    /// Move a widget on its canvas.
    async fn update_widget_position(&self, id: &WidgetId, x: f32, y: f32) -> StoreResult<()>;
}

/// Storage for the single broker connection config of a device.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Replace the stored config.
    async fn save_credentials(&self, config: &ConnectionConfig) -> StoreResult<()>;

    /// The stored config, if any.
    async fn credentials(&self) -> StoreResult<Option<ConnectionConfig>>;

    /// Forget the stored config.
    async fn clear_credentials(&self) -> StoreResult<()>;
}
