//! Local store
//!
//! In-memory tables, optionally mirrored to a JSON snapshot file. Every
//! mutation is applied to a copy of the tables, the copy is written out, and
//! only then does it replace the live tables: a failed write leaves the store
//! exactly as it was. The table lock is held throughout, so snapshot writes
//! land in mutation order. Snapshots are written to a sibling temp file and
//! renamed into place.

use crate::error::{StoreError, StoreResult};
use crate::traits::{CredentialStore, EnvironmentStore, WidgetStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_core::{ConnectionConfig, Environment, EnvironmentId, Widget, WidgetId};
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    next_environment_id: i64,
    environments: Vec<Environment>,
    widgets: Vec<Widget>,
    last_used_environment: Option<EnvironmentId>,
    credentials: Option<ConnectionConfig>,
}

impl Tables {
    fn environment_mut(&mut self, id: EnvironmentId) -> Option<&mut Environment> {
        self.environments.iter_mut().find(|e| e.id == id)
    }

    fn widget_mut(&mut self, id: &WidgetId) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| &w.id == id)
    }

    fn existing_environment(&mut self, id: EnvironmentId) -> StoreResult<&mut Environment> {
        self.environment_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("environment {id}")))
    }

    fn existing_widget(&mut self, id: &WidgetId) -> StoreResult<&mut Widget> {
        self.widget_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("widget {id}")))
    }
}

/// Environment, widget and credential store backed by local memory.
pub struct LocalStore {
    tables: Mutex<Tables>,
    path: Option<PathBuf>,
    environments_tx: watch::Sender<Vec<Environment>>,
}

impl LocalStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::from_tables(Tables::default(), None)
    }

    /// Open (or create) a store persisted at `path`.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| StoreError::io(parent, e))?;
                }
                Tables::default()
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        tracing::info!(path = %path.display(), "Opened local store");
        Ok(Self::from_tables(tables, Some(path)))
    }

    fn from_tables(mut tables: Tables, path: Option<PathBuf>) -> Self {
        // Guard against snapshots edited by hand.
        let max_id = tables.environments.iter().map(|e| e.id.0).max().unwrap_or(0);
        tables.next_environment_id = tables.next_environment_id.max(max_id);

        let (environments_tx, _) = watch::channel(tables.environments.clone());
        Self {
            tables: Mutex::new(tables),
            path,
            environments_tx,
        }
    }

    /// Snapshot file location, if persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn flush(&self, tables: &Tables) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(tables)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    /// Apply `change` to a copy of the tables and make it live once the
    /// snapshot is written.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Tables) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut tables = self.tables.lock().await;
        let mut next = tables.clone();
        let out = change(&mut next)?;
        self.flush(&next).await?;
        let environments_changed = next.environments != tables.environments;
        *tables = next;
        if environments_changed {
            self.environments_tx.send_replace(tables.environments.clone());
        }
        Ok(out)
    }
}

#[async_trait]
impl EnvironmentStore for LocalStore {
    async fn insert_environment(&self, mut environment: Environment) -> StoreResult<EnvironmentId> {
        let id = self
            .commit(|tables| {
                tables.next_environment_id += 1;
                let id = EnvironmentId(tables.next_environment_id);
                environment.id = id;
                tables.environments.push(environment);
                Ok(id)
            })
            .await?;
        tracing::debug!(environment_id = %id, "Inserted environment");
        Ok(id)
    }

    async fn update_environment(&self, environment: &Environment) -> StoreResult<()> {
        self.commit(|tables| {
            *tables.existing_environment(environment.id)? = environment.clone();
            Ok(())
        })
        .await
    }

    async fn rename_environment(&self, id: EnvironmentId, name: &str) -> StoreResult<Environment> {
        self.commit(|tables| {
            let slot = tables.existing_environment(id)?;
            slot.name = name.to_string();
            Ok(slot.clone())
        })
        .await
    }

    async fn update_environment_transform(
        &self,
        id: EnvironmentId,
        scale: f32,
        offset_x: f32,
        offset_y: f32,
    ) -> StoreResult<Environment> {
        self.commit(|tables| {
            let slot = tables.existing_environment(id)?;
            *slot = slot.with_transform(scale, offset_x, offset_y);
            Ok(slot.clone())
        })
        .await
    }

    async fn delete_environment(&self, id: EnvironmentId) -> StoreResult<()> {
        self.commit(|tables| {
            let before = tables.environments.len();
            tables.environments.retain(|e| e.id != id);
            if tables.environments.len() == before {
                return Err(StoreError::not_found(format!("environment {id}")));
            }
            tables.widgets.retain(|w| w.environment_id != id);
            if tables.last_used_environment == Some(id) {
                tables.last_used_environment = None;
            }
            Ok(())
        })
        .await
    }

    fn environments(&self) -> watch::Receiver<Vec<Environment>> {
        self.environments_tx.subscribe()
    }

    async fn environment(&self, id: EnvironmentId) -> StoreResult<Option<Environment>> {
        let tables = self.tables.lock().await;
        Ok(tables.environments.iter().find(|e| e.id == id).cloned())
    }

    async fn newest_environment(&self) -> StoreResult<Option<Environment>> {
        let tables = self.tables.lock().await;
        Ok(tables.environments.iter().max_by_key(|e| e.id).cloned())
    }

    async fn last_used_environment_id(&self) -> StoreResult<Option<EnvironmentId>> {
        Ok(self.tables.lock().await.last_used_environment)
    }

    async fn set_last_used_environment_id(&self, id: EnvironmentId) -> StoreResult<()> {
        self.commit(|tables| {
            tables.last_used_environment = Some(id);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl WidgetStore for LocalStore {
    async fn widgets_for(&self, environment: EnvironmentId) -> StoreResult<Vec<Widget>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .widgets
            .iter()
            .filter(|w| w.environment_id == environment)
            .cloned()
            .collect())
    }

    async fn insert_widget(&self, widget: &Widget) -> StoreResult<()> {
        self.commit(|tables| {
            if tables.widgets.iter().any(|w| w.id == widget.id) {
                return Err(StoreError::conflict(format!("widget {}", widget.id)));
            }
            tables.widgets.push(widget.clone());
            Ok(())
        })
        .await
    }

    async fn update_widget(&self, widget: &Widget) -> StoreResult<()> {
        self.commit(|tables| {
            *tables.existing_widget(&widget.id)? = widget.clone();
            Ok(())
        })
        .await
    }

    async fn update_widget_settings(&self, widget: &Widget) -> StoreResult<Widget> {
        self.commit(|tables| {
            let slot = tables.existing_widget(&widget.id)?;
            slot.apply_settings(widget);
            Ok(slot.clone())
        })
        .await
    }

    async fn update_widget_pin(&self, id: &WidgetId, pinned: bool) -> StoreResult<()> {
        self.commit(|tables| {
            tables.existing_widget(id)?.is_pinned = pinned;
            Ok(())
        })
        .await
    }

    async fn delete_widget(&self, id: &WidgetId) -> StoreResult<()> {
        self.commit(|tables| {
            let before = tables.widgets.len();
            tables.widgets.retain(|w| &w.id != id);
            if tables.widgets.len() == before {
                return Err(StoreError::not_found(format!("widget {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn update_widget_position(&self, id: &WidgetId, x: f32, y: f32) -> StoreResult<()> {
        self.commit(|tables| {
            let slot = tables.existing_widget(id)?;
            slot.x = x;
            slot.y = y;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl CredentialStore for LocalStore {
    async fn save_credentials(&self, config: &ConnectionConfig) -> StoreResult<()> {
        self.commit(|tables| {
            tables.credentials = Some(config.clone());
            Ok(())
        })
        .await
    }

    async fn credentials(&self) -> StoreResult<Option<ConnectionConfig>> {
        Ok(self.tables.lock().await.credentials.clone())
    }

    async fn clear_credentials(&self) -> StoreResult<()> {
        self.commit(|tables| {
            tables.credentials = None;
            Ok(())
        })
        .await
    }
}
