//! Widget manager and layout files.
//!
//! Widget operations are persistence pass-throughs followed by a reduction.
//! Adding or re-binding a bus widget also subscribes its topic; removing one
//! never unsubscribes, since another widget (in this or another environment)
//! may share the filter.

use crate::core::session::subscribe_topic;
use crate::core::{AppContext, Notice, Reduction};
use crate::errors::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tessera_core::{Environment, EnvironmentId, LayoutDocument, Widget, WidgetId};

pub(crate) struct WidgetManager<'a> {
    ctx: &'a AppContext,
}

impl<'a> WidgetManager<'a> {
    pub(crate) fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Persist `widget` on the current environment.
    pub(crate) async fn add(&self, mut widget: Widget) -> AppResult<Widget> {
        let environment = self.ctx.snapshot().environment.clone();
        if !environment.is_saved() {
            return Err(AppError::NoEnvironment);
        }
        widget.environment_id = environment.id;
        self.ctx.stores.widgets.insert_widget(&widget).await?;
        self.ctx
            .reduce(Reduction::WidgetAdded(widget.clone()))
            .await?;
        tracing::debug!(widget_id = %widget.id, widget_type = widget.widget_type.as_str(), "Widget added");

        if let Some(topic) = widget.topic() {
            subscribe_topic(self.ctx, topic).await;
        }
        Ok(widget)
    }

    /// Overwrite a widget's editable fields.
    ///
    /// Position, pin state and owning environment are kept from the stored
    /// record; those change through their own operations, and a concurrent
    /// drag or pin is not undone.
    pub(crate) async fn edit(&self, widget: Widget) -> AppResult<Widget> {
        let current = self.current(&widget.id)?;
        let edited = self
            .ctx
            .stores
            .widgets
            .update_widget_settings(&widget)
            .await?;
        self.ctx
            .reduce(Reduction::WidgetEdited(edited.clone()))
            .await?;

        if current.data_source != edited.data_source {
            if let Some(topic) = edited.topic() {
                subscribe_topic(self.ctx, topic).await;
            }
        }
        Ok(edited)
    }

    /// Lock or unlock a widget.
    pub(crate) async fn pin(&self, id: &WidgetId, pinned: bool) -> AppResult<Widget> {
        let mut widget = self.current(id)?;
        self.ctx
            .stores
            .widgets
            .update_widget_pin(id, pinned)
            .await?;
        self.ctx
            .reduce(Reduction::WidgetPinned {
                id: id.clone(),
                pinned,
            })
            .await?;
        widget.is_pinned = pinned;
        Ok(widget)
    }

    /// Delete a widget and drop its cached value.
    pub(crate) async fn remove(&self, id: &WidgetId) -> AppResult<()> {
        self.ctx.stores.widgets.delete_widget(id).await?;
        self.ctx.reduce(Reduction::WidgetRemoved(id.clone())).await?;
        tracing::debug!(widget_id = %id, "Widget removed");
        Ok(())
    }

    /// Persist the drop position of a dragged widget.
    pub(crate) async fn drag_end(&self, id: &WidgetId, x: f32, y: f32) -> AppResult<()> {
        self.ctx
            .stores
            .widgets
            .update_widget_position(id, x, y)
            .await?;
        self.ctx
            .reduce(Reduction::WidgetMoved { id: id.clone(), x, y })
            .await
    }

    /// Load the widgets of `environment_id` into state and subscribe their
    /// topics. Subscribing is idempotent, so reloading is safe.
    pub(crate) async fn load_widgets(&self, environment_id: EnvironmentId) -> AppResult<Vec<Widget>> {
        let widgets = self.ctx.stores.widgets.widgets_for(environment_id).await?;
        self.ctx
            .reduce(Reduction::WidgetsLoaded {
                environment_id,
                widgets: widgets.clone(),
            })
            .await?;
        tracing::debug!(%environment_id, count = widgets.len(), "Widgets loaded");

        let mut seen = HashSet::new();
        for topic in widgets.iter().filter_map(Widget::topic) {
            if seen.insert(topic) {
                subscribe_topic(self.ctx, topic).await;
            }
        }
        Ok(widgets)
    }

    /// Write the last used environment to `path` as a layout document.
    ///
    /// The document is fully built before anything touches the file system,
    /// and the file is replaced atomically.
    pub(crate) async fn export_layout(&self, path: &Path) -> AppResult<Environment> {
        let environments = &self.ctx.stores.environments;
        let id = environments
            .last_used_environment_id()
            .await?
            .filter(EnvironmentId::is_saved)
            .ok_or(AppError::NoEnvironment)?;
        let environment = environments
            .environment(id)
            .await?
            .ok_or(AppError::EnvironmentNotFound(id))?;
        let widgets = self.ctx.stores.widgets.widgets_for(id).await?;

        let state = self.ctx.snapshot();
        let values: HashMap<WidgetId, String> = if state.environment.id == id {
            state
                .widgets
                .iter()
                .map(|view| (view.widget.id.clone(), view.value.clone()))
                .collect()
        } else {
            HashMap::new()
        };

        let bytes = LayoutDocument::from_model(&environment, &widgets, &values).encode()?;
        write_atomically(path, &bytes).await?;

        tracing::info!(environment_id = %id, path = %path.display(), widgets = widgets.len(), "Layout exported");
        self.ctx.post(Notice::ExportSucceeded {
            environment: environment.clone(),
        });
        Ok(environment)
    }

    /// Import the layout document at `path` as a new environment.
    ///
    /// Widgets get fresh ids and are linked to the newly assigned
    /// environment id. If any widget fails to insert, the new environment
    /// (and every widget already inserted under it) is deleted again.
    pub(crate) async fn import_layout(&self, path: &Path) -> AppResult<Environment> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file(path, e))?;
        let (environment, widgets) = LayoutDocument::decode(&bytes)?.into_model();

        let environments = &self.ctx.stores.environments;
        let id = environments.insert_environment(environment).await?;
        if let Err(error) = self.insert_imported(id, widgets).await {
            if let Err(rollback) = environments.delete_environment(id).await {
                tracing::warn!(environment_id = %id, error = %rollback, "Import rollback failed");
            }
            return Err(error);
        }

        let imported = environments
            .environment(id)
            .await?
            .ok_or(AppError::EnvironmentNotFound(id))?;
        tracing::info!(environment_id = %id, path = %path.display(), "Layout imported");
        self.ctx.post(Notice::ImportSucceeded {
            environment: imported.clone(),
        });
        Ok(imported)
    }

    async fn insert_imported(&self, id: EnvironmentId, widgets: Vec<Widget>) -> AppResult<()> {
        for mut widget in widgets {
            widget.id = WidgetId::generate();
            widget.environment_id = id;
            self.ctx.stores.widgets.insert_widget(&widget).await?;
        }
        Ok(())
    }

    fn current(&self, id: &WidgetId) -> AppResult<Widget> {
        self.ctx
            .snapshot()
            .widget(id)
            .map(|view| view.widget.clone())
            .ok_or_else(|| AppError::WidgetNotFound(id.clone()))
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let tmp = temp_sibling(path);
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| AppError::file(&tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(AppError::file(path, e));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "layout".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_sits_next_to_target() {
        assert_eq!(
            temp_sibling(Path::new("/exports/home.json")),
            PathBuf::from("/exports/home.json.tmp")
        );
    }
}
