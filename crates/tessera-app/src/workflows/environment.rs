//! Environment manager.
//!
//! Every operation persists first and reduces state second, so state never
//! shows an environment the store does not have.

use crate::core::{AppContext, Reduction};
use crate::errors::{AppError, AppResult};
use tessera_core::{Environment, EnvironmentId};

pub(crate) struct EnvironmentManager<'a> {
    ctx: &'a AppContext,
}

impl<'a> EnvironmentManager<'a> {
    pub(crate) fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Insert a new environment named `name` and make it current.
    ///
    /// The record is fetched back by its assigned id before it becomes
    /// current, so state holds exactly what the store holds.
    pub(crate) async fn add(&self, name: String) -> AppResult<Environment> {
        let store = &self.ctx.stores.environments;
        let id = store.insert_environment(Environment::new(name)).await?;
        let created = store
            .environment(id)
            .await?
            .ok_or(AppError::EnvironmentNotFound(id))?;
        self.make_current(created.clone()).await?;
        tracing::info!(environment_id = %id, name = %created.name, "Environment created");
        Ok(created)
    }

    /// Rename the current environment.
    ///
    /// Only the name is written, so a concurrent pan/zoom is not undone.
    pub(crate) async fn edit(&self, name: String) -> AppResult<Environment> {
        let id = self.ctx.snapshot().environment.id;
        if !id.is_saved() {
            return Err(AppError::NoEnvironment);
        }
        let renamed = self
            .ctx
            .stores
            .environments
            .rename_environment(id, &name)
            .await?;
        self.ctx
            .reduce(Reduction::EnvironmentRenamed { id, name })
            .await?;
        Ok(renamed)
    }

    /// Make environment `id` current. Widgets are not reloaded here.
    pub(crate) async fn change(&self, id: EnvironmentId) -> AppResult<Environment> {
        let environment = self
            .ctx
            .stores
            .environments
            .environment(id)
            .await?
            .ok_or(AppError::EnvironmentNotFound(id))?;
        self.make_current(environment.clone()).await?;
        Ok(environment)
    }

    /// Reopen the last used environment.
    ///
    /// Returns `None`, leaving state untouched, when nothing was used before.
    pub(crate) async fn load_previous(&self) -> AppResult<Option<Environment>> {
        let store = &self.ctx.stores.environments;
        let Some(id) = store.last_used_environment_id().await? else {
            return Ok(None);
        };
        let environment = match store.environment(id).await? {
            Some(environment) if environment.is_saved() => environment,
            _ => {
                tracing::debug!(environment_id = %id, "Last used environment is gone");
                return Ok(None);
            }
        };
        self.make_current(environment.clone()).await?;
        Ok(Some(environment))
    }

    /// Update the pan/zoom of the current environment.
    ///
    /// An unsaved environment is only updated in memory. Only the transform
    /// is written, so a concurrent rename is not undone.
    pub(crate) async fn update_transform(
        &self,
        scale: f32,
        offset_x: f32,
        offset_y: f32,
    ) -> AppResult<Environment> {
        let current = self.ctx.snapshot().environment.clone();
        let id = current.id;
        let updated = if id.is_saved() {
            self.ctx
                .stores
                .environments
                .update_environment_transform(id, scale, offset_x, offset_y)
                .await?
        } else {
            tracing::debug!("Environment not saved yet, transform kept in memory");
            current.with_transform(scale, offset_x, offset_y)
        };
        self.ctx
            .reduce(Reduction::EnvironmentTransformed {
                id,
                scale,
                offset_x,
                offset_y,
            })
            .await?;
        Ok(updated)
    }

    async fn make_current(&self, environment: Environment) -> AppResult<()> {
        self.ctx
            .stores
            .environments
            .set_last_used_environment_id(environment.id)
            .await?;
        self.ctx
            .reduce(Reduction::EnvironmentChanged(environment))
            .await
    }
}
