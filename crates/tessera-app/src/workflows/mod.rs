//! # Workflows
//!
//! Intent implementations. Each workflow does its I/O against the stores and
//! the bus, then hands the result to the owner task as a reduction.

pub(crate) mod connection;
pub(crate) mod environment;
pub mod router;
pub(crate) mod widget;

use crate::core::session::{observe_connectivity, observe_environments, start_session};
use crate::core::{AppContext, Intent, IntentOutcome, Reduction};
use crate::errors::AppResult;
use environment::EnvironmentManager;
use tessera_core::Environment;
use widget::WidgetManager;

/// Run one intent to completion.
pub(crate) async fn execute(ctx: &AppContext, intent: Intent) -> AppResult<IntentOutcome> {
    let environments = EnvironmentManager::new(ctx);
    let widgets = WidgetManager::new(ctx);

    let outcome = match intent {
        Intent::Init => {
            observe_connectivity(ctx);
            IntentOutcome::Done
        }
        Intent::LoadEnvironments => {
            observe_environments(ctx);
            IntentOutcome::Done
        }
        Intent::LoadPreviousEnvironment => {
            let previous = environments.load_previous().await?;
            if let Some(environment) = &previous {
                reload(ctx, environment).await?;
            }
            IntentOutcome::PreviousEnvironment(previous)
        }

        Intent::AddEnvironment { name } => {
            let created = environments.add(name).await?;
            reload(ctx, &created).await?;
            IntentOutcome::EnvironmentCreated(created.id)
        }
        Intent::EditEnvironment { name } => IntentOutcome::Environment(environments.edit(name).await?),
        Intent::ChangeEnvironment(id) => {
            let environment = environments.change(id).await?;
            reload(ctx, &environment).await?;
            IntentOutcome::Environment(environment)
        }
        Intent::UpdateEnvironmentTransform {
            scale,
            offset_x,
            offset_y,
        } => IntentOutcome::Environment(
            environments
                .update_transform(scale, offset_x, offset_y)
                .await?,
        ),

        Intent::AddWidget(widget) => IntentOutcome::Widget(widgets.add(widget).await?),
        Intent::EditWidget(widget) => IntentOutcome::Widget(widgets.edit(widget).await?),
        Intent::PinWidget { id, pinned } => IntentOutcome::Widget(widgets.pin(&id, pinned).await?),
        Intent::RemoveWidget(id) => {
            widgets.remove(&id).await?;
            IntentOutcome::Done
        }
        Intent::MoveWidget { id, x, y } => {
            widgets.drag_end(&id, x, y).await?;
            IntentOutcome::Done
        }
        Intent::WidgetEvent(event) => {
            router::route(ctx, &event).await?;
            IntentOutcome::Done
        }

        Intent::Export { path } => IntentOutcome::Exported(widgets.export_layout(&path).await?),
        Intent::Import { path } => IntentOutcome::Imported(widgets.import_layout(&path).await?),

        Intent::Connect(config) => {
            connection::connect(ctx, config).await?;
            IntentOutcome::Done
        }
        Intent::ConnectSaved => {
            connection::connect_saved(ctx).await?;
            IntentOutcome::Done
        }
        Intent::Disconnect => {
            connection::disconnect(ctx).await?;
            IntentOutcome::Done
        }
        Intent::ForgetCredentials => {
            connection::forget(ctx).await?;
            IntentOutcome::Done
        }

        Intent::SetEditMode(edit_mode) => {
            ctx.reduce(Reduction::EditMode(edit_mode)).await?;
            IntentOutcome::Done
        }
        Intent::SelectWidget(selection) => {
            ctx.reduce(Reduction::Selection(selection)).await?;
            IntentOutcome::Done
        }
    };
    Ok(outcome)
}

/// Load the widgets of a newly current environment.
///
/// While connected, the previous environment's session is cancelled first so
/// none of its in-flight work lands on the new environment.
async fn reload(ctx: &AppContext, environment: &Environment) -> AppResult<()> {
    if ctx.snapshot().connected {
        start_session(ctx);
    }
    WidgetManager::new(ctx)
        .load_widgets(environment.id)
        .await
        .map(|_| ())
}
