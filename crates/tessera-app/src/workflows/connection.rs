//! Broker connection management.
//!
//! Connection attempts are only ever made on explicit user action; a lost
//! session is reported, never retried.

use crate::core::{AppContext, Notice, Screen};
use crate::errors::{AppError, AppResult};
use tessera_core::ConnectionConfig;

/// Save `config` and connect with it.
pub(crate) async fn connect(ctx: &AppContext, config: ConnectionConfig) -> AppResult<()> {
    ctx.stores.credentials.save_credentials(&config).await?;
    open(ctx, &config).await
}

/// Connect with the saved credentials.
pub(crate) async fn connect_saved(ctx: &AppContext) -> AppResult<()> {
    let config = ctx
        .stores
        .credentials
        .credentials()
        .await?
        .ok_or(AppError::NoCredentials)?;
    open(ctx, &config).await
}

pub(crate) async fn disconnect(ctx: &AppContext) -> AppResult<()> {
    ctx.bus.disconnect().await?;
    tracing::info!("Disconnected from broker");
    Ok(())
}

/// Forget the saved credentials. The live session, if any, stays up.
pub(crate) async fn forget(ctx: &AppContext) -> AppResult<()> {
    ctx.stores.credentials.clear_credentials().await?;
    ctx.post(Notice::Navigate(Screen::Connection));
    Ok(())
}

async fn open(ctx: &AppContext, config: &ConnectionConfig) -> AppResult<()> {
    tracing::info!(endpoint = %config.endpoint(), client_id = %config.client_id, "Connecting to broker");
    ctx.bus.connect(config).await?;
    ctx.post(Notice::Navigate(Screen::Dashboard));
    Ok(())
}
