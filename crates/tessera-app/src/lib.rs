//! # Tessera App - Dashboard State Container
//!
//! Portable, headless core of the dashboard. Frontends render from
//! [`DashboardState`] snapshots and feed user actions back as [`Intent`]s.
//!
//! ```text
//! UI event → Intent → workflow (store / bus I/O, background task)
//!                         ↓
//!                     Reduction → owner task → new Arc<DashboardState> → UI
//!                                      ↘ Notice (one-shot) → UI
//! ```
//!
//! - A single owner task applies every state change; background tasks only
//!   send it reductions, so intents never race on the snapshot.
//! - Reductions apply in the order their I/O completes.
//! - Notices (toasts, limit alarms, navigation) travel on their own channel
//!   and are never stored in state.
//! - Standing subscriptions (connectivity, inbound messages, environment list)
//!   live in a [`TaskScope`] and die with it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Application configuration
pub mod config;

/// State container: intents, state, notices and the owner task
pub mod core;

/// Categorized application errors
pub mod errors;

/// Scoped background tasks
pub mod tasks;

/// Intent implementations
pub mod workflows;

pub use crate::config::{default_storage_path, AppConfig};
pub use crate::core::{
    DashboardCore, DashboardState, Intent, IntentOutcome, Notice, NoticeStream, Screen, WidgetView,
};
pub use crate::errors::{AppError, AppResult, ErrorCategory, ToastLevel};
pub use crate::tasks::TaskScope;
pub use crate::workflows::router::WidgetEvent;

pub use tessera_bus::{BusClient, BusMessage, MemoryBroker};
pub use tessera_core::{
    ConnectionConfig, DataSource, Environment, EnvironmentId, Widget, WidgetId, WidgetType,
};
pub use tessera_store::{LocalStore, Stores};
