//! # Core Application Module
//!
//! - [`DashboardCore`]: handle to the running state container
//! - [`Intent`]: user actions
//! - [`DashboardState`]: immutable state snapshot
//! - [`Notice`]: one-shot side effects
//!
//! The owner task (`actor`) is the only writer of state. Everything else
//! talks to it through [`AppContext`].

mod actor;
mod app;
mod context;
mod intent;
mod notice;
mod reducer;
pub(crate) mod session;
mod state;

pub use app::DashboardCore;
pub use intent::{Intent, IntentOutcome, Screen};
pub use notice::{Notice, NoticeStream};
pub use state::{DashboardState, WidgetView};

pub(crate) use context::AppContext;
pub(crate) use reducer::Reduction;
