//! # Tessera Core - Domain Model
//!
//! **Purpose**: Define the dashboard domain types shared by every other crate.
//!
//! - **Environments**: named canvases with a pan/zoom transform
//! - **Widgets**: visual controls bound to a live [`DataSource`]
//! - **Connection config**: broker credentials for the single bus session
//! - **Topic filters**: MQTT-style wildcard matching used for routing
//! - **Layout codec**: the versioned JSON interchange document used for
//!   export/import
//!
//! # Architecture Constraints
//!
//! This crate is pure: no async, no I/O, no runtime coupling. Persistence
//! lives in `tessera-store`, the broker session in `tessera-bus` and the state
//! container in `tessera-app`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Broker connection credentials
pub mod connection;

/// Environment (canvas) model
pub mod environment;

/// Strongly typed identifiers
pub mod ids;

/// Layout interchange document and codec
pub mod layout;

/// Topic filter matching
pub mod topic;

/// Widget model and data sources
pub mod widget;

pub use connection::ConnectionConfig;
pub use environment::Environment;
pub use ids::{EnvironmentId, WidgetId};
pub use layout::{
    EnvironmentConfig, LayoutDocument, LayoutError, LayoutResult, WidgetConfig,
    LAYOUT_FORMAT_VERSION,
};
pub use topic::{is_valid_filter, topic_matches};
pub use widget::{DataSource, HttpMethod, Widget, WidgetType};
