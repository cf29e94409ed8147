//! # Intents: User Actions
//!
//! An intent is everything a frontend can ask the container to do. Intents
//! run on background tasks; their effects reach state only through the
//! owner task's reducer.

use crate::workflows::router::WidgetEvent;
use std::path::PathBuf;
use tessera_core::{ConnectionConfig, Environment, EnvironmentId, Widget, WidgetId};

/// Screen identifier for navigation notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Broker connection form
    Connection,
    /// The canvas of the current environment
    Dashboard,
    /// Environment list
    Environments,
}

/// A user action.
#[derive(Debug, Clone)]
pub enum Intent {
    // =========================================================================
    // Session
    // =========================================================================
    /// Start observing connectivity; widgets load and messages flow while connected
    Init,

    /// Start the standing subscription to the environment list
    LoadEnvironments,

    /// Reopen the environment used before the last restart
    LoadPreviousEnvironment,

    // =========================================================================
    // Environments
    // =========================================================================
    /// Create an environment and make it current
    AddEnvironment {
        /// Display name
        name: String,
    },

    /// Rename the current environment
    EditEnvironment {
        /// New display name
        name: String,
    },

    /// Switch to another environment and reload its widgets
    ChangeEnvironment(EnvironmentId),

    /// Persist the canvas pan/zoom of the current environment
    UpdateEnvironmentTransform {
        /// Zoom factor
        scale: f32,
        /// Horizontal pan offset
        offset_x: f32,
        /// Vertical pan offset
        offset_y: f32,
    },

    // =========================================================================
    // Widgets
    // =========================================================================
    /// Place a new widget on the current environment
    AddWidget(Widget),

    /// Replace a widget's label, data source, limit or options
    EditWidget(Widget),

    /// Lock or unlock a widget
    PinWidget {
        /// Widget to change
        id: WidgetId,
        /// New pin state
        pinned: bool,
    },

    /// Delete a widget
    RemoveWidget(WidgetId),

    /// Drop a dragged widget at a new position
    MoveWidget {
        /// Widget that was dragged
        id: WidgetId,
        /// New x position
        x: f32,
        /// New y position
        y: f32,
    },

    /// Interaction with a rendered widget
    WidgetEvent(WidgetEvent),

    // =========================================================================
    // Layout files
    // =========================================================================
    /// Export the last used environment to a layout file
    Export {
        /// Target file
        path: PathBuf,
    },

    /// Import a layout file as a new environment
    Import {
        /// Source file
        path: PathBuf,
    },

    // =========================================================================
    // Broker connection
    // =========================================================================
    /// Save credentials and connect with them
    Connect(ConnectionConfig),

    /// Connect with the saved credentials
    ConnectSaved,

    /// Close the broker session
    Disconnect,

    /// Forget the saved credentials
    ForgetCredentials,

    // =========================================================================
    // Transient UI state
    // =========================================================================
    /// Enter or leave canvas edit mode
    SetEditMode(bool),

    /// Select a widget (or clear the selection)
    SelectWidget(Option<WidgetId>),
}

impl Intent {
    /// Stable name for logs and failure notices.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::LoadEnvironments => "load_environments",
            Self::LoadPreviousEnvironment => "load_previous_environment",
            Self::AddEnvironment { .. } => "add_environment",
            Self::EditEnvironment { .. } => "edit_environment",
            Self::ChangeEnvironment(_) => "change_environment",
            Self::UpdateEnvironmentTransform { .. } => "update_environment_transform",
            Self::AddWidget(_) => "add_widget",
            Self::EditWidget(_) => "edit_widget",
            Self::PinWidget { .. } => "pin_widget",
            Self::RemoveWidget(_) => "remove_widget",
            Self::MoveWidget { .. } => "move_widget",
            Self::WidgetEvent(_) => "widget_event",
            Self::Export { .. } => "export",
            Self::Import { .. } => "import",
            Self::Connect(_) => "connect",
            Self::ConnectSaved => "connect_saved",
            Self::Disconnect => "disconnect",
            Self::ForgetCredentials => "forget_credentials",
            Self::SetEditMode(_) => "set_edit_mode",
            Self::SelectWidget(_) => "select_widget",
        }
    }
}

/// What a successfully executed intent produced.
#[derive(Debug, Clone, PartialEq)]
pub enum IntentOutcome {
    /// Nothing beyond the state change
    Done,
    /// A new environment was created and made current
    EnvironmentCreated(EnvironmentId),
    /// The current environment after the intent
    Environment(Environment),
    /// The reopened environment, or `None` when there was nothing to reopen
    PreviousEnvironment(Option<Environment>),
    /// The widget as persisted
    Widget(Widget),
    /// The environment written to the layout file
    Exported(Environment),
    /// The environment created from the layout file
    Imported(Environment),
}
