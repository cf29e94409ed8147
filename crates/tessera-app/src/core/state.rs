//! Immutable state snapshot published after every reduction.

use tessera_core::{Environment, Widget, WidgetId};

/// A widget together with its live value.
///
/// The value is derived state: it comes from the container's last-seen value
/// cache, never from the persisted widget record.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetView {
    /// Persisted widget record
    pub widget: Widget,
    /// Latest live value, empty until a message arrives
    pub value: String,
}

/// Everything a frontend renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Current environment; unsaved (id 0) until one is created or loaded
    pub environment: Environment,
    /// Every persisted environment
    pub environments: Vec<Environment>,
    /// Widgets of the current environment
    pub widgets: Vec<WidgetView>,
    /// Whether the broker session is live
    pub connected: bool,
    /// Canvas edit mode
    pub edit_mode: bool,
    /// Selected widget
    pub selected_widget: Option<WidgetId>,
}

impl DashboardState {
    /// Look a widget up by id.
    pub fn widget(&self, id: &WidgetId) -> Option<&WidgetView> {
        self.widgets.iter().find(|w| &w.widget.id == id)
    }

    /// Live value of a widget.
    pub fn value_of(&self, id: &WidgetId) -> Option<&str> {
        self.widget(id).map(|w| w.value.as_str())
    }
}
