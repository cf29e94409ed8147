//! # Reductions
//!
//! A [`Reduction`] is the result of finished I/O, expressed as a state
//! change. Only the owner task applies them, one at a time, through
//! [`apply`]; it is the single place where [`DashboardState`] is mutated.
//!
//! The live-value cache is owned here as well. It is keyed twice: by widget
//! id (values a widget has actually shown) and by concrete topic (the last
//! payload seen on each topic), so a widget added after a message arrived
//! still shows it.

use super::notice::Notice;
use super::state::{DashboardState, WidgetView};
use std::collections::HashMap;
use tessera_bus::BusMessage;
use tessera_core::topic::has_wildcards;
use tessera_core::{topic_matches, Environment, EnvironmentId, Widget, WidgetId};

/// A state change produced by a finished operation.
#[derive(Debug, Clone)]
pub(crate) enum Reduction {
    /// The broker session went up or down
    Connectivity(bool),
    /// The persisted environment list changed
    EnvironmentsListed(Vec<Environment>),
    /// A different environment became current; its widgets are not loaded yet
    EnvironmentChanged(Environment),
    /// An environment was renamed
    EnvironmentRenamed { id: EnvironmentId, name: String },
    /// An environment was panned or zoomed
    EnvironmentTransformed {
        id: EnvironmentId,
        scale: f32,
        offset_x: f32,
        offset_y: f32,
    },
    /// The widget set of an environment was fetched
    WidgetsLoaded {
        environment_id: EnvironmentId,
        widgets: Vec<Widget>,
    },
    /// A widget was persisted
    WidgetAdded(Widget),
    /// The editable fields of a widget changed; position and pin state are
    /// left as they are
    WidgetEdited(Widget),
    /// A widget was locked or unlocked
    WidgetPinned { id: WidgetId, pinned: bool },
    /// A widget was dropped at a new position
    WidgetMoved { id: WidgetId, x: f32, y: f32 },
    /// A widget was deleted
    WidgetRemoved(WidgetId),
    /// A message arrived from the broker
    Inbound(BusMessage),
    /// Edit mode toggled
    EditMode(bool),
    /// Selection changed
    Selection(Option<WidgetId>),
}

/// Last-seen values, never persisted.
#[derive(Debug, Default)]
pub(crate) struct LiveValues {
    by_widget: HashMap<WidgetId, String>,
    by_topic: HashMap<String, String>,
}

impl LiveValues {
    /// Value a freshly loaded widget should show.
    pub(crate) fn value_for(&self, widget: &Widget) -> String {
        if let Some(value) = self.by_widget.get(&widget.id) {
            return value.clone();
        }
        widget
            .topic()
            .filter(|topic| !has_wildcards(topic))
            .and_then(|topic| self.by_topic.get(topic))
            .cloned()
            .unwrap_or_default()
    }

    fn record(&mut self, id: &WidgetId, value: &str) {
        self.by_widget.insert(id.clone(), value.to_string());
    }

    fn evict(&mut self, id: &WidgetId) {
        self.by_widget.remove(id);
    }
}

/// What applying a reduction did.
#[derive(Debug, Default)]
pub(crate) struct Applied {
    /// Whether the state differs and needs publishing
    pub changed: bool,
    /// Notices to post after publishing
    pub notices: Vec<Notice>,
}

impl Applied {
    fn changed() -> Self {
        Self {
            changed: true,
            notices: Vec::new(),
        }
    }

    fn unchanged() -> Self {
        Self::default()
    }
}

/// Apply one reduction.
pub(crate) fn apply(
    state: &mut DashboardState,
    live: &mut LiveValues,
    reduction: Reduction,
) -> Applied {
    match reduction {
        Reduction::Connectivity(connected) => {
            if state.connected == connected {
                return Applied::unchanged();
            }
            state.connected = connected;
            Applied::changed()
        }

        Reduction::EnvironmentsListed(environments) => {
            if let Some(current) = environments.iter().find(|e| e.id == state.environment.id) {
                if state.environment.is_saved() {
                    state.environment = current.clone();
                }
            }
            state.environments = environments;
            Applied::changed()
        }

        Reduction::EnvironmentChanged(environment) => {
            state.environment = environment;
            state.widgets.clear();
            state.selected_widget = None;
            Applied::changed()
        }

        Reduction::EnvironmentRenamed { id, name } => {
            if id != state.environment.id {
                return Applied::unchanged();
            }
            state.environment.name = name;
            Applied::changed()
        }

        Reduction::EnvironmentTransformed {
            id,
            scale,
            offset_x,
            offset_y,
        } => {
            if id != state.environment.id {
                return Applied::unchanged();
            }
            state.environment = state.environment.with_transform(scale, offset_x, offset_y);
            Applied::changed()
        }

        Reduction::WidgetsLoaded {
            environment_id,
            widgets,
        } => {
            if environment_id != state.environment.id {
                tracing::debug!(%environment_id, current = %state.environment.id, "Ignoring widgets of a stale environment");
                return Applied::unchanged();
            }
            state.widgets = widgets
                .into_iter()
                .map(|widget| WidgetView {
                    value: live.value_for(&widget),
                    widget,
                })
                .collect();
            if let Some(selected) = &state.selected_widget {
                if state.widget(selected).is_none() {
                    state.selected_widget = None;
                }
            }
            Applied::changed()
        }

        Reduction::WidgetAdded(widget) => {
            if widget.environment_id != state.environment.id {
                return Applied::unchanged();
            }
            let view = WidgetView {
                value: live.value_for(&widget),
                widget,
            };
            match state
                .widgets
                .iter_mut()
                .find(|w| w.widget.id == view.widget.id)
            {
                Some(existing) => *existing = view,
                None => state.widgets.push(view),
            }
            Applied::changed()
        }

        Reduction::WidgetEdited(widget) => {
            let Some(view) = state.widgets.iter_mut().find(|w| w.widget.id == widget.id) else {
                return Applied::unchanged();
            };
            let rebound = view.widget.data_source != widget.data_source;
            view.widget.apply_settings(&widget);
            if rebound {
                live.evict(&widget.id);
                view.value = live.value_for(&view.widget);
            }
            Applied::changed()
        }

        Reduction::WidgetPinned { id, pinned } => {
            let Some(view) = state.widgets.iter_mut().find(|w| w.widget.id == id) else {
                return Applied::unchanged();
            };
            view.widget.is_pinned = pinned;
            Applied::changed()
        }

        Reduction::WidgetMoved { id, x, y } => {
            let Some(view) = state.widgets.iter_mut().find(|w| w.widget.id == id) else {
                return Applied::unchanged();
            };
            view.widget.x = x;
            view.widget.y = y;
            Applied::changed()
        }

        Reduction::WidgetRemoved(id) => {
            live.evict(&id);
            let before = state.widgets.len();
            state.widgets.retain(|w| w.widget.id != id);
            if state.selected_widget.as_ref() == Some(&id) {
                state.selected_widget = None;
            }
            Applied {
                changed: state.widgets.len() != before,
                notices: Vec::new(),
            }
        }

        Reduction::Inbound(message) => apply_inbound(state, live, message),

        Reduction::EditMode(edit_mode) => {
            if state.edit_mode == edit_mode {
                return Applied::unchanged();
            }
            state.edit_mode = edit_mode;
            Applied::changed()
        }

        Reduction::Selection(selection) => {
            let selection = selection.filter(|id| state.widget(id).is_some());
            if state.selected_widget == selection {
                return Applied::unchanged();
            }
            state.selected_widget = selection;
            Applied::changed()
        }
    }
}

fn apply_inbound(state: &mut DashboardState, live: &mut LiveValues, message: BusMessage) -> Applied {
    let BusMessage { topic, payload } = message;
    let mut applied = Applied::unchanged();

    for view in state.widgets.iter_mut() {
        let matches = view
            .widget
            .topic()
            .is_some_and(|filter| topic_matches(filter, &topic));
        if !matches {
            continue;
        }
        view.value.clone_from(&payload);
        live.record(&view.widget.id, &payload);
        applied.changed = true;

        if view.widget.exceeds_limit(&payload) {
            applied.notices.push(Notice::LimitExceeded {
                widget_id: view.widget.id.clone(),
                label: view.widget.label.clone(),
                current_value: payload.clone(),
                limit: view.widget.limit.clone().unwrap_or_default(),
            });
        }
    }

    if !applied.changed {
        tracing::trace!(%topic, "No widget bound to topic");
    }
    live.by_topic.insert(topic, payload);
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tessera_core::{DataSource, WidgetType};

    fn loaded(widgets: Vec<Widget>) -> (DashboardState, LiveValues) {
        let mut state = DashboardState::default();
        let mut live = LiveValues::default();
        let mut environment = Environment::new("Home");
        environment.id = EnvironmentId(1);
        apply(&mut state, &mut live, Reduction::EnvironmentChanged(environment));
        apply(
            &mut state,
            &mut live,
            Reduction::WidgetsLoaded {
                environment_id: EnvironmentId(1),
                widgets,
            },
        );
        (state, live)
    }

    fn gauge(topic: &str) -> Widget {
        let mut widget = Widget::new(WidgetType::Gauge, "Temp", DataSource::mqtt(topic));
        widget.environment_id = EnvironmentId(1);
        widget
    }

    #[test]
    fn inbound_updates_matching_widgets_and_checks_limit() {
        let hot = gauge("sensors/temp").with_limit("70.0");
        let other = gauge("sensors/humidity");
        let (mut state, mut live) = loaded(vec![hot.clone(), other.clone()]);

        let applied = apply(
            &mut state,
            &mut live,
            Reduction::Inbound(BusMessage::new("sensors/temp", "85.0")),
        );

        assert!(applied.changed);
        assert_eq!(state.value_of(&hot.id), Some("85.0"));
        assert_eq!(state.value_of(&other.id), Some(""));
        assert_matches!(
            applied.notices.as_slice(),
            [Notice::LimitExceeded { current_value, limit, .. }]
                if current_value == "85.0" && limit == "70.0"
        );
    }

    #[test]
    fn wildcard_widgets_receive_concrete_topics() {
        let all = gauge("sensors/+");
        let (mut state, mut live) = loaded(vec![all.clone()]);
        apply(
            &mut state,
            &mut live,
            Reduction::Inbound(BusMessage::new("sensors/temp", "21")),
        );
        assert_eq!(state.value_of(&all.id), Some("21"));
    }

    #[test]
    fn unmatched_topic_is_dropped() {
        let (mut state, mut live) = loaded(vec![gauge("a")]);
        let applied = apply(
            &mut state,
            &mut live,
            Reduction::Inbound(BusMessage::new("b", "1")),
        );
        assert!(!applied.changed);
        assert!(applied.notices.is_empty());
    }

    #[test]
    fn removed_widget_loses_its_value_but_topic_value_survives() {
        let first = gauge("sensors/temp");
        let (mut state, mut live) = loaded(vec![first.clone()]);
        apply(
            &mut state,
            &mut live,
            Reduction::Inbound(BusMessage::new("sensors/temp", "19.5")),
        );
        apply(&mut state, &mut live, Reduction::WidgetRemoved(first.id.clone()));
        assert!(state.widgets.is_empty());
        assert_eq!(live.value_for(&first), "19.5");

        let second = gauge("sensors/temp");
        apply(&mut state, &mut live, Reduction::WidgetAdded(second.clone()));
        assert_eq!(state.value_of(&second.id), Some("19.5"));
    }

    #[test]
    fn stale_widget_load_is_ignored() {
        let (mut state, mut live) = loaded(vec![gauge("a")]);
        let applied = apply(
            &mut state,
            &mut live,
            Reduction::WidgetsLoaded {
                environment_id: EnvironmentId(7),
                widgets: Vec::new(),
            },
        );
        assert!(!applied.changed);
        assert_eq!(state.widgets.len(), 1);
    }

    #[test]
    fn changing_environment_clears_widgets_and_selection() {
        let widget = gauge("a");
        let (mut state, mut live) = loaded(vec![widget.clone()]);
        apply(
            &mut state,
            &mut live,
            Reduction::Selection(Some(widget.id.clone())),
        );
        assert_eq!(state.selected_widget, Some(widget.id));

        apply(
            &mut state,
            &mut live,
            Reduction::EnvironmentChanged(Environment::new("Other")),
        );
        assert!(state.widgets.is_empty());
        assert_eq!(state.selected_widget, None);
    }

    #[test]
    fn selecting_unknown_widget_clears_selection() {
        let (mut state, mut live) = loaded(vec![]);
        let applied = apply(
            &mut state,
            &mut live,
            Reduction::Selection(Some(WidgetId::new("ghost"))),
        );
        assert!(!applied.changed);
        assert_eq!(state.selected_widget, None);
    }

    #[test]
    fn field_level_edits_keep_other_fields() {
        let widget = gauge("a");
        let (mut state, mut live) = loaded(vec![widget.clone()]);

        apply(
            &mut state,
            &mut live,
            Reduction::WidgetMoved {
                id: widget.id.clone(),
                x: 40.0,
                y: 80.0,
            },
        );
        let mut relabelled = widget.clone();
        relabelled.label = "Renamed".into();
        apply(&mut state, &mut live, Reduction::WidgetEdited(relabelled));
        apply(
            &mut state,
            &mut live,
            Reduction::WidgetPinned {
                id: widget.id.clone(),
                pinned: true,
            },
        );
        let view = state.widget(&widget.id).map(|v| v.widget.clone()).unwrap_or(widget);
        assert_eq!((view.label.as_str(), view.x, view.y), ("Renamed", 40.0, 80.0));
        assert!(view.is_pinned);

        apply(
            &mut state,
            &mut live,
            Reduction::EnvironmentRenamed {
                id: EnvironmentId(1),
                name: "Workshop".into(),
            },
        );
        apply(
            &mut state,
            &mut live,
            Reduction::EnvironmentTransformed {
                id: EnvironmentId(1),
                scale: 2.0,
                offset_x: 5.0,
                offset_y: -5.0,
            },
        );
        assert_eq!(state.environment.name, "Workshop");
        assert_eq!(state.environment.scale, 2.0);
    }

    #[test]
    fn editing_topic_drops_widget_value() {
        let widget = gauge("a");
        let (mut state, mut live) = loaded(vec![widget.clone()]);
        apply(
            &mut state,
            &mut live,
            Reduction::Inbound(BusMessage::new("a", "1")),
        );

        let mut edited = widget.clone();
        edited.data_source = DataSource::mqtt("b");
        apply(&mut state, &mut live, Reduction::WidgetEdited(edited));
        assert_eq!(state.value_of(&widget.id), Some(""));
    }
}
