//! Widget event router.
//!
//! Every interaction with a rendered widget has exactly one canonical
//! outbound payload. The router resolves the widget's bound topic from the
//! current state and publishes that payload through the bus adapter.

use crate::core::AppContext;
use crate::errors::{AppError, AppResult};
use tessera_bus::BusError;
use tessera_core::{DataSource, WidgetId};

/// A user interaction with a rendered widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// A button was pressed
    ButtonClick {
        /// Widget pressed
        id: WidgetId,
    },
    /// A dropdown option was picked
    DropdownSelect {
        /// Dropdown widget
        id: WidgetId,
        /// Selected option
        option: String,
    },
    /// Text was submitted from an input field
    InputSubmit {
        /// Input widget
        id: WidgetId,
        /// Submitted text
        text: String,
    },
    /// A slider was released at a value
    SliderChange {
        /// Slider widget
        id: WidgetId,
        /// New value
        value: f32,
    },
    /// A switch was flipped
    SwitchToggle {
        /// Switch widget
        id: WidgetId,
        /// New state
        on: bool,
    },
    /// A toggle button changed state
    ToggleButtonChange {
        /// Toggle button widget
        id: WidgetId,
        /// New state
        on: bool,
    },
}

impl WidgetEvent {
    /// Widget the event came from.
    pub fn widget_id(&self) -> &WidgetId {
        match self {
            Self::ButtonClick { id }
            | Self::DropdownSelect { id, .. }
            | Self::InputSubmit { id, .. }
            | Self::SliderChange { id, .. }
            | Self::SwitchToggle { id, .. }
            | Self::ToggleButtonChange { id, .. } => id,
        }
    }

    /// Outbound payload.
    ///
    /// Whole slider values keep one decimal (`42.0`), matching what other
    /// clients on the same topics send.
    pub fn payload(&self) -> String {
        match self {
            Self::ButtonClick { .. } => "1".to_string(),
            Self::DropdownSelect { option, .. } => option.clone(),
            Self::InputSubmit { text, .. } => text.clone(),
            Self::SliderChange { value, .. } => {
                if value.is_finite() && value.fract() == 0.0 {
                    format!("{value:.1}")
                } else {
                    value.to_string()
                }
            }
            Self::SwitchToggle { on, .. } | Self::ToggleButtonChange { on, .. } => on.to_string(),
        }
    }
}

/// Publish the payload of `event` to the widget's topic.
pub(crate) async fn route(ctx: &AppContext, event: &WidgetEvent) -> AppResult<()> {
    let id = event.widget_id();
    let state = ctx.snapshot();
    let view = state
        .widget(id)
        .ok_or_else(|| AppError::WidgetNotFound(id.clone()))?;

    let topic = match &view.widget.data_source {
        DataSource::Mqtt { topic } => topic.clone(),
        DataSource::Http { .. } => return Err(AppError::Unsupported("HTTP data source")),
    };
    let payload = event.payload();

    ctx.bus.publish(&topic, &payload).await.map_err(|e| match e {
        BusError::Publish { .. } => AppError::Bus(e),
        other => AppError::Bus(BusError::publish(&topic, other.to_string())),
    })?;
    tracing::debug!(widget_id = %id, %topic, %payload, "Published widget event");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> WidgetId {
        WidgetId::new("w1")
    }

    #[test]
    fn payload_table() {
        let cases = [
            (WidgetEvent::ButtonClick { id: id() }, "1"),
            (
                WidgetEvent::DropdownSelect {
                    id: id(),
                    option: "eco".into(),
                },
                "eco",
            ),
            (
                WidgetEvent::InputSubmit {
                    id: id(),
                    text: "hello".into(),
                },
                "hello",
            ),
            (WidgetEvent::SliderChange { id: id(), value: 42.0 }, "42.0"),
            (WidgetEvent::SliderChange { id: id(), value: 0.5 }, "0.5"),
            (WidgetEvent::SwitchToggle { id: id(), on: true }, "true"),
            (WidgetEvent::ToggleButtonChange { id: id(), on: false }, "false"),
        ];
        for (event, expected) in cases {
            assert_eq!(event.payload(), expected, "{event:?}");
        }
    }
}
