//! Widget model.
//!
//! A widget is a control placed on an environment's canvas and bound to a
//! [`DataSource`]. The live value shown by a widget is not part of this
//! record: it is derived state owned by the state container and rebuilt from
//! its last-seen value cache.

use crate::ids::{EnvironmentId, WidgetId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of visual control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WidgetType {
    /// Read-only text
    Text,
    /// Momentary push button
    Button,
    /// On/off switch
    Switch,
    /// Numeric slider
    Slider,
    /// Radial gauge
    Gauge,
    /// Horizontal progress bar
    ProgressBar,
    /// Time series chart
    Chart,
    /// Latching toggle button
    ToggleButton,
    /// Free text input
    InputField,
    /// On/off indicator light
    LedIndicator,
    /// Single choice from `extras`
    Dropdown,
}

impl WidgetType {
    /// Every widget type, in declaration order.
    pub const ALL: [WidgetType; 11] = [
        Self::Text,
        Self::Button,
        Self::Switch,
        Self::Slider,
        Self::Gauge,
        Self::ProgressBar,
        Self::Chart,
        Self::ToggleButton,
        Self::InputField,
        Self::LedIndicator,
        Self::Dropdown,
    ];

    /// Whether the user can interact with this widget (and so publish).
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            Self::Button
                | Self::Switch
                | Self::Slider
                | Self::ToggleButton
                | Self::InputField
                | Self::Dropdown
        )
    }

    /// Interchange name, e.g. `PROGRESS_BAR`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Button => "BUTTON",
            Self::Switch => "SWITCH",
            Self::Slider => "SLIDER",
            Self::Gauge => "GAUGE",
            Self::ProgressBar => "PROGRESS_BAR",
            Self::Chart => "CHART",
            Self::ToggleButton => "TOGGLE_BUTTON",
            Self::InputField => "INPUT_FIELD",
            Self::LedIndicator => "LED_INDICATOR",
            Self::Dropdown => "DROPDOWN",
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP request method for HTTP-backed widgets.
///
/// Layout files carry the method as free text. The common methods get their
/// own variants; anything else (other verbs, other casing) is kept verbatim
/// in [`HttpMethod::Other`] so it is written back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// Any other method text
    Other(String),
}

impl HttpMethod {
    /// Method as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Other(method) => method,
        }
    }
}

impl From<String> for HttpMethod {
    fn from(method: String) -> Self {
        match method.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            _ => Self::Other(method),
        }
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Other(method) => method,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a widget's live value comes from and where its events go.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    /// Message bus topic (filters may contain wildcards)
    #[serde(rename = "MQTT")]
    Mqtt {
        /// Topic or topic filter
        topic: String,
    },
    /// HTTP endpoint
    #[serde(rename = "HTTP")]
    Http {
        /// Endpoint URL
        url: String,
        /// Request method
        method: HttpMethod,
    },
}

impl DataSource {
    /// Bus-backed data source.
    pub fn mqtt(topic: impl Into<String>) -> Self {
        Self::Mqtt {
            topic: topic.into(),
        }
    }

    /// The bus topic, if this is a bus data source.
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Mqtt { topic } => Some(topic),
            Self::Http { .. } => None,
        }
    }
}

/// A widget placed on an environment's canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Globally unique id
    pub id: WidgetId,
    /// Kind of control
    pub widget_type: WidgetType,
    /// User-facing label
    pub label: String,
    /// Bound data source
    pub data_source: DataSource,
    /// Canvas x position
    pub x: f32,
    /// Canvas y position
    pub y: f32,
    /// Width on the canvas
    pub width: f32,
    /// Height on the canvas
    pub height: f32,
    /// Alarm threshold; values above it raise a notice
    #[serde(default)]
    pub limit: Option<String>,
    /// Widget-specific options (dropdown choices, initial switch state)
    #[serde(default)]
    pub extras: Option<Vec<String>>,
    /// Whether the widget is locked in place
    #[serde(default)]
    pub is_pinned: bool,
    /// Owning environment
    pub environment_id: EnvironmentId,
}

impl Widget {
    /// A new widget with a generated id at the canvas origin.
    pub fn new(widget_type: WidgetType, label: impl Into<String>, data_source: DataSource) -> Self {
        Self {
            id: WidgetId::generate(),
            widget_type,
            label: label.into(),
            data_source,
            x: 0.0,
            y: 0.0,
            width: 160.0,
            height: 120.0,
            limit: None,
            extras: None,
            is_pinned: false,
            environment_id: EnvironmentId::UNSAVED,
        }
    }

    /// Set the alarm threshold.
    #[must_use]
    pub fn with_limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Set the widget-specific options.
    #[must_use]
    pub fn with_extras(mut self, extras: Vec<String>) -> Self {
        self.extras = Some(extras);
        self
    }

    /// Place the widget on the canvas.
    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Bus topic this widget listens to, if any.
    pub fn topic(&self) -> Option<&str> {
        self.data_source.topic()
    }

    /// Copy the user-editable fields of `edited` onto this record.
    ///
    /// Id, position, pin state and owning environment are left alone; they
    /// change through their own operations.
    pub fn apply_settings(&mut self, edited: &Widget) {
        self.widget_type = edited.widget_type;
        self.label.clone_from(&edited.label);
        self.data_source.clone_from(&edited.data_source);
        self.width = edited.width;
        self.height = edited.height;
        self.limit.clone_from(&edited.limit);
        self.extras.clone_from(&edited.extras);
    }

    /// Whether `value` exceeds this widget's numeric limit.
    ///
    /// Non-numeric values or limits never exceed.
    pub fn exceeds_limit(&self, value: &str) -> bool {
        let Some(limit) = self.limit.as_deref() else {
            return false;
        };
        match (value.trim().parse::<f64>(), limit.trim().parse::<f64>()) {
            (Ok(value), Ok(limit)) => value > limit,
            _ => false,
        }
    }
}
