//! # Layout Interchange Codec
//!
//! Maps the domain model to and from the portable JSON document used for
//! export and import:
//!
//! ```text
//! {
//!   "version": 1,
//!   "environment": {"id": 1, "name": "Home", "scale": 1.0, "offsetX": 0.0, "offsetY": 0.0},
//!   "widgets": [
//!     {"id": "w1", "type": "GAUGE", "label": "Boiler",
//!      "dataSource": {"MQTT": {"topic": "sensors/temp"}},
//!      "x": 0.0, "y": 0.0, "width": 160.0, "height": 120.0, "value": ""}
//!   ]
//! }
//! ```
//!
//! The document is deliberately a separate shape from the persisted records:
//! storage can change without breaking files users already exported.
//! Documents without a `version` are read as version 1.

use crate::environment::Environment;
use crate::ids::{EnvironmentId, WidgetId};
use crate::widget::{DataSource, Widget, WidgetType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Newest interchange format this build reads and the one it writes.
pub const LAYOUT_FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    LAYOUT_FORMAT_VERSION
}

/// Layout codec errors.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The document could not be serialized
    #[error("Layout encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The input is not a valid layout document
    #[error("Layout decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The document was written by a newer format version
    #[error("Unsupported layout version {found} (newest supported is {supported})")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Newest version this build understands
        supported: u32,
    },

    /// A numeric field is NaN or infinite
    #[error("Layout field `{field}` must be a finite number")]
    NonFinite {
        /// Path of the offending field
        field: String,
    },
}

/// Layout codec result type
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;

/// Interchange form of an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    /// Id at export time; discarded on import
    pub id: i64,
    /// Display name
    pub name: String,
    /// Zoom factor
    pub scale: f32,
    /// Horizontal pan offset
    pub offset_x: f32,
    /// Vertical pan offset
    pub offset_y: f32,
}

/// Interchange form of a widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Id at export time
    pub id: String,
    /// Kind of control
    #[serde(rename = "type")]
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
    /// Last live value at export time; informational only
    #[serde(default)]
    pub value: String,
    /// Alarm threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    /// Widget-specific options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Vec<String>>,
    /// Whether the widget is locked in place
    #[serde(default)]
    pub is_pinned: bool,
    /// Owning environment at export time
    #[serde(default)]
    pub environment_id: i64,
}

/// A complete, portable environment layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    /// Interchange format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// The environment being exported
    pub environment: EnvironmentConfig,
    /// Every widget of that environment
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
}

impl From<&Environment> for EnvironmentConfig {
    fn from(environment: &Environment) -> Self {
        Self {
            id: environment.id.0,
            name: environment.name.clone(),
            scale: environment.scale,
            offset_x: environment.offset_x,
            offset_y: environment.offset_y,
        }
    }
}

impl From<EnvironmentConfig> for Environment {
    fn from(config: EnvironmentConfig) -> Self {
        Self {
            id: EnvironmentId(config.id),
            name: config.name,
            scale: config.scale,
            offset_x: config.offset_x,
            offset_y: config.offset_y,
        }
    }
}

impl WidgetConfig {
    /// Interchange form of `widget` carrying `value` as its live value.
    pub fn from_widget(widget: &Widget, value: impl Into<String>) -> Self {
        Self {
            id: widget.id.as_str().to_string(),
            widget_type: widget.widget_type,
            label: widget.label.clone(),
            data_source: widget.data_source.clone(),
            x: widget.x,
            y: widget.y,
            width: widget.width,
            height: widget.height,
            value: value.into(),
            limit: widget.limit.clone(),
            extras: widget.extras.clone(),
            is_pinned: widget.is_pinned,
            environment_id: widget.environment_id.0,
        }
    }
}

impl From<WidgetConfig> for Widget {
    fn from(config: WidgetConfig) -> Self {
        Self {
            id: WidgetId::new(config.id),
            widget_type: config.widget_type,
            label: config.label,
            data_source: config.data_source,
            x: config.x,
            y: config.y,
            width: config.width,
            height: config.height,
            limit: config.limit,
            extras: config.extras,
            is_pinned: config.is_pinned,
            environment_id: EnvironmentId(config.environment_id),
        }
    }
}

impl LayoutDocument {
    /// Build a document from the persisted model.
    ///
    /// `values` supplies the live value per widget; widgets without an entry
    /// are exported with an empty value.
    pub fn from_model(
        environment: &Environment,
        widgets: &[Widget],
        values: &HashMap<WidgetId, String>,
    ) -> Self {
        Self {
            version: LAYOUT_FORMAT_VERSION,
            environment: EnvironmentConfig::from(environment),
            widgets: widgets
                .iter()
                .map(|w| WidgetConfig::from_widget(w, values.get(&w.id).cloned().unwrap_or_default()))
                .collect(),
        }
    }

    /// Split the document back into domain records.
    ///
    /// Ids are returned as written; callers importing the layout reassign them.
    pub fn into_model(self) -> (Environment, Vec<Widget>) {
        let environment = Environment::from(self.environment);
        let widgets = self.widgets.into_iter().map(Widget::from).collect();
        (environment, widgets)
    }

    /// Serialize to pretty-printed JSON.
    pub fn encode(&self) -> LayoutResult<Vec<u8>> {
        self.check_finite()?;
        serde_json::to_vec_pretty(self).map_err(LayoutError::Encode)
    }

    /// Parse and validate a JSON document.
    pub fn decode(bytes: &[u8]) -> LayoutResult<Self> {
        let document: Self = serde_json::from_slice(bytes).map_err(LayoutError::Decode)?;
        if document.version > LAYOUT_FORMAT_VERSION {
            return Err(LayoutError::UnsupportedVersion {
                found: document.version,
                supported: LAYOUT_FORMAT_VERSION,
            });
        }
        document.check_finite()?;
        Ok(document)
    }

    fn check_finite(&self) -> LayoutResult<()> {
        let env = &self.environment;
        finite("environment.scale", env.scale)?;
        finite("environment.offsetX", env.offset_x)?;
        finite("environment.offsetY", env.offset_y)?;
        for (i, w) in self.widgets.iter().enumerate() {
            for (name, value) in [("x", w.x), ("y", w.y), ("width", w.width), ("height", w.height)] {
                finite(&format!("widgets[{i}].{name}"), value)?;
            }
        }
        Ok(())
    }
}

fn finite(field: &str, value: f32) -> LayoutResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LayoutError::NonFinite {
            field: field.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::HttpMethod;
    use assert_matches::assert_matches;

    #[test]
    fn decodes_document_without_version_or_widgets() {
        let raw = br#"{"environment":{"id":1,"name":"Home","scale":1.0,"offsetX":0.0,"offsetY":0.0},"widgets":[]}"#;
        let doc = LayoutDocument::decode(raw).unwrap_or_else(|e| panic!("decode failed: {e}"));
        assert_eq!(doc.version, LAYOUT_FORMAT_VERSION);
        assert_eq!(doc.environment.name, "Home");
        assert!(doc.widgets.is_empty());
    }

    #[test]
    fn rejects_newer_versions() {
        let raw = br#"{"version":9,"environment":{"id":1,"name":"Home","scale":1.0,"offsetX":0.0,"offsetY":0.0}}"#;
        assert_matches!(
            LayoutDocument::decode(raw),
            Err(LayoutError::UnsupportedVersion { found: 9, .. })
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(LayoutDocument::decode(b"not json"), Err(LayoutError::Decode(_)));
        assert_matches!(
            LayoutDocument::decode(br#"{"widgets":[]}"#),
            Err(LayoutError::Decode(_))
        );
    }

    #[test]
    fn http_methods_round_trip_as_written() {
        for method in ["PATCH", "get", "Post"] {
            let raw = format!(
                r#"{{"environment":{{"id":1,"name":"Api","scale":1.0,"offsetX":0.0,"offsetY":0.0}},
                    "widgets":[{{"id":"w","type":"BUTTON","label":"Go",
                    "dataSource":{{"HTTP":{{"url":"http://plant.local/go","method":"{method}"}}}},
                    "x":0.0,"y":0.0,"width":1.0,"height":1.0,"value":""}}]}}"#
            );
            let doc = LayoutDocument::decode(raw.as_bytes())
                .unwrap_or_else(|e| panic!("decode of {method} failed: {e}"));
            assert_matches!(
                &doc.widgets[0].data_source,
                DataSource::Http { method: HttpMethod::Other(m), .. } if m == method
            );

            let again = LayoutDocument::decode(&doc.encode().unwrap_or_default())
                .unwrap_or_else(|e| panic!("re-decode of {method} failed: {e}"));
            assert_eq!(again, doc);
        }

        let raw = br#"{"environment":{"id":1,"name":"Api","scale":1.0,"offsetX":0.0,"offsetY":0.0},
            "widgets":[{"id":"w","type":"BUTTON","label":"Go",
            "dataSource":{"HTTP":{"url":"http://plant.local/go","method":"DELETE"}},
            "x":0.0,"y":0.0,"width":1.0,"height":1.0,"value":""}]}"#;
        let doc = LayoutDocument::decode(raw).unwrap_or_else(|e| panic!("decode failed: {e}"));
        assert_matches!(
            &doc.widgets[0].data_source,
            DataSource::Http { method: HttpMethod::Delete, .. }
        );
    }

    #[test]
    fn encode_refuses_non_finite_transform() {
        let mut env = Environment::new("Broken");
        env.scale = f32::NAN;
        let doc = LayoutDocument::from_model(&env, &[], &HashMap::new());
        assert_matches!(doc.encode(), Err(LayoutError::NonFinite { field }) if field == "environment.scale");
    }

    #[test]
    fn widget_fields_use_interchange_names() {
        let widget = Widget::new(WidgetType::ProgressBar, "Tank", DataSource::mqtt("tank/level"));
        let mut values = HashMap::new();
        values.insert(widget.id.clone(), "42".to_string());
        let doc = LayoutDocument::from_model(&Environment::new("Plant"), &[widget], &values);

        let json: serde_json::Value =
            serde_json::from_slice(&doc.encode().unwrap_or_default()).unwrap_or_default();
        let first = &json["widgets"][0];
        assert_eq!(first["type"], "PROGRESS_BAR");
        assert_eq!(first["dataSource"]["MQTT"]["topic"], "tank/level");
        assert_eq!(first["value"], "42");
        assert_eq!(json["environment"]["offsetX"], 0.0);
        assert!(first.get("limit").is_none());
    }
}
