//! Environment model.
//!
//! An environment is a named canvas. Its transform (scale and pan offset) is
//! persisted so the canvas reopens where the user left it.

use crate::ids::EnvironmentId;
use serde::{Deserialize, Serialize};

/// A named canvas configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Store-assigned id, [`EnvironmentId::UNSAVED`] until inserted
    pub id: EnvironmentId,
    /// Display name
    pub name: String,
    /// Zoom factor
    pub scale: f32,
    /// Horizontal pan offset
    pub offset_x: f32,
    /// Vertical pan offset
    pub offset_y: f32,
}

impl Environment {
    /// A new, unsaved environment with the identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EnvironmentId::UNSAVED,
            name: name.into(),
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Whether this environment has been persisted.
    pub fn is_saved(&self) -> bool {
        self.id.is_saved()
    }

    /// Copy of this environment with a new transform.
    #[must_use]
    pub fn with_transform(&self, scale: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
            ..self.clone()
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("")
    }
}
