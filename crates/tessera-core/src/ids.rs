//! Identifier newtypes.
//!
//! Environment ids are assigned by the store on insert; `0` is the sentinel
//! for an environment that has not been persisted yet. Widget ids are
//! generated on the client and must be globally unique.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned environment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(pub i64);

impl EnvironmentId {
    /// Sentinel for an environment that has no store-assigned id yet.
    pub const UNSAVED: Self = Self(0);

    /// Whether the store has assigned this id.
    pub fn is_saved(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EnvironmentId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Client-generated widget identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WidgetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsaved_sentinel_is_zero() {
        assert!(!EnvironmentId::UNSAVED.is_saved());
        assert!(!EnvironmentId::default().is_saved());
        assert!(EnvironmentId(7).is_saved());
    }

    #[test]
    fn generated_widget_ids_are_distinct() {
        let a = WidgetId::generate();
        let b = WidgetId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
