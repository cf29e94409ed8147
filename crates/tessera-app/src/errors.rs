//! Categorized application errors
//!
//! Every failure reaching the state container is an [`AppError`]. Its
//! [`ErrorCategory`] decides how a frontend presents it.

use std::fmt;
use std::path::PathBuf;
use tessera_bus::BusError;
use tessera_core::{EnvironmentId, LayoutError, WidgetId};
use tessera_store::StoreError;

/// Severity of a user-facing notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    /// Informational
    Info,
    /// Something the user may want to act on
    Warning,
    /// An operation failed
    Error,
}

/// High-level error categories for frontend error handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// User input validation errors (correctable by user)
    Input,
    /// Configuration errors (correctable by modifying settings)
    Config,
    /// Resource not found errors
    NotFound,
    /// Broker connectivity errors (often transient)
    Network,
    /// Local persistence failures
    Storage,
    /// Export/import encoding failures
    Serialization,
    /// General operation failures (catch-all)
    Operation,
}

impl ErrorCategory {
    /// Check if this error category is likely transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get the appropriate toast severity for this category.
    #[must_use]
    pub fn toast_severity(&self) -> ToastLevel {
        match self {
            Self::Input => ToastLevel::Info,
            Self::Config | Self::NotFound | Self::Network => ToastLevel::Warning,
            Self::Storage | Self::Serialization | Self::Operation => ToastLevel::Error,
        }
    }

    /// Get a short label for this category.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Config => "Config",
            Self::NotFound => "Not Found",
            Self::Network => "Network",
            Self::Storage => "Storage",
            Self::Serialization => "Format",
            Self::Operation => "Operation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Application error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Persistence failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The broker session failed
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// A layout document could not be encoded or decoded
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Reading or writing a layout file failed
    #[error("Layout file error at {path}: {source}")]
    File {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The operation needs a saved environment and there is none
    #[error("No environment has been created yet")]
    NoEnvironment,

    /// The environment id does not resolve to a record
    #[error("Environment {0} not found")]
    EnvironmentNotFound(EnvironmentId),

    /// The widget is not part of the current environment
    #[error("Widget {0} not found")]
    WidgetNotFound(WidgetId),

    /// No broker credentials have been saved
    #[error("No broker credentials saved")]
    NoCredentials,

    /// The requested feature is not available
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// The state container is no longer running
    #[error("Dashboard core has shut down")]
    Shutdown,

    /// The intent panicked and was contained
    #[error("Intent `{0}` failed unexpectedly")]
    Panicked(&'static str),
}

/// App result type
pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Category used for presentation.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(StoreError::NotFound(_)) => ErrorCategory::NotFound,
            Self::Store(StoreError::Conflict(_)) => ErrorCategory::Input,
            Self::Store(_) => ErrorCategory::Storage,
            Self::Bus(_) => ErrorCategory::Network,
            Self::Layout(_) => ErrorCategory::Serialization,
            Self::File { .. } => ErrorCategory::Storage,
            Self::NoEnvironment | Self::NoCredentials | Self::Unsupported(_) => ErrorCategory::Input,
            Self::EnvironmentNotFound(_) | Self::WidgetNotFound(_) => ErrorCategory::NotFound,
            Self::Config(_) => ErrorCategory::Config,
            Self::Shutdown | Self::Panicked(_) => ErrorCategory::Operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_drive_severity() {
        assert_eq!(
            AppError::Bus(BusError::NotConnected).category().toast_severity(),
            ToastLevel::Warning
        );
        assert_eq!(
            AppError::NoEnvironment.category().toast_severity(),
            ToastLevel::Info
        );
        assert_eq!(
            AppError::Store(StoreError::not_found("widget w1")).category(),
            ErrorCategory::NotFound
        );
        assert!(AppError::Bus(BusError::NotConnected).category().is_transient());
    }
}
