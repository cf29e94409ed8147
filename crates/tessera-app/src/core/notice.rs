//! One-shot notices.
//!
//! Notices are delivered exactly once to whoever drains the [`NoticeStream`]
//! and are never part of [`DashboardState`](super::DashboardState), so a
//! re-rendering frontend cannot replay them.

use super::intent::Screen;
use crate::errors::{AppError, ErrorCategory, ToastLevel};
use tessera_core::{Environment, WidgetId};
use tokio::sync::mpsc;

/// A one-shot side effect for the frontend.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The broker session is not live
    Disconnected,

    /// Connecting to the broker failed
    ConnectionFailed {
        /// Failure description
        reason: String,
    },

    /// A widget's live value crossed its alarm threshold
    LimitExceeded {
        /// Widget that crossed its limit
        widget_id: WidgetId,
        /// Widget label at the time
        label: String,
        /// Value received
        current_value: String,
        /// Configured threshold
        limit: String,
    },

    /// A layout file was written
    ExportSucceeded {
        /// Environment that was exported
        environment: Environment,
    },

    /// Writing a layout file failed; no file was produced
    ExportFailed {
        /// Failure description
        reason: String,
    },

    /// A layout file was imported as a new environment
    ImportSucceeded {
        /// The created environment
        environment: Environment,
    },

    /// Reading or applying a layout file failed
    ImportFailed {
        /// Failure description
        reason: String,
    },

    /// Subscribing to a widget topic failed
    SubscribeFailed {
        /// Topic filter
        topic: String,
        /// Failure description
        reason: String,
    },

    /// Publishing a widget interaction failed
    PublishFailed {
        /// Target topic
        topic: String,
        /// Failure description
        reason: String,
    },

    /// Any other intent failed
    OperationFailed {
        /// Intent name
        operation: &'static str,
        /// Failure description
        message: String,
        /// Error category
        category: ErrorCategory,
    },

    /// Ask the frontend to show a screen
    Navigate(Screen),
}

impl Notice {
    /// Wrap an intent failure.
    pub(crate) fn operation_failed(operation: &'static str, error: &AppError) -> Self {
        Self::OperationFailed {
            operation,
            message: error.to_string(),
            category: error.category(),
        }
    }

    /// Toast severity.
    pub fn level(&self) -> ToastLevel {
        match self {
            Self::ExportSucceeded { .. } | Self::ImportSucceeded { .. } | Self::Navigate(_) => {
                ToastLevel::Info
            }
            Self::Disconnected
            | Self::LimitExceeded { .. }
            | Self::SubscribeFailed { .. }
            | Self::PublishFailed { .. } => ToastLevel::Warning,
            Self::ConnectionFailed { .. } | Self::ExportFailed { .. } | Self::ImportFailed { .. } => {
                ToastLevel::Error
            }
            Self::OperationFailed { category, .. } => category.toast_severity(),
        }
    }

    /// User-facing text.
    pub fn message(&self) -> String {
        match self {
            Self::Disconnected => "Disconnected from broker".to_string(),
            Self::ConnectionFailed { reason } => format!("Connection failed: {reason}"),
            Self::LimitExceeded {
                label,
                current_value,
                limit,
                ..
            } => format!("{label}: value {current_value} exceeds limit {limit}"),
            Self::ExportSucceeded { environment } => {
                format!("Exported \"{}\"", environment.name)
            }
            Self::ExportFailed { reason } => format!("Export failed: {reason}"),
            Self::ImportSucceeded { environment } => {
                format!("Imported \"{}\"", environment.name)
            }
            Self::ImportFailed { reason } => format!("Import failed: {reason}"),
            Self::SubscribeFailed { topic, reason } => {
                format!("Cannot subscribe to {topic}: {reason}")
            }
            Self::PublishFailed { topic, reason } => format!("Cannot publish to {topic}: {reason}"),
            Self::OperationFailed {
                message, category, ..
            } => format!("{category}: {message}"),
            Self::Navigate(screen) => format!("Open {screen:?}"),
        }
    }
}

/// Sending half of the notice channel.
#[derive(Debug, Clone)]
pub(crate) struct NoticeSender {
    tx: mpsc::Sender<Notice>,
}

impl NoticeSender {
    /// Post a notice. A full or closed channel drops it.
    pub(crate) fn post(&self, notice: Notice) {
        match self.tx.try_send(notice) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(notice)) => {
                tracing::warn!(?notice, "Notice channel full, dropping notice");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Notice stream dropped");
            }
        }
    }
}

/// Receiving half of the notice channel.
#[derive(Debug)]
pub struct NoticeStream {
    rx: mpsc::Receiver<Notice>,
}

impl NoticeStream {
    /// Wait for the next notice; `None` once the container is gone.
    pub async fn recv(&mut self) -> Option<Notice> {
        self.rx.recv().await
    }

    /// Take a pending notice without waiting.
    pub fn try_recv(&mut self) -> Option<Notice> {
        self.rx.try_recv().ok()
    }

    /// Drain every pending notice.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Create a notice channel holding at most `capacity` undelivered notices.
pub(crate) fn channel(capacity: usize) -> (NoticeSender, NoticeStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (NoticeSender { tx }, NoticeStream { rx })
}
