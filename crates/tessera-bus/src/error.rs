//! Bus errors

/// Broker session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// Connecting or authenticating failed
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The operation needs a live session
    #[error("Not connected to the broker")]
    NotConnected,

    /// The broker rejected or never received a subscription
    #[error("Subscribe to `{topic}` failed: {reason}")]
    Subscribe {
        /// Topic filter
        topic: String,
        /// Failure description
        reason: String,
    },

    /// The message could not be handed to the broker
    #[error("Publish to `{topic}` failed: {reason}")]
    Publish {
        /// Target topic
        topic: String,
        /// Failure description
        reason: String,
    },

    /// Tearing the session down failed
    #[error("Disconnect failed: {0}")]
    Disconnect(String),
}

/// Bus result type
pub type BusResult<T> = std::result::Result<T, BusError>;

impl BusError {
    /// Create a connect error
    pub fn connect(reason: impl Into<String>) -> Self {
        Self::Connect(reason.into())
    }

    /// Create a subscribe error
    pub fn subscribe(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// Create a publish error
    pub fn publish(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}
