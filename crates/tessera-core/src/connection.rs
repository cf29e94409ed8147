//! Broker connection credentials.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials for the single broker session of a device.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Client identifier presented to the broker
    pub client_id: String,
    /// Broker host name or address
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Optional user name
    #[serde(default)]
    pub username: String,
    /// Optional password
    #[serde(default)]
    pub password: String,
}

impl ConnectionConfig {
    /// Credentials without authentication.
    pub fn anonymous(client_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            client_id: client_id.into(),
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
        }
    }

    /// Whether a user name was supplied.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }

    /// `host:port` for log lines.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Keep the password out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("client_id", &self.client_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
