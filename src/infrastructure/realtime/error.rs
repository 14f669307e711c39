use thiserror::Error;

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Failures contained inside the notification channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("connection closed with code {code}: {reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("websocket error: {message}")]
    WebSocket { message: String },

    #[error("broker error: {message}")]
    Broker { message: String },

    #[error("heartbeat timeout: nothing received from broker")]
    HeartbeatTimeout,

    #[error("protocol error: {message}")]
    Protocol { message: String },

    #[error("timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("malformed notification payload: {message}")]
    Parse { message: String },

    #[error("not connected to broker")]
    NotConnected,
}

impl ChannelError {
    #[must_use]
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn websocket(message: impl Into<String>) -> Self {
        Self::WebSocket {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    #[must_use]
    pub fn closed(code: u16, reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            code,
            reason: reason.into(),
        }
    }

    /// Whether the failure concerns the transport rather than a single payload.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        !matches!(self, Self::Parse { .. })
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse {
            message: error.to_string(),
        }
    }
}
