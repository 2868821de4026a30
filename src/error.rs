//! Bridge error types with stable numeric codes.
//!
//! [`BridgeError`] is the central error type of the crate. Connection
//! failures never escape as fatal errors: the session degrades to a
//! `Disconnected` display state and logs the error instead.

/// Client-side error enum with a numeric code per variant.
///
/// # Error Code Ranges
///
/// | Range     | Category            |
/// |-----------|---------------------|
/// | 1000–1999 | Configuration/Input |
/// | 2000–2999 | Connection State    |
/// | 3000–3999 | Transport           |
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A configuration value could not be parsed.
    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfig {
        /// Environment key that failed to parse.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A sensor text line carried an unparseable value.
    #[error("invalid sensor line {line:?}: {reason}")]
    InvalidSensorLine {
        /// The raw line as received.
        line: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Reading sensor input failed.
    #[error("input error: {0}")]
    Input(#[from] std::io::Error),

    /// The operation requires a connected bridge.
    #[error("bridge is not connected")]
    NotConnected,

    /// `connect` was called while a live link already exists.
    #[error("bridge is already connected to {0}")]
    AlreadyConnected(String),

    /// The websocket handshake failed or the link dropped.
    #[error("connection to {url} failed: {reason}")]
    ConnectionFailure {
        /// Endpoint that was dialed.
        url: String,
        /// Transport-level reason.
        reason: String,
    },

    /// The single scheduled reconnect attempt failed.
    #[error("reconnect to {url} failed: {reason}")]
    ReconnectFailure {
        /// Endpoint that was dialed.
        url: String,
        /// Transport-level reason.
        reason: String,
    },

    /// An inbound frame could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The outbound queue of the link is gone.
    #[error("send failed: link closed")]
    Send,
}

impl BridgeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidConfig { .. } => 1001,
            Self::InvalidSensorLine { .. } => 1002,
            Self::Input(_) => 1003,
            Self::NotConnected => 2001,
            Self::AlreadyConnected(_) => 2002,
            Self::ConnectionFailure { .. } => 3001,
            Self::ReconnectFailure { .. } => 3002,
            Self::Decode(_) => 3003,
            Self::Send => 3004,
        }
    }

    /// Returns `true` for errors the session absorbs into a
    /// `Disconnected` state rather than reporting to the caller.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailure { .. } | Self::ReconnectFailure { .. } | Self::Send
        )
    }

    /// Re-labels a [`BridgeError::ConnectionFailure`] as a
    /// [`BridgeError::ReconnectFailure`]; other variants pass through.
    #[must_use]
    pub fn into_reconnect_failure(self) -> Self {
        match self {
            Self::ConnectionFailure { url, reason } => Self::ReconnectFailure { url, reason },
            other => other,
        }
    }
}
