//! Transport error types

use std::fmt;
use std::io;

/// Failures talking to an APRS-IS server
#[derive(Debug)]
pub enum TransportError {
    /// Name resolution or TCP connect failed
    ConnectFailed { address: String, source: io::Error },
    /// Server closed the socket before the login exchange finished
    LoginFailed { details: String },
    /// A send was attempted without an open session
    NotConnected,
    /// Writing to the socket failed
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectFailed { address, source } => {
                write!(f, "Failed to connect to {}: {}", address, source)
            }
            TransportError::LoginFailed { details } => {
                write!(f, "APRS-IS login failed: {}", details)
            }
            TransportError::NotConnected => write!(f, "Not connected to APRS-IS"),
            TransportError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::ConnectFailed { source, .. } => Some(source),
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        TransportError::Io(err)
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
