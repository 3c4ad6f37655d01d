use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        TransportError::Io(error.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        TransportError::Http(error.to_string())
    }
}

impl From<tungstenite::Error> for TransportError {
    fn from(error: tungstenite::Error) -> Self {
        match error {
            tungstenite::Error::Io(io) => TransportError::Io(io.to_string()),
            other => TransportError::Protocol(other.to_string()),
        }
    }
}

/// An inbound frame that could not be decoded into an event.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed event: {0}")]
pub struct MalformedEvent(pub String);
