//! Error types for the monitor.

use thiserror::Error;

/// Errors that can occur while polling, decoding or exporting telemetry.
///
/// Nothing in the telemetry path is fatal: callers log these and keep going.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The element is unreachable or the handshake failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A request was attempted while the channel was not open.
    #[error("Send failed: {0}")]
    Send(String),

    /// The inbound frame is not valid JSON.
    #[error("Failed to decode message: {0}")]
    Decode(String),

    /// The frame decoded but a sample could not be derived from it.
    #[error("Failed to process message: {0}")]
    Processing(String),

    /// Writing the export file failed.
    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),

    /// The configuration could not be assembled.
    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<tokio_tungstenite::tungstenite::Error> for MonitorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                MonitorError::Send(err.to_string())
            }
            other => MonitorError::Connection(other.to_string()),
        }
    }
}
