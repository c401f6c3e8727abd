/// Errors that can occur in messenger operations.
///
/// Protocol-level failures (missing arguments, unacknowledged sends) are
/// not errors; they surface as flags and `false` results.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] cmdlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] cmdlink_frame::FrameError),

    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MessengerError>;
