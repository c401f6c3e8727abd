use cmdlink_transport::TransportError;

/// Errors that can occur while framing commands.
///
/// Protocol-level problems (oversized frames, missing arguments) are not
/// errors here; they are absorbed or reported through the arg-ok flag.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The underlying link failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The framing configuration cannot work on the wire.
    #[error("invalid frame configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
