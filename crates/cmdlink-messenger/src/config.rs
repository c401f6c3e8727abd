use cmdlink_frame::{CommandId, FrameConfig, FrameError, DEFAULT_ACK_ID};
use serde::{Deserialize, Serialize};

use crate::error::{MessengerError, Result};

/// Acknowledgment timeout used when the caller does not give one.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 5000;

/// What an acknowledgment wait does with a completed frame that is not the
/// expected acknowledgment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckMismatch {
    /// Give up immediately and report the send as unacknowledged.
    #[default]
    Abort,
    /// Drop the frame and keep waiting until the deadline.
    Skip,
}

/// Configuration for a [`Messenger`](crate::Messenger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessengerConfig {
    pub frame: FrameConfig,
    /// Id expected back when a send asks for an acknowledgment without
    /// naming one.
    pub default_ack_id: CommandId,
    pub default_ack_timeout_ms: u64,
    pub ack_mismatch: AckMismatch,
    /// Require the acknowledgment id token to be fully numeric. When off, a
    /// token such as `abc` reads as id 0 and can acknowledge a wait for 0.
    pub strict_ack_id: bool,
}

impl MessengerConfig {
    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.frame.validate().map_err(|err| match err {
            FrameError::InvalidConfig(msg) => MessengerError::Config(msg),
            other => MessengerError::Frame(other),
        })
    }
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            default_ack_id: DEFAULT_ACK_ID,
            default_ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            ack_mismatch: AckMismatch::Abort,
            strict_ack_id: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MessengerConfig::default();
        assert_eq!(config.default_ack_id, 1);
        assert_eq!(config.default_ack_timeout_ms, 5000);
        assert_eq!(config.ack_mismatch, AckMismatch::Abort);
        assert!(!config.strict_ack_id);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = MessengerConfig::from_json_str(
            r#"{"default_ack_timeout_ms": 250, "ack_mismatch": "skip", "frame": {"print_newlines": true}}"#,
        )
        .unwrap();
        assert_eq!(config.default_ack_timeout_ms, 250);
        assert_eq!(config.ack_mismatch, AckMismatch::Skip);
        assert!(config.frame.print_newlines);
        assert_eq!(config.frame.command_buffer_size, 192);
    }

    #[test]
    fn test_invalid_frame_settings_are_config_errors() {
        let err = MessengerConfig::from_json_str(r#"{"frame": {"command_buffer_size": 2}}"#)
            .unwrap_err();
        assert!(matches!(err, MessengerError::Config(_)));

        let err = MessengerConfig::from_json_str(
            r#"{"frame": {"separators": {"field": ",", "command": ",", "escape": "/"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MessengerError::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        let err = MessengerConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, MessengerError::Json(_)));
    }

    #[test]
    fn test_serializes_back() {
        let config = MessengerConfig {
            strict_ack_id: true,
            ..MessengerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(MessengerConfig::from_json_str(&json).unwrap(), config);
    }
}
