use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

/// Default receive buffer size: the longest frame is two bytes shorter.
pub const DEFAULT_COMMAND_BUFFER_SIZE: usize = 192;

/// Default batch size when draining the transport.
pub const DEFAULT_STREAM_BUFFER_SIZE: usize = 512;

/// Default cap on a formatted argument, terminator included.
pub const DEFAULT_MAX_FORMATTED_LEN: usize = 128;

/// The three bytes that give the wire its structure.
///
/// In configuration files each byte is written either as a one-character
/// string (`","`) or as a number (`44`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Separators {
    /// Separates the command id from the arguments and the arguments from each other.
    #[serde(with = "byte_repr")]
    pub field: u8,
    /// Ends a frame.
    #[serde(with = "byte_repr")]
    pub command: u8,
    /// Marks the next byte as literal data.
    #[serde(with = "byte_repr")]
    pub escape: u8,
}

impl Separators {
    pub const fn new(field: u8, command: u8, escape: u8) -> Self {
        Self {
            field,
            command,
            escape,
        }
    }

    /// True for the bytes that must be escaped inside an argument.
    pub fn is_special(&self, byte: u8) -> bool {
        byte == self.field || byte == self.command || byte == self.escape || byte == 0
    }

    pub fn validate(&self) -> Result<()> {
        let Self {
            field,
            command,
            escape,
        } = *self;
        if field == 0 || command == 0 || escape == 0 {
            return Err(FrameError::InvalidConfig(
                "separators must not be the null byte".to_string(),
            ));
        }
        if field == command || field == escape || command == escape {
            return Err(FrameError::InvalidConfig(format!(
                "separators must be distinct (field {:?}, command {:?}, escape {:?})",
                field as char, command as char, escape as char
            )));
        }
        Ok(())
    }
}

impl Default for Separators {
    fn default() -> Self {
        Self::new(b',', b';', b'/')
    }
}

/// Configuration for the frame layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub separators: Separators,
    /// Receive buffer capacity. Frames reaching `command_buffer_size - 1`
    /// bytes are dropped.
    pub command_buffer_size: usize,
    /// How many bytes one drain of the transport pulls at most.
    pub stream_buffer_size: usize,
    /// Cap on formatted arguments, terminator included.
    pub max_formatted_len: usize,
    /// Append CR LF after every command separator.
    pub print_newlines: bool,
}

impl FrameConfig {
    pub fn validate(&self) -> Result<()> {
        self.separators.validate()?;
        if self.command_buffer_size < 3 {
            return Err(FrameError::InvalidConfig(format!(
                "command_buffer_size must be at least 3, got {}",
                self.command_buffer_size
            )));
        }
        if self.stream_buffer_size == 0 {
            return Err(FrameError::InvalidConfig(
                "stream_buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.max_formatted_len == 0 {
            return Err(FrameError::InvalidConfig(
                "max_formatted_len must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            separators: Separators::default(),
            command_buffer_size: DEFAULT_COMMAND_BUFFER_SIZE,
            stream_buffer_size: DEFAULT_STREAM_BUFFER_SIZE,
            max_formatted_len: DEFAULT_MAX_FORMATTED_LEN,
            print_newlines: false,
        }
    }
}

mod byte_repr {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u8),
        Text(String),
    }

    pub fn serialize<S: Serializer>(byte: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        if byte.is_ascii_graphic() {
            serializer.serialize_char(*byte as char)
        } else {
            serializer.serialize_u8(*byte)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(byte) => Ok(byte),
            Repr::Text(text) => match text.as_bytes() {
                [byte] => Ok(*byte),
                _ => Err(D::Error::custom(format!(
                    "separator must be a single byte, got {text:?}"
                ))),
            },
        }
    }
}
