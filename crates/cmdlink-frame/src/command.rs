//! Command identifiers.
//!
//! The leading token of every frame is its command id, sent as ASCII
//! decimal and decoded as a 16-bit integer on receipt.

/// Identifier carried by the first token of a frame.
pub type CommandId = i16;

/// Acknowledgment id expected when the caller does not name one.
pub const DEFAULT_ACK_ID: CommandId = 1;
