//! Command messenger: dispatch and acknowledged sends.
//!
//! This is the layer applications talk to. A [`Messenger`] owns one
//! transport, drains it into a [`FrameReader`](cmdlink_frame::FrameReader),
//! routes completed commands to registered handlers, and sends commands
//! with an optional wait for the peer's acknowledgment.

pub mod ack;
pub mod config;
pub mod error;
pub mod handler;
pub mod messenger;

pub use ack::{AckPoll, AckRequest, AckWait};
pub use config::{AckMismatch, MessengerConfig, DEFAULT_ACK_TIMEOUT_MS};
pub use error::{MessengerError, Result};
pub use handler::{CommandContext, Handler, HandlerRegistry};
pub use messenger::Messenger;
