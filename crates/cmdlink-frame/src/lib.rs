//! Escape-aware delimiter framing with typed arguments.
//!
//! A command travels as ASCII text terminated by a command separator:
//!
//! ```text
//! <id>,<arg>,<arg>...;
//! ```
//!
//! Any field separator, command separator, escape character or null byte
//! inside an argument is preceded by the escape character. This crate holds
//! the byte-level pieces shared by both directions:
//! - [`escape`]: escape detection, in-place unescaping, escaped output
//! - [`FrameReader`]: byte-at-a-time receive state machine, tokenizer and
//!   typed argument reads
//! - [`CommandWriter`]: incremental outbound frame builder
//! - [`sci`]: scientific notation without a platform float formatter

mod args;
pub mod binary;
pub mod command;
pub mod config;
pub mod error;
pub mod escape;
mod parse;
pub mod reader;
pub mod sci;
pub mod text;
mod tokenizer;
pub mod writer;

pub use binary::BinaryArg;
pub use command::{CommandId, DEFAULT_ACK_ID};
pub use config::{FrameConfig, Separators, DEFAULT_COMMAND_BUFFER_SIZE, DEFAULT_STREAM_BUFFER_SIZE};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, MessageState};
pub use sci::{format_sci, write_sci, MAX_SCI_DIGITS};
pub use text::TextArg;
pub use writer::CommandWriter;
