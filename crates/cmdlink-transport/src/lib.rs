//! Transport and clock collaborators for cmdlink.
//!
//! The protocol engine only needs four things from the link it runs over:
//! a non-blocking "how many bytes are ready" count, "read up to N bytes",
//! "write bytes", and a monotonic millisecond clock. This crate defines
//! those contracts and ships a few implementations:
//! - [`MemoryTransport`] for in-process loopback and scripted tests
//! - [`StreamTransport`] / [`UnixLink`] over Unix domain sockets (Unix only)
//! - [`SystemClock`] and [`ManualClock`]

pub mod clock;
pub mod error;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod stream;
#[cfg(unix)]
pub mod uds;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use traits::Transport;

#[cfg(unix)]
pub use stream::StreamTransport;
#[cfg(unix)]
pub use uds::UnixLink;
