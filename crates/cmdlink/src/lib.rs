//! Framed command messaging over serial-like byte links.
//!
//! cmdlink exchanges discrete commands with typed arguments between two
//! peers over a byte stream, with optional acknowledged delivery. A frame
//! on the wire looks like `<id>,<arg>,<arg>;` with separators and the
//! escape character configurable.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte link and clock contracts (in-memory, Unix sockets)
//! - [`frame`]: Escaping, frame reader, typed arguments, command writer
//! - [`messenger`]: Dispatch loop, handler routing, acknowledgment waits
//!
//! # Example
//!
//! ```
//! use cmdlink::messenger::{CommandContext, Messenger};
//! use cmdlink::transport::MemoryTransport;
//!
//! let (device_link, host_link) = MemoryTransport::pair();
//! let mut device = Messenger::new(device_link);
//! let mut host = Messenger::new(host_link);
//!
//! device.attach_command(4, |ctx: &mut CommandContext<'_>| {
//!     let a = ctx.args().read_i32();
//!     let b = ctx.args().read_i32();
//!     ctx.reply(5, &(a + b))?;
//!     Ok(())
//! });
//!
//! host.send_cmd_start(4)?;
//! host.send_cmd_arg(&2)?;
//! host.send_cmd_arg(&40)?;
//! host.send_cmd_end(None)?;
//!
//! assert_eq!(device.feed_in_serial_data()?, 1);
//! host.attach_command(5, |ctx: &mut CommandContext<'_>| {
//!     assert_eq!(ctx.args().read_i32(), 42);
//!     Ok(())
//! });
//! assert_eq!(host.feed_in_serial_data()?, 1);
//! # Ok::<(), cmdlink::messenger::MessengerError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use cmdlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cmdlink_frame::*;
}

/// Re-export messenger types.
pub mod messenger {
    pub use cmdlink_messenger::*;
}
