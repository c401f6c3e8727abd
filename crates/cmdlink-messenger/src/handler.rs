//! Command handlers and the id → handler routing table.
//!
//! A [`HandlerRegistry`] holds per-id routes plus an optional default
//! handler that receives every command without a route of its own. A
//! registry with only a default reproduces single-callback dispatch.

use std::collections::HashMap;
use std::fmt;

use cmdlink_frame::{BinaryArg, CommandId, CommandWriter, FrameReader, TextArg};
use cmdlink_transport::Transport;

use crate::error::Result;

/// Something that can process a received command.
///
/// Implemented for every `FnMut(&mut CommandContext<'_>) -> Result<()>`.
pub trait Handler {
    fn handle(&mut self, ctx: &mut CommandContext<'_>) -> Result<()>;
}

impl<F> Handler for F
where
    F: FnMut(&mut CommandContext<'_>) -> Result<()>,
{
    fn handle(&mut self, ctx: &mut CommandContext<'_>) -> Result<()> {
        self(ctx)
    }
}

/// Routing table from command id to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    routes: HashMap<CommandId, Box<dyn Handler>>,
    fallback: Option<Box<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `id` to `handler`, replacing any previous route.
    pub fn insert(&mut self, id: CommandId, handler: Box<dyn Handler>) {
        self.routes.insert(id, handler);
    }

    pub fn remove(&mut self, id: CommandId) -> Option<Box<dyn Handler>> {
        self.routes.remove(&id)
    }

    /// Handler for commands without a route.
    pub fn set_default(&mut self, handler: Box<dyn Handler>) {
        self.fallback = Some(handler);
    }

    pub fn clear_default(&mut self) {
        self.fallback = None;
    }

    pub fn has_default(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn contains(&self, id: CommandId) -> bool {
        self.routes.contains_key(&id)
    }

    /// Number of per-id routes, not counting the default.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.fallback.is_none()
    }

    /// The handler responsible for `id`: its route, else the default.
    pub fn resolve(&mut self, id: CommandId) -> Option<&mut (dyn Handler + 'static)> {
        match self.routes.get_mut(&id) {
            Some(handler) => Some(handler.as_mut()),
            None => self.fallback.as_deref_mut(),
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.routes.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("routes", &ids)
            .field("has_default", &self.fallback.is_some())
            .finish()
    }
}

/// What a handler sees while processing one command.
///
/// Arguments after the command id are read through [`args`](Self::args).
/// Replies can be sent, but not with an acknowledgment wait: the receive
/// buffer still holds the command being handled.
pub struct CommandContext<'a> {
    id: CommandId,
    reader: &'a mut FrameReader,
    writer: &'a mut CommandWriter,
    transport: &'a mut dyn Transport,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        id: CommandId,
        reader: &'a mut FrameReader,
        writer: &'a mut CommandWriter,
        transport: &'a mut dyn Transport,
    ) -> Self {
        Self {
            id,
            reader,
            writer,
            transport,
        }
    }

    /// Id of the command being handled.
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Reader positioned after the command id.
    pub fn args(&mut self) -> &mut FrameReader {
        self.reader
    }

    pub fn send_cmd_start(&mut self, id: CommandId) -> Result<bool> {
        Ok(self.writer.start(&mut *self.transport, id)?)
    }

    pub fn send_cmd_arg<A: TextArg + ?Sized>(&mut self, value: &A) -> Result<()> {
        Ok(self.writer.arg(&mut *self.transport, value)?)
    }

    pub fn send_cmd_esc_arg(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.writer.esc_arg(&mut *self.transport, bytes)?)
    }

    pub fn send_cmd_sci_arg(&mut self, value: f64, digits: u32) -> Result<()> {
        Ok(self.writer.sci_arg(&mut *self.transport, value, digits)?)
    }

    pub fn send_cmd_bin_arg<B: BinaryArg>(&mut self, value: &B) -> Result<()> {
        Ok(self.writer.bin_arg(&mut *self.transport, value)?)
    }

    pub fn send_cmd_end(&mut self) -> Result<bool> {
        Ok(self.writer.end(&mut *self.transport)?)
    }

    /// Send a command with a single text argument.
    pub fn reply<A: TextArg + ?Sized>(&mut self, id: CommandId, value: &A) -> Result<bool> {
        if !self.send_cmd_start(id)? {
            return Ok(false);
        }
        self.send_cmd_arg(value)?;
        self.send_cmd_end()
    }

    /// Send a bare command, typically an acknowledgment.
    pub fn reply_id(&mut self, id: CommandId) -> Result<bool> {
        if !self.send_cmd_start(id)? {
            return Ok(false);
        }
        self.send_cmd_end()
    }
}
