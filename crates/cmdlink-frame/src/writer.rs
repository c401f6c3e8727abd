use std::fmt::{self, Write as _};

use bytes::{BufMut, BytesMut};
use cmdlink_transport::Transport;
use tracing::debug;

use crate::binary::BinaryArg;
use crate::command::CommandId;
use crate::config::{FrameConfig, Separators};
use crate::error::Result;
use crate::escape::{escape_byte, escape_into};
use crate::sci::write_sci;
use crate::text::TextArg;

const INITIAL_SCRATCH_CAPACITY: usize = 64;

/// Incremental builder for outbound frames.
///
/// A frame is opened with [`start`](Self::start), grown one argument at a
/// time, and closed with [`end`](Self::end). Every piece is written to the
/// transport as soon as it is appended. Appends outside an open frame are
/// ignored, and only one frame can be open at a time.
#[derive(Debug)]
pub struct CommandWriter {
    separators: Separators,
    print_newlines: bool,
    max_formatted_len: usize,
    building: bool,
    scratch: BytesMut,
}

impl CommandWriter {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            separators: config.separators,
            print_newlines: config.print_newlines,
            max_formatted_len: config.max_formatted_len,
            building: false,
            scratch: BytesMut::with_capacity(INITIAL_SCRATCH_CAPACITY),
        }
    }

    /// Whether a frame is open.
    pub fn is_building(&self) -> bool {
        self.building
    }

    /// Toggle the CR LF written after every command separator.
    pub fn set_print_newlines(&mut self, enabled: bool) {
        self.print_newlines = enabled;
    }

    pub fn print_newlines(&self) -> bool {
        self.print_newlines
    }

    pub fn separators(&self) -> &Separators {
        &self.separators
    }

    /// Open a frame for `id`.
    ///
    /// Returns `false` without writing anything when a frame is already
    /// open.
    pub fn start<T: Transport + ?Sized>(&mut self, transport: &mut T, id: CommandId) -> Result<bool> {
        if self.building {
            debug!(id, "send already in progress, start rejected");
            return Ok(false);
        }
        self.building = true;
        self.scratch.clear();
        id.write_text(&mut self.scratch);
        self.emit(transport)?;
        Ok(true)
    }

    /// Append a value as plain text.
    pub fn arg<T, A>(&mut self, transport: &mut T, value: &A) -> Result<()>
    where
        T: Transport + ?Sized,
        A: TextArg + ?Sized,
    {
        if !self.open_field() {
            return Ok(());
        }
        value.write_text(&mut self.scratch);
        self.emit(transport)
    }

    /// Append bytes with separators, escape characters and nulls escaped.
    pub fn esc_arg<T: Transport + ?Sized>(&mut self, transport: &mut T, bytes: &[u8]) -> Result<()> {
        if !self.open_field() {
            return Ok(());
        }
        escape_into(bytes, &self.separators, &mut self.scratch);
        self.emit(transport)
    }

    /// Append a formatted argument, written raw.
    ///
    /// Output past `max_formatted_len - 1` bytes is cut off.
    pub fn fmt_arg<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        if !self.open_field() {
            return Ok(());
        }
        let start = self.scratch.len();
        let _ = self.scratch.write_fmt(args);
        let limit = start + self.max_formatted_len.saturating_sub(1);
        if self.scratch.len() > limit {
            self.scratch.truncate(limit);
        }
        self.emit(transport)
    }

    /// Append a float with a fixed number of decimals.
    pub fn float_arg<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        value: f64,
        decimals: usize,
    ) -> Result<()> {
        if !self.open_field() {
            return Ok(());
        }
        let _ = write!(self.scratch, "{value:.decimals$}");
        self.emit(transport)
    }

    /// Append a float in scientific notation, see [`crate::sci`].
    pub fn sci_arg<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        value: f64,
        digits: u32,
    ) -> Result<()> {
        if !self.open_field() {
            return Ok(());
        }
        write_sci(value, digits, &mut self.scratch);
        self.emit(transport)
    }

    /// Append a value's binary image, each byte escape-checked.
    pub fn bin_arg<T, B>(&mut self, transport: &mut T, value: &B) -> Result<()>
    where
        T: Transport + ?Sized,
        B: BinaryArg,
    {
        if !self.open_field() {
            return Ok(());
        }
        let mut image = BytesMut::with_capacity(B::WIDTH);
        value.put_wire(&mut image);
        for &byte in image.iter() {
            escape_byte(byte, &self.separators, &mut self.scratch);
        }
        self.emit(transport)
    }

    /// Close the open frame and flush the transport.
    ///
    /// The frame counts as closed even when writing the separator fails.
    /// Returns `false` when no frame was open.
    pub fn end<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<bool> {
        if !self.building {
            return Ok(false);
        }
        self.building = false;
        self.scratch.clear();
        self.scratch.put_u8(self.separators.command);
        if self.print_newlines {
            self.scratch.put_slice(b"\r\n");
        }
        self.emit(transport)?;
        transport.flush()?;
        Ok(true)
    }

    fn open_field(&mut self) -> bool {
        if !self.building {
            return false;
        }
        self.scratch.clear();
        self.scratch.put_u8(self.separators.field);
        true
    }

    fn emit<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<()> {
        let result = transport.write_all(&self.scratch);
        self.scratch.clear();
        result.map_err(Into::into)
    }
}

impl Default for CommandWriter {
    fn default() -> Self {
        Self::new(&FrameConfig::default())
    }
}
