//! Waiting for a peer's acknowledgment.
//!
//! [`AckWait`] is a step function: each call checks the deadline, pumps at
//! most one byte from the transport into the frame reader, and reports
//! whether the wait is over. [`Messenger::blocked_till_reply`] drives it
//! against a clock; tests drive it directly with scripted bytes and times.
//!
//! [`Messenger::blocked_till_reply`]: crate::Messenger::blocked_till_reply

use cmdlink_frame::{CommandId, FrameReader, MessageState};
use cmdlink_transport::Transport;
use tracing::{debug, trace};

use crate::config::{AckMismatch, MessengerConfig};
use crate::error::Result;

/// Acknowledgment requested for a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckRequest {
    /// Command id the peer answers with.
    pub id: CommandId,
    pub timeout_ms: u64,
}

impl AckRequest {
    pub fn new(id: CommandId, timeout_ms: u64) -> Self {
        Self { id, timeout_ms }
    }

    /// Default id and timeout from a messenger configuration.
    pub fn from_config(config: &MessengerConfig) -> Self {
        Self::new(config.default_ack_id, config.default_ack_timeout_ms)
    }
}

/// Outcome of one [`AckWait::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPoll {
    /// Nothing decisive yet; call `step` again.
    Pending,
    /// A frame led by the expected id arrived. Its remaining arguments are
    /// still readable.
    Acknowledged,
    /// A different frame arrived and the wait gave up.
    Mismatched,
    /// The deadline passed.
    TimedOut,
}

impl AckPoll {
    pub fn is_done(self) -> bool {
        self != AckPoll::Pending
    }
}

/// In-progress acknowledgment wait.
#[derive(Debug, Clone)]
pub struct AckWait {
    ack_id: CommandId,
    started_at: u64,
    timeout_ms: u64,
    on_mismatch: AckMismatch,
    strict_id: bool,
    skipped: u32,
}

impl AckWait {
    /// Start waiting at `now` for a frame led by `ack_id`.
    pub fn new(ack_id: CommandId, timeout_ms: u64, now: u64) -> Self {
        Self {
            ack_id,
            started_at: now,
            timeout_ms,
            on_mismatch: AckMismatch::Abort,
            strict_id: false,
            skipped: 0,
        }
    }

    pub fn on_mismatch(mut self, policy: AckMismatch) -> Self {
        self.on_mismatch = policy;
        self
    }

    pub fn strict_id(mut self, strict: bool) -> Self {
        self.strict_id = strict;
        self
    }

    /// Frames dropped so far under [`AckMismatch::Skip`].
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    /// Advance the wait by at most one byte.
    pub fn step<T: Transport + ?Sized>(
        &mut self,
        reader: &mut FrameReader,
        transport: &mut T,
        now: u64,
    ) -> Result<AckPoll> {
        if now.saturating_sub(self.started_at) >= self.timeout_ms {
            debug!(ack_id = self.ack_id, timeout_ms = self.timeout_ms, "ack wait timed out");
            return Ok(AckPoll::TimedOut);
        }
        if transport.available()? == 0 {
            return Ok(AckPoll::Pending);
        }

        let mut byte = [0u8; 1];
        if transport.read(&mut byte)? == 0 {
            return Ok(AckPoll::Pending);
        }
        if reader.feed(byte[0]) != MessageState::FrameComplete {
            return Ok(AckPoll::Pending);
        }

        let id = if self.strict_id {
            reader.read_i16_strict()
        } else {
            reader.read_i16()
        };
        if reader.is_arg_ok() && id == self.ack_id {
            debug!(ack_id = id, "acknowledged");
            return Ok(AckPoll::Acknowledged);
        }

        match self.on_mismatch {
            AckMismatch::Abort => {
                debug!(expected = self.ack_id, got = id, "unexpected frame during ack wait");
                Ok(AckPoll::Mismatched)
            }
            AckMismatch::Skip => {
                self.skipped += 1;
                trace!(expected = self.ack_id, got = id, "skipping frame during ack wait");
                Ok(AckPoll::Pending)
            }
        }
    }
}
