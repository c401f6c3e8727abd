use tracing::{debug, trace};

use crate::config::{FrameConfig, Separators};
use crate::escape::is_escaped;
use crate::tokenizer::{split_next, ArgCursor};

/// Where the receive side is in the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Bytes are being collected; no separator seen yet.
    Accumulating,
    /// The byte just fed closed a non-empty frame.
    FrameComplete,
    /// Arguments of the completed frame are being read.
    ReadingArguments,
}

/// Byte-at-a-time receive state machine.
///
/// Bytes are appended to a fixed-capacity buffer until an unescaped
/// command separator arrives. Escape characters are kept at this layer;
/// escaping only decides where frames end. A completed frame stays in the
/// buffer, tokenized in place, until the next byte is fed.
///
/// A frame that would fill the buffer is dropped together with everything
/// up to its closing separator; nothing is reported to the caller except
/// through [`dropped_frames`](Self::dropped_frames).
#[derive(Debug)]
pub struct FrameReader {
    buf: Box<[u8]>,
    index: usize,
    frame_len: usize,
    last: u8,
    discarding: bool,
    state: MessageState,
    separators: Separators,
    pub(crate) cursor: ArgCursor,
    pub(crate) arg_ok: bool,
    dropped: u64,
}

impl FrameReader {
    /// Create a reader with default configuration.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            buf: vec![0u8; config.command_buffer_size.max(3)].into_boxed_slice(),
            index: 0,
            frame_len: 0,
            last: 0,
            discarding: false,
            state: MessageState::Accumulating,
            separators: config.separators,
            cursor: ArgCursor {
                consumed: true,
                ..ArgCursor::default()
            },
            arg_ok: false,
            dropped: 0,
        }
    }

    /// Process one raw byte and return the resulting state.
    ///
    /// Returns [`MessageState::FrameComplete`] exactly when `byte` closed a
    /// non-empty frame; the frame is then readable through [`next`](Self::next)
    /// and the typed reads until the following call.
    pub fn feed(&mut self, byte: u8) -> MessageState {
        self.state = MessageState::Accumulating;
        let escaped = is_escaped(byte, self.separators.escape, &mut self.last);

        if byte == self.separators.command && !escaped {
            if self.discarding {
                trace!("end of dropped frame");
                self.discarding = false;
            } else if self.index > 0 {
                self.buf[self.index] = 0;
                self.frame_len = self.index;
                self.state = MessageState::FrameComplete;
                self.cursor.rewind();
            }
            self.last = 0;
            self.index = 0;
            return self.state;
        }

        if self.discarding {
            return self.state;
        }

        self.buf[self.index] = byte;
        self.index += 1;
        if self.index >= self.buf.len() - 1 {
            self.dropped += 1;
            debug!(
                capacity = self.buf.len(),
                dropped = self.dropped,
                "command buffer overflow, dropping frame"
            );
            self.index = 0;
            self.discarding = true;
        }
        self.state
    }

    /// Feed a slice, calling `on_frame` after every completed frame.
    ///
    /// Returns the number of frames completed.
    pub fn feed_all(&mut self, bytes: &[u8], mut on_frame: impl FnMut(&mut Self)) -> usize {
        let mut completed = 0;
        for &byte in bytes {
            if self.feed(byte) == MessageState::FrameComplete {
                completed += 1;
                on_frame(self);
            }
        }
        completed
    }

    /// Advance to the next argument if the current one has been read.
    ///
    /// Returns `true` while an argument is available. The first token of a
    /// frame is its command id. Calling `next` repeatedly without a typed
    /// read in between does not skip arguments.
    pub fn next(&mut self) -> bool {
        match self.state {
            MessageState::Accumulating => return false,
            MessageState::FrameComplete => {
                self.state = MessageState::ReadingArguments;
                self.cursor.rewind();
            }
            MessageState::ReadingArguments => {}
        }

        if self.cursor.consumed {
            let frame = &mut self.buf[..=self.frame_len];
            match split_next(frame, self.cursor.next, &self.separators) {
                Some((token, next)) => {
                    self.cursor.current = Some(token);
                    self.cursor.next = next;
                    self.cursor.consumed = false;
                }
                None => {
                    self.cursor.current = None;
                    self.cursor.next = self.frame_len;
                }
            }
        }
        self.cursor.current.is_some()
    }

    /// Alias for [`next`](Self::next).
    pub fn available(&mut self) -> bool {
        self.next()
    }

    /// Whether the last typed read found an argument.
    ///
    /// This reports presence, not well-formedness: `"abc"` read as an
    /// integer yields `0` with the flag set.
    pub fn is_arg_ok(&self) -> bool {
        self.arg_ok
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    pub fn separators(&self) -> &Separators {
        &self.separators
    }

    /// Raw bytes of the last completed frame, as tokenized so far.
    pub fn frame(&self) -> &[u8] {
        &self.buf[..self.frame_len]
    }

    /// Whole receive buffer; argument ranges index into it.
    pub(crate) fn frame_buf(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn frame_buf_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Bytes collected for the frame in progress.
    pub fn pending(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Frames dropped for exceeding the buffer since creation.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Forget any partial frame and argument progress.
    pub fn reset(&mut self) {
        self.index = 0;
        self.last = 0;
        self.discarding = false;
        self.state = MessageState::Accumulating;
        self.cursor.rewind();
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_str(reader: &mut FrameReader, bytes: &[u8]) -> Vec<MessageState> {
        bytes.iter().map(|&b| reader.feed(b)).collect()
    }

    fn small_reader(capacity: usize) -> FrameReader {
        FrameReader::with_config(&FrameConfig {
            command_buffer_size: capacity,
            ..FrameConfig::default()
        })
    }

    #[test]
    fn test_completes_on_command_separator() {
        let mut reader = FrameReader::new();
        let states = feed_str(&mut reader, b"5,hello;");
        assert_eq!(states.last(), Some(&MessageState::FrameComplete));
        assert!(states[..states.len() - 1]
            .iter()
            .all(|s| *s == MessageState::Accumulating));
        assert_eq!(reader.frame(), b"5,hello");
    }

    #[test]
    fn test_complete_state_lasts_one_byte() {
        let mut reader = FrameReader::new();
        feed_str(&mut reader, b"1;");
        assert_eq!(reader.state(), MessageState::FrameComplete);
        assert_eq!(reader.feed(b'2'), MessageState::Accumulating);
        assert!(!reader.next());
    }

    #[test]
    fn test_empty_frames_are_absorbed() {
        let mut reader = FrameReader::new();
        let completed = reader.feed_all(b";;5,x;", |_| {});
        assert_eq!(completed, 1);
        assert_eq!(reader.frame(), b"5,x");
    }

    #[test]
    fn test_escaped_separator_does_not_complete() {
        let mut reader = FrameReader::new();
        let states = feed_str(&mut reader, b"1,a/;b;");
        let completions = states
            .iter()
            .filter(|s| **s == MessageState::FrameComplete)
            .count();
        assert_eq!(completions, 1);
        assert_eq!(reader.frame(), b"1,a/;b");
    }

    #[test]
    fn test_escaped_escape_before_separator_completes() {
        let mut reader = FrameReader::new();
        let completed = reader.feed_all(b"1,a//;", |_| {});
        assert_eq!(completed, 1);
        assert_eq!(reader.frame(), b"1,a//");
    }

    #[test]
    fn test_oversized_frame_is_dropped_entirely() {
        let mut reader = small_reader(8);
        let long = b"1,aaaaaaaaaaaaaaaaaaaa;";
        let completed = reader.feed_all(long, |_| {});
        assert_eq!(completed, 0);
        assert_eq!(reader.dropped_frames(), 1);

        let completed = reader.feed_all(b"2,ok;", |r| {
            assert_eq!(r.frame(), b"2,ok");
        });
        assert_eq!(completed, 1);
    }

    #[test]
    fn test_overflow_on_escape_keeps_following_separator_escaped() {
        // capacity 8: the escape lands on the overflowing byte.
        let mut reader = small_reader(8);
        let mut frames = Vec::new();
        let completed = reader.feed_all(b"1,abcd/;xyz;", |r| frames.push(r.frame().to_vec()));
        assert_eq!(completed, 0);
        assert!(frames.is_empty());
        assert_eq!(reader.dropped_frames(), 1);
        assert_eq!(reader.pending(), 0);

        assert_eq!(reader.feed_all(b"2;", |_| {}), 1);
        assert_eq!(reader.frame(), b"2");
    }

    #[test]
    fn test_frame_one_short_of_overflow_fits() {
        // capacity 8: up to 6 payload bytes plus the terminator.
        let mut reader = small_reader(8);
        assert_eq!(reader.feed_all(b"1,abcd;", |_| {}), 1);
        assert_eq!(reader.feed_all(b"1,abcde;", |_| {}), 0);
        assert_eq!(reader.dropped_frames(), 1);
    }

    #[test]
    fn test_next_walks_the_tokens() {
        let mut reader = FrameReader::new();
        reader.feed_all(b"5,hello;", |_| {});

        assert!(reader.next());
        assert_eq!(reader.read_i16(), 5);
        assert!(reader.next());
        assert_eq!(reader.read_bytes(), b"hello");
        assert!(!reader.next());
    }

    #[test]
    fn test_next_without_read_does_not_skip() {
        let mut reader = FrameReader::new();
        reader.feed_all(b"9,a,b;", |_| {});

        assert!(reader.next());
        assert!(reader.next());
        assert!(reader.available());
        assert_eq!(reader.read_i16(), 9);
        assert_eq!(reader.read_bytes(), b"a");
    }

    #[test]
    fn test_no_arguments_while_accumulating() {
        let mut reader = FrameReader::new();
        feed_str(&mut reader, b"3,x");
        assert!(!reader.next());
        assert_eq!(reader.read_i16(), 0);
        assert!(!reader.is_arg_ok());
    }

    #[test]
    fn test_custom_separators() {
        let mut reader = FrameReader::with_config(&FrameConfig {
            separators: Separators::new(b'|', b'\n', b'\\'),
            ..FrameConfig::default()
        });
        reader.feed_all(b"4|a\\|b|c\n", |_| {});
        assert_eq!(reader.read_i16(), 4);
        assert_eq!(reader.read_bytes(), b"a\\|b");
        assert_eq!(reader.read_bytes(), b"c");
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut reader = FrameReader::new();
        feed_str(&mut reader, b"12,partial");
        assert_eq!(reader.pending(), 10);
        reader.reset();
        assert_eq!(reader.pending(), 0);
        assert_eq!(reader.feed_all(b"3;", |_| {}), 1);
        assert_eq!(reader.frame(), b"3");
    }
}
