//! Typed reads of the current frame's arguments.
//!
//! Every read advances to the next argument, sets the arg-ok flag to
//! whether one existed, and returns a zero value when none did. Borrowed
//! results point into the receive buffer and live until the next byte is
//! fed to the reader.

use std::borrow::Cow;
use std::ops::Range;

use crate::binary::BinaryArg;
use crate::escape::unescape;
use crate::parse::{is_strict_integer, parse_f64, parse_i16, parse_i32};
use crate::reader::FrameReader;

impl FrameReader {
    /// Claim the current argument for a typed read.
    fn take_token(&mut self) -> Option<Range<usize>> {
        if self.next() {
            self.cursor.consumed = true;
            self.arg_ok = true;
            self.cursor.current.clone()
        } else {
            self.arg_ok = false;
            None
        }
    }

    fn token_bytes(&self, range: Range<usize>) -> &[u8] {
        &self.frame_buf()[range]
    }

    pub fn read_i16(&mut self) -> i16 {
        self.take_token()
            .map_or(0, |range| parse_i16(self.token_bytes(range)))
    }

    pub fn read_i32(&mut self) -> i32 {
        self.take_token()
            .map_or(0, |range| parse_i32(self.token_bytes(range)))
    }

    /// Integer read that also requires the whole token to be numeric.
    ///
    /// Unlike [`read_i16`](Self::read_i16), a token such as `"abc"` clears
    /// the arg-ok flag. The argument is consumed either way.
    pub fn read_i16_strict(&mut self) -> i16 {
        let Some(range) = self.take_token() else {
            return 0;
        };
        let token = self.token_bytes(range);
        if is_strict_integer(token) {
            parse_i16(token)
        } else {
            self.arg_ok = false;
            0
        }
    }

    /// Non-zero integers are `true`.
    pub fn read_bool(&mut self) -> bool {
        self.read_i16() != 0
    }

    /// First byte of the argument.
    pub fn read_char(&mut self) -> u8 {
        self.take_token()
            .and_then(|range| self.token_bytes(range).first().copied())
            .unwrap_or(0)
    }

    pub fn read_f32(&mut self) -> f32 {
        self.read_f64() as f32
    }

    pub fn read_f64(&mut self) -> f64 {
        self.take_token()
            .map_or(0.0, |range| parse_f64(self.token_bytes(range)))
    }

    /// The argument as it arrived, escape characters included.
    pub fn read_bytes(&mut self) -> &[u8] {
        match self.take_token() {
            Some(range) => self.token_bytes(range),
            None => &[],
        }
    }

    /// Lossy UTF-8 view of [`read_bytes`](Self::read_bytes).
    pub fn read_str(&mut self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.read_bytes())
    }

    /// The argument with escaping stripped, unescaped in place.
    pub fn read_unescaped(&mut self) -> &[u8] {
        let Some(range) = self.take_token() else {
            return &[];
        };
        let escape = self.separators().escape;
        let start = range.start;
        let len = unescape(&mut self.frame_buf_mut()[range], escape);
        &self.frame_buf()[start..start + len]
    }

    /// Copy the argument into `dst`, always null-terminating.
    ///
    /// At most `dst.len() - 1` bytes are copied; the return value is the
    /// number of bytes copied before the terminator.
    pub fn copy_str(&mut self, dst: &mut [u8]) -> usize {
        let Some(range) = self.take_token() else {
            if let Some(first) = dst.first_mut() {
                *first = 0;
            }
            return 0;
        };
        if dst.is_empty() {
            return 0;
        }
        let token = &self.frame_buf()[range];
        let n = token.len().min(dst.len() - 1);
        dst[..n].copy_from_slice(&token[..n]);
        dst[n] = 0;
        n
    }

    /// Consume the argument only if it equals `expected` exactly.
    ///
    /// On a mismatch the argument stays current for another read and the
    /// arg-ok flag is cleared.
    pub fn compare_str(&mut self, expected: &str) -> bool {
        if !self.next() {
            self.arg_ok = false;
            return false;
        }
        let matches = self
            .cursor
            .current
            .clone()
            .is_some_and(|range| self.token_bytes(range) == expected.as_bytes());
        if matches {
            self.cursor.consumed = true;
        }
        self.arg_ok = matches;
        matches
    }

    /// Decode a binary argument of type `B`.
    ///
    /// The token is unescaped in place and its bytes reinterpreted as `B`'s
    /// little-endian image. A missing argument yields the all-zero value.
    pub fn read_bin<B: BinaryArg>(&mut self) -> B {
        let Some(range) = self.take_token() else {
            return B::zeroed();
        };
        let escape = self.separators().escape;
        let start = range.start;
        let len = unescape(&mut self.frame_buf_mut()[range], escape);
        B::from_wire_padded(&self.frame_buf()[start..start + len])
    }
}
