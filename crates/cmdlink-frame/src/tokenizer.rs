//! Escape-aware argument splitting over a completed frame.
//!
//! Works like `strtok_r` with one difference: a field separator preceded by
//! an unconsumed escape character does not split. Tokens are terminated in
//! place by overwriting their separator with a null byte.

use std::ops::Range;

use crate::config::Separators;
use crate::escape::is_escaped;

/// Progress through one frame's arguments.
#[derive(Debug, Clone, Default)]
pub(crate) struct ArgCursor {
    /// Token handed out by the last successful `next`.
    pub current: Option<Range<usize>>,
    /// First byte not yet scanned.
    pub next: usize,
    /// Whether a typed read has taken `current`.
    pub consumed: bool,
}

impl ArgCursor {
    pub fn rewind(&mut self) {
        self.current = None;
        self.next = 0;
        self.consumed = true;
    }
}

/// Distance from `start` to the next unescaped field separator or
/// unescaped null byte. The end of `frame` counts as a null byte.
fn find_next(frame: &[u8], start: usize, separators: &Separators) -> usize {
    let mut last = 0u8;
    let mut pos = start;
    while pos < frame.len() {
        let byte = frame[pos];
        let escaped = is_escaped(byte, separators.escape, &mut last);
        if !escaped && (byte == 0 || byte == separators.field) {
            break;
        }
        pos += 1;
    }
    pos - start
}

/// Locate the next non-empty token at or after `from`.
///
/// Leading separators are skipped, so empty arguments never surface. On
/// success the separator ending the token is overwritten with `0` and the
/// returned position points just past it.
pub(crate) fn split_next(
    frame: &mut [u8],
    from: usize,
    separators: &Separators,
) -> Option<(Range<usize>, usize)> {
    let len = frame.len();
    let mut start = from;
    while start < len && frame[start] != 0 && find_next(frame, start, separators) == 0 {
        start += 1;
    }
    if start >= len || frame[start] == 0 {
        return None;
    }

    let end = start + find_next(frame, start, separators);
    let next = if end < len && frame[end] != 0 {
        frame[end] = 0;
        end + 1
    } else {
        end
    };
    Some((start..end, next))
}
