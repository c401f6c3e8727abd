//! Escape handling shared by the receive and send paths.
//!
//! On the wire, a byte is literal data when the raw byte before it is an
//! unconsumed escape character. Two escape characters in a row are a
//! literal escape character, and that pair must not escape whatever comes
//! next, so detection carries one byte of history per scan.

use bytes::{BufMut, BytesMut};

use crate::config::Separators;

/// Report whether `current` is escaped and record it as the new history byte.
///
/// `last` is the scan's history cell and must start at `0` for every new
/// scan. When `current` is itself an escaped escape character the history
/// is cleared, so `//` followed by `;` leaves the `;` unescaped.
pub fn is_escaped(current: u8, escape: u8, last: &mut u8) -> bool {
    let escaped = *last == escape;
    *last = current;
    if escaped && current == escape {
        *last = 0;
    }
    escaped
}

/// Strip escape characters from `buf` in place.
///
/// Every escape character is dropped and the byte after it kept verbatim;
/// the tail left free by the compaction is zero-filled. Returns the
/// unescaped length. A lone escape character at the very end is dropped.
pub fn unescape(buf: &mut [u8], escape: u8) -> usize {
    let len = buf.len();
    let mut from = 0;
    let mut to = 0;
    while from < len {
        if buf[from] == escape {
            from += 1;
            if from == len {
                break;
            }
        }
        buf[to] = buf[from];
        to += 1;
        from += 1;
    }
    buf[to..].fill(0);
    to
}

/// Append one byte, escaped if it collides with the wire structure.
pub fn escape_byte(byte: u8, separators: &Separators, dst: &mut BytesMut) {
    if separators.is_special(byte) {
        dst.put_u8(separators.escape);
    }
    dst.put_u8(byte);
}

/// Append `bytes` with every special byte escaped.
pub fn escape_into(bytes: &[u8], separators: &Separators, dst: &mut BytesMut) {
    dst.reserve(bytes.len());
    for &byte in bytes {
        escape_byte(byte, separators, dst);
    }
}

/// Convenience wrapper returning an owned escaped copy of `bytes`.
pub fn escape(bytes: &[u8], separators: &Separators) -> Vec<u8> {
    let mut dst = BytesMut::with_capacity(bytes.len() + 4);
    escape_into(bytes, separators, &mut dst);
    dst.to_vec()
}
