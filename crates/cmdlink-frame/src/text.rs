//! Text arguments: how a value looks when sent as plain ASCII.

use std::fmt::Write as _;

use bytes::{BufMut, BytesMut};

/// A value that can be appended to a frame as text.
///
/// Text is written raw, without escaping; use the writer's escaped append
/// for payloads that may contain separators.
pub trait TextArg {
    fn write_text(&self, dst: &mut BytesMut);
}

macro_rules! impl_text_display {
    ($($ty:ty),*) => {
        $(
            impl TextArg for $ty {
                fn write_text(&self, dst: &mut BytesMut) {
                    // Writing into a BytesMut cannot fail.
                    let _ = write!(dst, "{self}");
                }
            }
        )*
    };
}

impl_text_display!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, f32, f64);

/// Booleans go out as `1` / `0` so integer reads on the peer understand them.
impl TextArg for bool {
    fn write_text(&self, dst: &mut BytesMut) {
        dst.put_u8(if *self { b'1' } else { b'0' });
    }
}

impl TextArg for char {
    fn write_text(&self, dst: &mut BytesMut) {
        let mut utf8 = [0u8; 4];
        dst.put_slice(self.encode_utf8(&mut utf8).as_bytes());
    }
}

impl TextArg for str {
    fn write_text(&self, dst: &mut BytesMut) {
        dst.put_slice(self.as_bytes());
    }
}

impl TextArg for String {
    fn write_text(&self, dst: &mut BytesMut) {
        dst.put_slice(self.as_bytes());
    }
}

impl TextArg for [u8] {
    fn write_text(&self, dst: &mut BytesMut) {
        dst.put_slice(self);
    }
}

impl<T: TextArg + ?Sized> TextArg for &T {
    fn write_text(&self, dst: &mut BytesMut) {
        (**self).write_text(dst);
    }
}
