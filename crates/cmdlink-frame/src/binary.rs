//! Fixed-width binary arguments.
//!
//! A binary argument is the value's little-endian byte image sent raw, with
//! each byte individually escaped. On receipt the token is unescaped in place
//! and reinterpreted; a short token is padded with zeros.

use bytes::{Buf, BufMut, BytesMut};

/// Widest supported value, in bytes.
pub const MAX_WIDTH: usize = 8;

/// A value with a fixed-width wire image.
pub trait BinaryArg: Sized {
    /// Number of bytes in the wire image.
    const WIDTH: usize;

    /// Append the raw (unescaped) wire image.
    fn put_wire(&self, dst: &mut BytesMut);

    /// Decode from exactly [`WIDTH`](Self::WIDTH) bytes.
    fn from_wire(src: &[u8]) -> Self;

    /// The all-zero value returned when no argument is present.
    fn zeroed() -> Self {
        Self::from_wire(&[0u8; MAX_WIDTH][..Self::WIDTH])
    }

    /// Decode from whatever the token held, zero-padding short input.
    fn from_wire_padded(src: &[u8]) -> Self {
        let mut padded = [0u8; MAX_WIDTH];
        let n = src.len().min(Self::WIDTH);
        padded[..n].copy_from_slice(&src[..n]);
        Self::from_wire(&padded[..Self::WIDTH])
    }
}

macro_rules! impl_binary_arg {
    ($($ty:ty => $width:expr, $put:ident, $get:ident;)*) => {
        $(
            impl BinaryArg for $ty {
                const WIDTH: usize = $width;

                fn put_wire(&self, dst: &mut BytesMut) {
                    dst.$put(*self);
                }

                fn from_wire(mut src: &[u8]) -> Self {
                    src.$get()
                }
            }
        )*
    };
}

impl_binary_arg! {
    u8 => 1, put_u8, get_u8;
    i8 => 1, put_i8, get_i8;
    u16 => 2, put_u16_le, get_u16_le;
    i16 => 2, put_i16_le, get_i16_le;
    u32 => 4, put_u32_le, get_u32_le;
    i32 => 4, put_i32_le, get_i32_le;
    u64 => 8, put_u64_le, get_u64_le;
    i64 => 8, put_i64_le, get_i64_le;
    f32 => 4, put_f32_le, get_f32_le;
    f64 => 8, put_f64_le, get_f64_le;
}

impl BinaryArg for bool {
    const WIDTH: usize = 1;

    fn put_wire(&self, dst: &mut BytesMut) {
        dst.put_u8(u8::from(*self));
    }

    fn from_wire(src: &[u8]) -> Self {
        src.first().is_some_and(|&byte| byte != 0)
    }
}
