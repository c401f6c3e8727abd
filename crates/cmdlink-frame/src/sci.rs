//! Scientific notation without a float formatter.
//!
//! Small targets often ship without `printf("%e")`, and plain decimal
//! output overflows once a value exceeds the integer range. This writer
//! produces `[-]D.DDDE±X` using only integer formatting.

use std::fmt::Write as _;

use bytes::{BufMut, BytesMut};

/// Largest supported number of fractional digits.
pub const MAX_SCI_DIGITS: u32 = 6;

/// Append `value` in scientific notation with `digits` fractional digits.
///
/// Infinities are written as `INF` (with a leading `-` when negative) and
/// NaN as `NaN`. `digits` is clamped to [`MAX_SCI_DIGITS`]. Values below 10
/// use exponent 0 and are renormalized at most once, so tiny magnitudes
/// come out with a leading `0.` rather than fully normalized.
pub fn write_sci(value: f64, digits: u32, dst: &mut BytesMut) {
    let mut f = value;
    if f < 0.0 {
        dst.put_u8(b'-');
        f = -f;
    }
    if f.is_infinite() {
        dst.put_slice(b"INF");
        return;
    }
    if f.is_nan() {
        dst.put_slice(b"NaN");
        return;
    }

    let digits = digits.min(MAX_SCI_DIGITS);
    let multiplier = 10i64.pow(digits);

    let mut exponent: i32 = if f < 10.0 {
        0
    } else {
        f.log10().floor() as i32
    };
    let mut mantissa = f / 10f64.powi(exponent);
    if mantissa < 1.0 && mantissa != 0.0 {
        mantissa *= 10.0;
        exponent -= 1;
    }

    let mut whole = mantissa as i64;
    let mut part = ((mantissa - whole as f64) * multiplier as f64 + 0.5) as i64;
    if part >= multiplier {
        whole += 1;
        part = 0;
    }

    let _ = write!(
        dst,
        "{whole}.{part:0width$}E{exponent:+}",
        width = digits as usize
    );
}

/// Owned-string form of [`write_sci`].
pub fn format_sci(value: f64, digits: u32) -> String {
    let mut dst = BytesMut::with_capacity(16);
    write_sci(value, digits, &mut dst);
    String::from_utf8_lossy(&dst).into_owned()
}
