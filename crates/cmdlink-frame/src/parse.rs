//! Lenient numeric parsing in the manner of C `atol` / `strtod`.
//!
//! Tokens are parsed on the longest valid prefix and anything after it is
//! ignored; a token with no digits at all parses as zero. Decimal points
//! are always `.`, independent of locale.

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn skip_space(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !is_space(b))
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// 32-bit integer, saturating on overflow like `strtol`.
pub(crate) fn parse_i32(bytes: &[u8]) -> i32 {
    let bytes = skip_space(bytes);
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    let mut value: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// 16-bit integer: the 32-bit result narrowed, as `int16_t x = atoi(s)` does.
pub(crate) fn parse_i16(bytes: &[u8]) -> i16 {
    parse_i32(bytes) as i16
}

/// True when the whole token is an optionally signed run of decimal digits.
pub(crate) fn is_strict_integer(bytes: &[u8]) -> bool {
    let digits = match bytes.first() {
        Some(b'-') | Some(b'+') => &bytes[1..],
        _ => bytes,
    };
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Floating point on the longest valid prefix, like `strtod`.
pub(crate) fn parse_f64(bytes: &[u8]) -> f64 {
    let bytes = skip_space(bytes);
    let end = float_prefix_len(bytes);
    std::str::from_utf8(&bytes[..end])
        .ok()
        .and_then(|text| text.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn float_prefix_len(bytes: &[u8]) -> usize {
    let mut pos = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        pos = 1;
    }

    for word in ["infinity", "inf", "nan"] {
        let rest = &bytes[pos..];
        if rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word.as_bytes()) {
            return pos + word.len();
        }
    }

    let count_digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let int_digits = count_digits(pos);
    pos += int_digits;
    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        frac_digits = count_digits(pos + 1);
        if int_digits > 0 || frac_digits > 0 {
            pos += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'-') | Some(b'+')) {
            exp += 1;
        }
        let exp_digits = count_digits(exp);
        if exp_digits > 0 {
            pos = exp + exp_digits;
        }
    }
    pos
}
