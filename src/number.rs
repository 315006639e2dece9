//! Number scanning (RFC 8259 grammar) and formatting.
//!
//! An inline fast path handles integers that can't overflow `i64` during
//! accumulation, falling back to `lexical_core` at the digit-count
//! boundary, and to `f64` beyond `i64`/`u64` range entirely (arbitrary
//! precision is out of scope here).

use crate::error::{ErrorKind, JsonError, Result};

/// Maximum digit count for which inline `u64` accumulation cannot overflow
/// (`u64::MAX` has 20 digits; 18 is a safe margin with no per-digit checks).
const MAX_INLINE_DIGITS: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedNumber {
    I64(i64),
    F64(f64),
}

/// Scan a JSON number literal starting at `bytes[start]`, validating the
/// full RFC 8259 grammar (no leading zeros except a lone `0`, no leading
/// `+`, non-empty digit runs either side of `.`, well-formed exponent).
/// Returns the parsed value and the exclusive end offset of the literal.
pub fn parse_number(bytes: &[u8], start: usize) -> Result<(ParsedNumber, usize)> {
    let mut pos = start;
    let len = bytes.len();

    let negative = if pos < len && bytes[pos] == b'-' {
        pos += 1;
        true
    } else {
        false
    };

    let int_start = pos;
    if pos >= len || !bytes[pos].is_ascii_digit() {
        return Err(err(start, "expected digit"));
    }
    if bytes[pos] == b'0' {
        pos += 1;
        if pos < len && bytes[pos].is_ascii_digit() {
            return Err(err(start, "leading zero"));
        }
    } else {
        let mut p = pos;
        crate::simd::skip_ascii_digits(bytes, &mut p);
        pos = p;
    }
    let int_digits = pos - int_start;

    let mut is_float = false;
    let frac_digits;
    if pos < len && bytes[pos] == b'.' {
        is_float = true;
        pos += 1;
        let frac_start = pos;
        if pos >= len || !bytes[pos].is_ascii_digit() {
            return Err(err(pos, "empty fraction"));
        }
        let mut p = pos;
        crate::simd::skip_ascii_digits(bytes, &mut p);
        pos = p;
        frac_digits = pos - frac_start;
    } else {
        frac_digits = 0;
    }

    if pos < len && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        is_float = true;
        pos += 1;
        if pos < len && (bytes[pos] == b'+' || bytes[pos] == b'-') {
            pos += 1;
        }
        let exp_start = pos;
        if pos >= len || !bytes[pos].is_ascii_digit() {
            return Err(err(pos, "malformed exponent"));
        }
        let mut p = pos;
        crate::simd::skip_ascii_digits(bytes, &mut p);
        pos = p;
        if pos == exp_start {
            return Err(err(pos, "malformed exponent"));
        }
    }

    let literal = &bytes[start..pos];

    if !is_float && int_digits <= MAX_INLINE_DIGITS {
        let mut value: u64 = 0;
        for &b in &bytes[int_start..int_start + int_digits] {
            value = value * 10 + (b - b'0') as u64;
        }
        let signed = if negative { -(value as i64) } else { value as i64 };
        return Ok((ParsedNumber::I64(signed), pos));
    }

    if !is_float {
        // 19-20 digit integers: may still fit in i64/u64. Per the reference
        // behavior (spec open question), these fall back to double rather
        // than doing exact-width parsing.
        if let Ok(s) = std::str::from_utf8(literal) {
            if let Ok(parsed) = lexical_core::parse::<i64>(s.as_bytes()) {
                return Ok((ParsedNumber::I64(parsed), pos));
            }
        }
        let f: f64 = std::str::from_utf8(literal)
            .ok()
            .and_then(|s| lexical_core::parse::<f64>(s.as_bytes()).ok())
            .unwrap_or(f64::NAN);
        return Ok((ParsedNumber::F64(f), pos));
    }

    let _ = frac_digits;
    let f = lexical_core::parse::<f64>(literal).map_err(|_| err(start, "malformed number"))?;
    Ok((ParsedNumber::F64(f), pos))
}

fn err(offset: usize, msg: &'static str) -> JsonError {
    JsonError::new(ErrorKind::BadNumber, offset, msg)
}

/// Format an integer using `itoa` (shortest exact decimal).
pub fn format_i64(value: i64, out: &mut Vec<u8>) {
    let mut buf = itoa::Buffer::new();
    out.extend_from_slice(buf.format(value).as_bytes());
}

/// Format a double using `ryu` (shortest round-trip decimal).
pub fn format_f64(value: f64, out: &mut Vec<u8>) {
    if value.is_nan() || value.is_infinite() {
        // Not representable in JSON; emit `null` rather than invalid JSON,
        // matching the common serde_json/simd-json convention.
        out.extend_from_slice(b"null");
        return;
    }
    let mut buf = ryu::Buffer::new();
    out.extend_from_slice(buf.format(value).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ParsedNumber {
        parse_number(s.as_bytes(), 0).unwrap().0
    }

    #[test]
    fn integers() {
        assert_eq!(parse("0"), ParsedNumber::I64(0));
        assert_eq!(parse("42"), ParsedNumber::I64(42));
        assert_eq!(parse("-17"), ParsedNumber::I64(-17));
    }

    #[test]
    fn floats() {
        assert_eq!(parse("3.14"), ParsedNumber::F64(3.14));
        assert_eq!(parse("1e10"), ParsedNumber::F64(1e10));
        assert_eq!(parse("-2.5e-3"), ParsedNumber::F64(-2.5e-3));
    }

    #[test]
    fn leading_zero_rejected() {
        assert!(parse_number(b"01", 0).is_err());
    }

    #[test]
    fn empty_fraction_rejected() {
        assert!(parse_number(b"1.", 0).is_err());
    }

    #[test]
    fn malformed_exponent_rejected() {
        assert!(parse_number(b"1e", 0).is_err());
        assert!(parse_number(b"1e+", 0).is_err());
    }

    #[test]
    fn boundary_i64_max() {
        let s = i64::MAX.to_string();
        assert_eq!(parse(&s), ParsedNumber::I64(i64::MAX));
    }

    #[test]
    fn overflow_falls_back_to_double() {
        // 30-digit integer: far beyond i64/u64 range.
        let s = "1".to_owned() + &"0".repeat(30);
        match parse(&s) {
            ParsedNumber::F64(_) => {}
            other => panic!("expected double fallback, got {other:?}"),
        }
    }

    #[test]
    fn format_roundtrip() {
        let mut out = Vec::new();
        format_i64(-42, &mut out);
        assert_eq!(out, b"-42");
        out.clear();
        format_f64(3.5, &mut out);
        assert_eq!(out, b"3.5");
    }
}
