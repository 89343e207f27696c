//! Text to integer conversion for control writes.

/// Best-effort signed integer parse.
///
/// Accepts an optional leading `-`, then an optional `0x`/`0X` prefix
/// selecting base 16, otherwise base 10. Digits are consumed until the first
/// character that isn't a digit of the selected base, and the rest of the
/// input is ignored.
///
/// This never fails, an empty digit run gives `0`, so callers must check
/// the shape of their input first. The result is a 32-bit `int` and wraps on
/// overflow, so `"4294967298"` parses as `2`.
///
/// # Example
///
/// ```rust
/// # use uapdbg::number::parse_number;
/// assert_eq!(parse_number("-0x10"), -16);
/// assert_eq!(parse_number("12abc"), 12);
/// assert_eq!(parse_number("0x"), 0);
/// ```
pub fn parse_number<S: AsRef<[u8]>>(s: S) -> i32 {
    let mut s = s.as_ref();
    let mut sign = 1;
    if let [b'-', rest @ ..] = s {
        sign = -1;
        s = rest;
    }
    let base = match s {
        [b'0', b'x' | b'X', rest @ ..] => {
            s = rest;
            16
        }
        _ => 10,
    };

    let mut r: i32 = 0;
    for &c in s {
        let digit = match char::from(c).to_digit(base) {
            Some(d) => d,
            None => break,
        };
        r = r.wrapping_mul(base as i32).wrapping_add(digit as i32);
    }
    r.wrapping_mul(sign)
}

/// Strict unsigned parse with the kernel's base 0 rules.
///
/// `0x` selects hex, a leading `0` octal, anything else decimal. One trailing
/// newline is allowed. Returns [`None`] for anything else, including
/// overflow.
pub fn parse_unsigned(s: &str) -> Option<u64> {
    let s = s.strip_suffix('\n').unwrap_or(s);
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));
    let (digits, radix) = if let Some(hex) = hex {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    // from_str_radix allows a sign
    if digits.is_empty() || digits.starts_with('+') || digits.starts_with('-') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal() {
        assert_eq!(parse_number("10"), 10);
        assert_eq!(parse_number("-10"), -10);
        assert_eq!(parse_number("2"), 2);
    }

    #[test]
    fn hex() {
        assert_eq!(parse_number("0x1F"), 31);
        assert_eq!(parse_number("0X1f"), 31);
        assert_eq!(parse_number("-0x10"), -16);
        assert_eq!(parse_number("0xffg"), 255);
    }

    #[test]
    fn no_digits() {
        assert_eq!(parse_number("abc"), 0);
        assert_eq!(parse_number(""), 0);
        assert_eq!(parse_number("-"), 0);
        assert_eq!(parse_number("0x"), 0);
        assert_eq!(parse_number("-0x"), 0);
    }

    #[test]
    fn trailing_garbage() {
        assert_eq!(parse_number("42\n"), 42);
        assert_eq!(parse_number("7 8"), 7);
        // Hex letters are not decimal digits
        assert_eq!(parse_number("1a"), 1);
    }

    #[test]
    fn overflow_wraps() {
        assert_eq!(parse_number("4294967298"), 2);
        assert_eq!(parse_number("4294967295"), -1);
        assert_eq!(parse_number("2147483648"), i32::MIN);
        assert_eq!(parse_number("-0xffffffff"), 1);
    }

    #[test]
    fn unsigned() {
        assert_eq!(parse_unsigned("0x1f\n"), Some(31));
        assert_eq!(parse_unsigned("017"), Some(15));
        assert_eq!(parse_unsigned("0"), Some(0));
        assert_eq!(parse_unsigned("255"), Some(255));
        assert_eq!(parse_unsigned(""), None);
        assert_eq!(parse_unsigned("0x"), None);
        assert_eq!(parse_unsigned("-1"), None);
        assert_eq!(parse_unsigned("12z"), None);
        assert_eq!(parse_unsigned("09"), None);
    }
}
