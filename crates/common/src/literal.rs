//! Literal syntax shared by the loader (operand text) and the VM (READ input).
//!
//! Integers accept decimal, `0x`, `0o` and `0b` forms with `_` digit
//! separators. Floats accept decimal notation first and fall back to the
//! hexadecimal-float notation that WRITE produces.

/// Parse an integer literal. Returns `None` if the text is malformed or
/// does not fit in an `i64`.
pub fn parse_int(text: &str) -> Option<i64> {
    let s = text.trim();
    let (negative, body) = split_sign(s);

    let (radix, digits, prefixed) = match body.get(..2) {
        Some(p) if p.eq_ignore_ascii_case("0x") => (16, &body[2..], true),
        Some(p) if p.eq_ignore_ascii_case("0o") => (8, &body[2..], true),
        Some(p) if p.eq_ignore_ascii_case("0b") => (2, &body[2..], true),
        _ => (10, body, false),
    };

    // A prefixed literal may carry one separator right after the prefix.
    let digits = match digits.strip_prefix('_') {
        Some(rest) if prefixed => rest,
        _ => digits,
    };

    let mut magnitude: i128 = 0;
    let mut count = 0usize;
    let mut previous_underscore = true;
    let mut first_digit = None;
    let mut all_zero = true;

    for c in digits.chars() {
        if c == '_' {
            if previous_underscore {
                return None;
            }
            previous_underscore = true;
            continue;
        }
        let d = c.to_digit(radix)?;
        first_digit.get_or_insert(d);
        all_zero &= d == 0;
        magnitude = magnitude
            .checked_mul(radix as i128)?
            .checked_add(d as i128)?;
        count += 1;
        previous_underscore = false;
    }

    if count == 0 || previous_underscore {
        return None;
    }

    // Decimal literals like `007` are rejected; `000` is fine.
    if radix == 10 && count > 1 && first_digit == Some(0) && !all_zero {
        return None;
    }

    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// Parse a float literal in decimal or hexadecimal-float notation.
pub fn parse_float(text: &str) -> Option<f64> {
    let s = text.trim();
    parse_decimal_float(s).or_else(|| parse_hex_float(s))
}

fn parse_decimal_float(s: &str) -> Option<f64> {
    if s.contains('_') {
        let bytes = s.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'_' {
                let before = i.checked_sub(1).map(|j| bytes[j]);
                let after = bytes.get(i + 1).copied();
                if !matches!(before, Some(c) if c.is_ascii_digit())
                    || !matches!(after, Some(c) if c.is_ascii_digit())
                {
                    return None;
                }
            }
        }
        return s.replace('_', "").parse().ok();
    }
    s.parse().ok()
}

/// Parse `[sign][0x]h*[.h*][p[sign]d+]`, plus `inf`, `infinity` and `nan`.
pub fn parse_hex_float(text: &str) -> Option<f64> {
    let s = text.trim();
    let (negative, body) = split_sign(s);
    let signed = |x: f64| if negative { -x } else { x };

    if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
        return Some(signed(f64::INFINITY));
    }
    if body.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }

    let body = match body.get(..2) {
        Some(p) if p.eq_ignore_ascii_case("0x") => &body[2..],
        _ => body,
    };

    let (mantissa_text, exponent_text) = match body.find(['p', 'P']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    let (int_text, frac_text) = match mantissa_text.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (mantissa_text, ""),
    };
    if int_text.is_empty() && frac_text.is_empty() {
        return None;
    }

    // Keep at most 60 significant bits; anything beyond folds into a sticky bit.
    let mut mantissa: u64 = 0;
    let mut exponent: i64 = 0;
    let mut sticky = false;

    for c in int_text.chars() {
        let d = c.to_digit(16)? as u64;
        if mantissa >> 56 == 0 {
            mantissa = mantissa * 16 + d;
        } else {
            exponent += 4;
            sticky |= d != 0;
        }
    }
    for c in frac_text.chars() {
        let d = c.to_digit(16)? as u64;
        if mantissa >> 56 == 0 {
            mantissa = mantissa * 16 + d;
            exponent -= 4;
        } else {
            sticky |= d != 0;
        }
    }
    if sticky {
        mantissa |= 1;
    }

    if let Some(exp) = exponent_text {
        let (exp_negative, exp_digits) = split_sign(exp);
        if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Anything past this magnitude already saturates to zero or infinity.
        let magnitude = exp_digits
            .parse::<i64>()
            .unwrap_or(i64::MAX)
            .min(100_000);
        exponent += if exp_negative { -magnitude } else { magnitude };
    }

    Some(signed(scale_by_power_of_two(mantissa as f64, exponent)))
}

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

fn scale_by_power_of_two(mut x: f64, mut exp: i64) -> f64 {
    let power = |e: i64| f64::from_bits(((e + 1023) as u64) << 52);
    while exp > 1000 {
        x *= power(1000);
        exp -= 1000;
        if x.is_infinite() {
            return x;
        }
    }
    while exp < -1000 {
        x *= power(-1000);
        exp += 1000;
        if x == 0.0 {
            return x;
        }
    }
    x * power(exp)
}

/// Format a float in the fixed hexadecimal notation used by WRITE.
///
/// Normal numbers render as `0x1.<13 hex digits>p<exp>`, subnormals as
/// `0x0.<13 hex digits>p-1022`, and zero as `0x0.0p+0`.
pub fn format_hex_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    let sign = if x.is_sign_negative() { "-" } else { "" };
    if x.is_infinite() {
        return format!("{sign}inf");
    }
    if x == 0.0 {
        return format!("{sign}0x0.0p+0");
    }

    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);

    if biased == 0 {
        format!("{sign}0x0.{fraction:013x}p-1022")
    } else {
        format!("{sign}0x1.{fraction:013x}p{:+}", biased - 1023)
    }
}

/// Decode `\DDD` escapes (exactly three decimal digits) into the code
/// point `DDD`. A backslash not followed by three digits stays as is.
pub fn decode_escapes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\\' && i + 3 < chars.len() {
            let digits = &chars[i + 1..i + 4];
            if digits.iter().all(char::is_ascii_digit) {
                let code = digits
                    .iter()
                    .fold(0u32, |acc, c| acc * 10 + (*c as u32 - '0' as u32));
                if let Some(decoded) = char::from_u32(code) {
                    out.push(decoded);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_decimal() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-13"), Some(-13));
        assert_eq!(parse_int("+7"), Some(7));
        assert_eq!(parse_int("  5 "), Some(5));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("000"), Some(0));
    }

    #[test]
    fn int_prefixed() {
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("0X1f"), Some(31));
        assert_eq!(parse_int("-0x10"), Some(-16));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("0x_ff"), Some(255));
    }

    #[test]
    fn int_separators() {
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("1__000"), None);
        assert_eq!(parse_int("_1"), None);
        assert_eq!(parse_int("1_"), None);
    }

    #[test]
    fn int_rejects_malformed() {
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("007"), None);
        assert_eq!(parse_int("12a"), None);
        assert_eq!(parse_int("0b102"), None);
        assert_eq!(parse_int("1.5"), None);
        assert_eq!(parse_int("١"), None);
    }

    #[test]
    fn int_range() {
        assert_eq!(parse_int("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_int("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_int("9223372036854775808"), None);
    }

    #[test]
    fn float_decimal() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float("-2"), Some(-2.0));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1_000.5"), Some(1000.5));
        assert_eq!(parse_float("inf"), Some(f64::INFINITY));
        assert!(parse_float("nan").unwrap().is_nan());
    }

    #[test]
    fn float_hex() {
        assert_eq!(parse_float("0x1.8p+1"), Some(3.0));
        assert_eq!(parse_float("0x1p-1"), Some(0.5));
        assert_eq!(parse_float("-0x1.0000000000000p+0"), Some(-1.0));
        assert_eq!(parse_float("0x.8"), Some(0.5));
        assert_eq!(parse_float("1.8p1"), Some(3.0));
        // Bare hex digits are a valid hexadecimal float.
        assert_eq!(parse_float("abc"), Some(2748.0));
        assert_eq!(parse_float("0x0.0p+0"), Some(0.0));
    }

    #[test]
    fn float_rejects_malformed() {
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("xyz"), None);
        assert_eq!(parse_float("0x"), None);
        assert_eq!(parse_float("0x1p"), None);
        assert_eq!(parse_float("1__0.0"), None);
        assert_eq!(parse_float("0x1.g"), None);
    }

    #[test]
    fn hex_float_extremes() {
        assert_eq!(parse_hex_float("0x1.fffffffffffffp+1023"), Some(f64::MAX));
        assert_eq!(
            parse_hex_float("0x0.0000000000001p-1022"),
            Some(f64::from_bits(1))
        );
        assert_eq!(parse_hex_float("0x1p99999"), Some(f64::INFINITY));
        assert_eq!(parse_hex_float("0x1p-99999"), Some(0.0));
    }

    #[test]
    fn format_normal() {
        assert_eq!(format_hex_float(1.0), "0x1.0000000000000p+0");
        assert_eq!(format_hex_float(0.5), "0x1.0000000000000p-1");
        assert_eq!(format_hex_float(-3.0), "-0x1.8000000000000p+1");
        assert_eq!(format_hex_float(0.1), "0x1.999999999999ap-4");
        assert_eq!(format_hex_float(1024.0), "0x1.0000000000000p+10");
    }

    #[test]
    fn format_special() {
        assert_eq!(format_hex_float(0.0), "0x0.0p+0");
        assert_eq!(format_hex_float(-0.0), "-0x0.0p+0");
        assert_eq!(format_hex_float(f64::INFINITY), "inf");
        assert_eq!(format_hex_float(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_hex_float(f64::NAN), "nan");
        assert_eq!(
            format_hex_float(f64::from_bits(1)),
            "0x0.0000000000001p-1022"
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(decode_escapes("a\\032b"), "a b");
        assert_eq!(decode_escapes("\\092"), "\\");
        assert_eq!(decode_escapes("\\010\\035"), "\n#");
        assert_eq!(decode_escapes("x\\12"), "x\\12");
        assert_eq!(decode_escapes("\\\\065"), "\\A");
        assert_eq!(decode_escapes("ž\\120"), "žx");
        assert_eq!(decode_escapes(""), "");
    }
}
