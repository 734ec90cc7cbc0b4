//! Value-level semantics shared by the three-address and stack opcodes.
//!
//! Every function takes the failing instruction index `at` so errors point
//! at the right place. Operands are never coerced between types.

use ippcode_common::Value;

use crate::error::RuntimeError;

/// Integer/float arithmetic that needs no zero check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arith {
    Add,
    Sub,
    Mul,
}

pub fn arithmetic(op: Arith, a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(match op {
            Arith::Add => x.wrapping_add(y),
            Arith::Sub => x.wrapping_sub(y),
            Arith::Mul => x.wrapping_mul(y),
        })),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(match op {
            Arith::Add => x + y,
            Arith::Sub => x - y,
            Arith::Mul => x * y,
        })),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// Integer division rounding toward negative infinity.
pub fn int_divide(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero { at }),
        (Value::Int(x), Value::Int(y)) => {
            let q = x.wrapping_div(y);
            let floored = if x.wrapping_rem(y) != 0 && ((x < 0) != (y < 0)) {
                q - 1
            } else {
                q
            };
            Ok(Value::Int(floored))
        }
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

pub fn float_divide(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Float(_), Value::Float(y)) if y == 0.0 => Err(RuntimeError::DivisionByZero { at }),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x / y)),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// Equality: nil equals only nil, otherwise both sides must share a type.
pub fn equals(a: &Value, b: &Value, at: usize) -> Result<bool, RuntimeError> {
    match (a, b) {
        (Value::Nil, other) | (other, Value::Nil) => Ok(matches!(other, Value::Nil)),
        _ if a.same_type(b) => Ok(a == b),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// `a < b` for two values of the same non-nil type.
pub fn less(a: &Value, b: &Value, at: usize) -> Result<bool, RuntimeError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x < y),
        (Value::Float(x), Value::Float(y)) => Ok(x < y),
        (Value::Bool(x), Value::Bool(y)) => Ok(x < y),
        (Value::Str(x), Value::Str(y)) => Ok(x < y),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// `a > b` for two values of the same non-nil type.
pub fn greater(a: &Value, b: &Value, at: usize) -> Result<bool, RuntimeError> {
    less(b, a, at)
}

pub fn logic_and(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(x && y)),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

pub fn logic_or(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(x || y)),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

pub fn logic_not(a: Value, at: usize) -> Result<Value, RuntimeError> {
    match a {
        Value::Bool(x) => Ok(Value::Bool(!x)),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// INT2CHAR: code point to a one-character string.
pub fn int_to_char(a: Value, at: usize) -> Result<Value, RuntimeError> {
    let Value::Int(code) = a else {
        return Err(RuntimeError::TypeMismatch { at });
    };
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::Str(c.to_string()))
        .ok_or(RuntimeError::InvalidCodePoint { at, code })
}

/// Character at `index` of `s`, counted in code points.
fn char_at(s: &str, index: i64, at: usize) -> Result<char, RuntimeError> {
    let out_of_range = || RuntimeError::StringIndexOutOfRange {
        at,
        index,
        length: s.chars().count(),
    };
    let position = usize::try_from(index).map_err(|_| out_of_range())?;
    s.chars().nth(position).ok_or_else(out_of_range)
}

/// STRI2INT: code point of the character at an index.
pub fn string_to_int(s: Value, index: Value, at: usize) -> Result<Value, RuntimeError> {
    match (s, index) {
        (Value::Str(s), Value::Int(i)) => Ok(Value::Int(char_at(&s, i, at)? as i64)),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

pub fn int_to_float(a: Value, at: usize) -> Result<Value, RuntimeError> {
    match a {
        Value::Int(n) => Ok(Value::Float(n as f64)),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// FLOAT2INT: truncate toward zero. NaN, infinities and floats beyond the
/// `i64` range have no integer value.
pub fn float_to_int(a: Value, at: usize) -> Result<Value, RuntimeError> {
    let Value::Float(x) = a else {
        return Err(RuntimeError::TypeMismatch { at });
    };
    let t = x.trunc();
    // 2^63 is exact in f64; the i64 range is [-2^63, 2^63).
    let limit = 9_223_372_036_854_775_808.0_f64;
    if t.is_finite() && t >= -limit && t < limit {
        Ok(Value::Int(t as i64))
    } else {
        Err(RuntimeError::FloatOutOfRange {
            at,
            value: Value::Float(x).to_string(),
        })
    }
}

pub fn concat(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Str(mut x), Value::Str(y)) => {
            x.push_str(&y);
            Ok(Value::Str(x))
        }
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// STRLEN: length in code points.
pub fn string_length(a: Value, at: usize) -> Result<Value, RuntimeError> {
    match a {
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

pub fn get_char(s: Value, index: Value, at: usize) -> Result<Value, RuntimeError> {
    match (s, index) {
        (Value::Str(s), Value::Int(i)) => Ok(Value::Str(char_at(&s, i, at)?.to_string())),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// SETCHAR: replace the character at `index` with the first character of
/// `replacement`.
pub fn set_char(
    target: Value,
    index: Value,
    replacement: Value,
    at: usize,
) -> Result<Value, RuntimeError> {
    let (Value::Str(target), Value::Int(i), Value::Str(replacement)) = (target, index, replacement)
    else {
        return Err(RuntimeError::TypeMismatch { at });
    };
    char_at(&target, i, at)?;
    let Some(new_char) = replacement.chars().next() else {
        return Err(RuntimeError::EmptyReplacement { at });
    };
    // char_at succeeded, so `i` is a valid non-negative position.
    let position = i as usize;
    let result = target
        .chars()
        .enumerate()
        .map(|(n, c)| if n == position { new_char } else { c })
        .collect();
    Ok(Value::Str(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.into())
    }

    #[test]
    fn arithmetic_requires_matching_numbers() {
        assert_eq!(arithmetic(Arith::Add, Value::Int(5), Value::Int(3), 0), Ok(Value::Int(8)));
        assert_eq!(
            arithmetic(Arith::Mul, Value::Float(1.5), Value::Float(2.0), 0),
            Ok(Value::Float(3.0))
        );
        assert_eq!(
            arithmetic(Arith::Sub, Value::Int(1), Value::Float(1.0), 4),
            Err(RuntimeError::TypeMismatch { at: 4 })
        );
        assert_eq!(
            arithmetic(Arith::Add, s("a"), s("b"), 0),
            Err(RuntimeError::TypeMismatch { at: 0 })
        );
    }

    #[test]
    fn int_arithmetic_wraps() {
        assert_eq!(
            arithmetic(Arith::Add, Value::Int(i64::MAX), Value::Int(1), 0),
            Ok(Value::Int(i64::MIN))
        );
    }

    #[test]
    fn idiv_floors() {
        assert_eq!(int_divide(Value::Int(7), Value::Int(2), 0), Ok(Value::Int(3)));
        assert_eq!(int_divide(Value::Int(-7), Value::Int(2), 0), Ok(Value::Int(-4)));
        assert_eq!(int_divide(Value::Int(7), Value::Int(-2), 0), Ok(Value::Int(-4)));
        assert_eq!(int_divide(Value::Int(-8), Value::Int(2), 0), Ok(Value::Int(-4)));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            int_divide(Value::Int(1), Value::Int(0), 2),
            Err(RuntimeError::DivisionByZero { at: 2 })
        );
        assert_eq!(
            float_divide(Value::Float(1.0), Value::Float(-0.0), 2),
            Err(RuntimeError::DivisionByZero { at: 2 })
        );
        assert_eq!(
            int_divide(Value::Float(1.0), Value::Float(0.0), 2),
            Err(RuntimeError::TypeMismatch { at: 2 })
        );
    }

    #[test]
    fn nil_equality() {
        assert_eq!(equals(&Value::Nil, &Value::Nil, 0), Ok(true));
        assert_eq!(equals(&Value::Nil, &Value::Int(0), 0), Ok(false));
        assert_eq!(equals(&s(""), &Value::Nil, 0), Ok(false));
        assert_eq!(equals(&Value::Int(1), &s("1"), 0), Err(RuntimeError::TypeMismatch { at: 0 }));
        assert_eq!(equals(&s("ab"), &s("ab"), 0), Ok(true));
    }

    #[test]
    fn ordering() {
        assert_eq!(less(&Value::Int(1), &Value::Int(2), 0), Ok(true));
        assert_eq!(less(&Value::Bool(false), &Value::Bool(true), 0), Ok(true));
        assert_eq!(greater(&s("b"), &s("a"), 0), Ok(true));
        assert_eq!(less(&s("Z"), &s("a"), 0), Ok(true));
        assert_eq!(less(&Value::Nil, &Value::Nil, 0), Err(RuntimeError::TypeMismatch { at: 0 }));
        assert_eq!(
            greater(&Value::Int(1), &Value::Float(0.0), 0),
            Err(RuntimeError::TypeMismatch { at: 0 })
        );
    }

    #[test]
    fn logic() {
        assert_eq!(logic_and(Value::Bool(true), Value::Bool(false), 0), Ok(Value::Bool(false)));
        assert_eq!(logic_or(Value::Bool(true), Value::Bool(false), 0), Ok(Value::Bool(true)));
        assert_eq!(logic_not(Value::Bool(true), 0), Ok(Value::Bool(false)));
        assert_eq!(logic_not(Value::Int(0), 0), Err(RuntimeError::TypeMismatch { at: 0 }));
    }

    #[test]
    fn code_points() {
        assert_eq!(int_to_char(Value::Int(65), 0), Ok(s("A")));
        assert_eq!(int_to_char(Value::Int(0x17E), 0), Ok(s("ž")));
        assert_eq!(
            int_to_char(Value::Int(0x110000), 1),
            Err(RuntimeError::InvalidCodePoint { at: 1, code: 0x110000 })
        );
        assert_eq!(
            int_to_char(Value::Int(-1), 1),
            Err(RuntimeError::InvalidCodePoint { at: 1, code: -1 })
        );
        assert_eq!(string_to_int(s("až"), Value::Int(1), 0), Ok(Value::Int(0x17E)));
    }

    #[test]
    fn string_indexing() {
        assert_eq!(get_char(s("hello"), Value::Int(1), 0), Ok(s("e")));
        assert_eq!(
            get_char(s("hello"), Value::Int(5), 3),
            Err(RuntimeError::StringIndexOutOfRange { at: 3, index: 5, length: 5 })
        );
        assert_eq!(
            get_char(s(""), Value::Int(-1), 3),
            Err(RuntimeError::StringIndexOutOfRange { at: 3, index: -1, length: 0 })
        );
        assert_eq!(string_length(s("žluť"), 0), Ok(Value::Int(4)));
    }

    #[test]
    fn set_char_rules() {
        assert_eq!(set_char(s("abc"), Value::Int(1), s("XY"), 0), Ok(s("aXc")));
        assert_eq!(
            set_char(s("abc"), Value::Int(1), s(""), 0),
            Err(RuntimeError::EmptyReplacement { at: 0 })
        );
        assert_eq!(
            set_char(s("abc"), Value::Int(3), s("x"), 0),
            Err(RuntimeError::StringIndexOutOfRange { at: 0, index: 3, length: 3 })
        );
        assert_eq!(
            set_char(Value::Int(1), Value::Int(0), s("x"), 0),
            Err(RuntimeError::TypeMismatch { at: 0 })
        );
    }

    #[test]
    fn float_conversions() {
        assert_eq!(int_to_float(Value::Int(3), 0), Ok(Value::Float(3.0)));
        assert_eq!(float_to_int(Value::Float(-2.7), 0), Ok(Value::Int(-2)));
        assert_eq!(float_to_int(Value::Float(1e300), 0).unwrap_err().exit_code(), 57);
        assert_eq!(float_to_int(Value::Float(f64::NAN), 0).unwrap_err().exit_code(), 57);
        assert_eq!(float_to_int(Value::Int(1), 0), Err(RuntimeError::TypeMismatch { at: 0 }));
    }

    #[test]
    fn concat_strings_only() {
        assert_eq!(concat(s("ab"), s("cd"), 0), Ok(s("abcd")));
        assert_eq!(concat(s("ab"), Value::Nil, 0), Err(RuntimeError::TypeMismatch { at: 0 }));
    }
}
