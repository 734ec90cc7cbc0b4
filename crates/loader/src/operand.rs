//! Operand parsing: an argument's `type` attribute and text to an [`Operand`].

use ippcode_common::literal::{decode_escapes, parse_float, parse_int};
use ippcode_common::{FrameKind, LoadError, Operand, TypeName, Value, VarRef};

/// Characters allowed in identifiers besides ASCII letters and digits.
const SPECIAL: &str = "_-$&%*!?";

/// `[A-Za-z_$&%*!?-][A-Za-z0-9_$&%*!?-]*`
pub(crate) fn is_identifier(text: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphabetic() || SPECIAL.contains(c);
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if allowed(first) => chars.all(|c| allowed(c) || c.is_ascii_digit()),
        _ => false,
    }
}

/// `GF@name`, `LF@name` or `TF@name`.
pub(crate) fn parse_var(text: &str) -> Option<VarRef> {
    let (prefix, name) = text.split_once('@')?;
    let frame = FrameKind::from_prefix(prefix)?;
    is_identifier(name).then(|| VarRef::new(frame, name))
}

/// Parse one argument. `text` is already whitespace-trimmed.
pub(crate) fn parse_operand(order: u32, ty: &str, text: &str) -> Result<Operand, LoadError> {
    let invalid = |ty: &'static str| LoadError::InvalidLiteral {
        order,
        ty,
        text: text.to_string(),
    };

    match ty {
        "var" => parse_var(text)
            .map(Operand::Var)
            .ok_or_else(|| invalid("var")),
        "label" if is_identifier(text) => Ok(Operand::Label(text.to_string())),
        "label" => Err(invalid("label")),
        "type" => TypeName::from_name(text)
            .map(Operand::Type)
            .ok_or_else(|| invalid("type")),
        "int" => parse_int(text)
            .map(|n| Operand::Const(Value::Int(n)))
            .ok_or_else(|| invalid("int")),
        "float" => parse_float(text)
            .map(|x| Operand::Const(Value::Float(x)))
            .ok_or_else(|| invalid("float")),
        "bool" => match text {
            "true" => Ok(Operand::Const(Value::Bool(true))),
            "false" => Ok(Operand::Const(Value::Bool(false))),
            _ => Err(invalid("bool")),
        },
        "nil" if text == "nil" => Ok(Operand::Const(Value::Nil)),
        "nil" => Err(invalid("nil")),
        "string" => Ok(Operand::Const(Value::Str(decode_escapes(text)))),
        other => Err(LoadError::UnknownOperandType {
            order,
            ty: other.to_string(),
        }),
    }
}
