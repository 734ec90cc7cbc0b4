//! Runtime value representation for the IPPcode23 VM.
//!
//! Values are what live in variables and on the data stack during
//! execution. A declared variable that was never assigned holds
//! [`Slot::Uninitialized`], which is not a value: only `MOVE` and `TYPE`
//! may observe it.

use std::fmt;

use crate::literal::format_hex_float;

/// Runtime value representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// IEEE 754 64-bit float.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Sequence of Unicode code points.
    Str(String),
    /// The nil value. Distinct from an uninitialized slot.
    Nil,
}

impl Value {
    /// The name `TYPE` reports for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Nil => "nil",
        }
    }

    /// Whether both values are of the same variant.
    pub fn same_type(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Renders as `type@literal`, the operand notation used in BREAK dumps.
    pub fn typed(&self) -> String {
        match self {
            Value::Nil => "nil@nil".to_string(),
            other => format!("{}@{other}", other.type_name()),
        }
    }
}

/// The WRITE rendering: nil is empty, floats use the hexadecimal form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => f.write_str(&format_hex_float(*x)),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Str(s) => f.write_str(s),
            Value::Nil => Ok(()),
        }
    }
}

/// The content of a variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot {
    /// Declared by DEFVAR, never assigned.
    #[default]
    Uninitialized,
    /// Holds a value.
    Value(Value),
}

impl Slot {
    /// The held value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Slot::Uninitialized => None,
            Slot::Value(v) => Some(v),
        }
    }

    /// The name `TYPE` reports: empty for an uninitialized slot.
    pub fn type_name(&self) -> &'static str {
        self.value().map_or("", Value::type_name)
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Value(value)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Uninitialized => f.write_str("<uninitialized>"),
            Slot::Value(v) => f.write_str(&v.typed()),
        }
    }
}
