//! Runtime errors for the IPPcode23 VM.
//!
//! These are errors that can only happen while a program runs. Every
//! variant carries the index (`at`) of the instruction that failed.

use thiserror::Error;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A jump or call names a label no LABEL instruction defines.
    #[error("undefined label '{label}' at instruction {at}")]
    UndefinedLabel { at: usize, label: String },

    /// DEFVAR on a name already declared in that frame.
    #[error("variable {var} redefined at instruction {at}")]
    RedefinedVariable { at: usize, var: String },

    /// An operand has the wrong type for the operation.
    #[error("wrong operand type at instruction {at}")]
    TypeMismatch { at: usize },

    /// Access to a variable that was never declared.
    #[error("undefined variable {var} at instruction {at}")]
    UndefinedVariable { at: usize, var: String },

    /// LF with an empty frame stack, or TF before CREATEFRAME.
    #[error("frame {frame} does not exist at instruction {at}")]
    MissingFrame { at: usize, frame: &'static str },

    /// A declared variable was read before it was assigned.
    #[error("variable {var} has no value at instruction {at}")]
    MissingValue { at: usize, var: String },

    /// RETURN with an empty call stack.
    #[error("RETURN with empty call stack at instruction {at}")]
    CallStackEmpty { at: usize },

    /// A stack opcode needed more values than the data stack holds.
    #[error("data stack underflow at instruction {at}")]
    DataStackUnderflow { at: usize },

    /// IDIV or DIV with a zero divisor.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// EXIT with a code outside 0..=49.
    #[error("exit code {code} out of range at instruction {at}")]
    ExitCodeOutOfRange { at: usize, code: i64 },

    /// FLOAT2INT on a float with no integer counterpart.
    #[error("float {value} cannot be converted to int at instruction {at}")]
    FloatOutOfRange { at: usize, value: String },

    /// String index outside `0..length`.
    #[error("string index {index} out of range (length {length}) at instruction {at}")]
    StringIndexOutOfRange { at: usize, index: i64, length: usize },

    /// INT2CHAR on a number that is not a Unicode scalar value.
    #[error("invalid code point {code} at instruction {at}")]
    InvalidCodePoint { at: usize, code: i64 },

    /// SETCHAR with an empty replacement string.
    #[error("empty replacement string at instruction {at}")]
    EmptyReplacement { at: usize },

    /// The operand list does not match the opcode's signature.
    #[error("malformed operands at instruction {at}")]
    InvalidOperand { at: usize },

    /// Reading program input or writing program output failed.
    #[error("I/O failure at instruction {at}: {message}")]
    Io { at: usize, message: String },
}

impl RuntimeError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RuntimeError::UndefinedLabel { .. } | RuntimeError::RedefinedVariable { .. } => 52,
            RuntimeError::TypeMismatch { .. } => 53,
            RuntimeError::UndefinedVariable { .. } => 54,
            RuntimeError::MissingFrame { .. } => 55,
            RuntimeError::MissingValue { .. }
            | RuntimeError::CallStackEmpty { .. }
            | RuntimeError::DataStackUnderflow { .. } => 56,
            RuntimeError::DivisionByZero { .. }
            | RuntimeError::ExitCodeOutOfRange { .. }
            | RuntimeError::FloatOutOfRange { .. } => 57,
            RuntimeError::StringIndexOutOfRange { .. }
            | RuntimeError::InvalidCodePoint { .. }
            | RuntimeError::EmptyReplacement { .. } => 58,
            RuntimeError::InvalidOperand { .. } => 32,
            RuntimeError::Io { .. } => 99,
        }
    }

    /// Index of the instruction that failed.
    pub fn at(&self) -> usize {
        match self {
            RuntimeError::UndefinedLabel { at, .. }
            | RuntimeError::RedefinedVariable { at, .. }
            | RuntimeError::TypeMismatch { at }
            | RuntimeError::UndefinedVariable { at, .. }
            | RuntimeError::MissingFrame { at, .. }
            | RuntimeError::MissingValue { at, .. }
            | RuntimeError::CallStackEmpty { at }
            | RuntimeError::DataStackUnderflow { at }
            | RuntimeError::DivisionByZero { at }
            | RuntimeError::ExitCodeOutOfRange { at, .. }
            | RuntimeError::FloatOutOfRange { at, .. }
            | RuntimeError::StringIndexOutOfRange { at, .. }
            | RuntimeError::InvalidCodePoint { at, .. }
            | RuntimeError::EmptyReplacement { at }
            | RuntimeError::InvalidOperand { at }
            | RuntimeError::Io { at, .. } => *at,
        }
    }
}
