//! IPPcode23 common types and literal handling.
//!
//! This crate provides the foundational data structures for the IPPcode23
//! instruction set:
//!
//! - [`Opcode`]: the 53 opcodes, their mnemonics and operand signatures
//! - [`Operand`]: typed operands: variables, constants, labels, type names
//! - [`Instruction`]: one loaded instruction with its execution index
//! - [`Value`] / [`Slot`]: runtime values and variable contents
//! - [`Program`] / [`LabelTable`]: the instruction stream and its labels
//! - [`LoadError`]: errors detected before execution
//! - [`literal`]: int/float literal parsing, hex-float rendering, escapes

pub mod error;
pub mod instruction;
pub mod literal;
pub mod opcode;
pub mod program;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::LoadError;
pub use instruction::{FrameKind, Instruction, Operand, OperandKind, TypeName, VarRef};
pub use opcode::Opcode;
pub use program::{LabelTable, Program};
pub use value::{Slot, Value};
