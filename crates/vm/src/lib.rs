//! IPPcode23 virtual machine: executes loaded instruction streams.
//!
//! The VM holds:
//! - A global frame, a stack of local frames and an optional temporary frame
//! - A call stack of return addresses
//! - A data stack for PUSHS/POPS and the stack opcode variants
//! - Run statistics
//!
//! # Usage
//!
//! ```
//! use ippcode_common::{FrameKind, Instruction, Opcode, Operand, Program, Value, VarRef};
//! use ippcode_vm::run;
//!
//! let x = Operand::Var(VarRef::new(FrameKind::Global, "x"));
//! let program = Program::new(vec![
//!     Instruction::new(Opcode::DefVar, vec![x.clone()]),
//!     Instruction::new(Opcode::Move, vec![x.clone(), Operand::Const(Value::Int(5))]),
//!     Instruction::new(Opcode::Write, vec![x]),
//! ])
//! .unwrap();
//!
//! let mut output = Vec::new();
//! let outcome = run(&program, std::io::empty(), &mut output, std::io::sink()).unwrap();
//! assert_eq!(output, b"5");
//! assert_eq!(outcome.exit_code, 0);
//! ```

pub mod error;
pub mod execute;
pub mod frame;
pub mod machine;
pub mod operators;
pub mod stats;

pub use error::RuntimeError;
pub use frame::Frame;
pub use machine::Machine;
pub use stats::{StatField, Statistics};

use std::io::{BufRead, Write};

use ippcode_common::Program;

/// How a run ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// 0, or the operand of the EXIT that stopped the program.
    pub exit_code: i32,
    pub stats: Statistics,
}

/// Execute a program to completion.
///
/// `input` feeds READ, `output` receives WRITE and `diagnostics` receives
/// DPRINT and BREAK.
///
/// # Errors
///
/// Returns [`RuntimeError`] at the first failing instruction. Output
/// written before the failure has already been flushed.
pub fn run<R: BufRead, W: Write, D: Write>(
    program: &Program,
    input: R,
    output: W,
    diagnostics: D,
) -> Result<Outcome, RuntimeError> {
    let mut machine = Machine::new(program, input, output, diagnostics);
    let exit_code = machine.execute()?;
    Ok(Outcome {
        exit_code,
        stats: machine.into_stats(),
    })
}
