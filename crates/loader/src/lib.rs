//! IPPcode23 program loader: XML document to a validated [`Program`].
//!
//! The loader checks document structure, parses every operand into its
//! typed form, sorts instructions by their declared `order` and builds the
//! label table. Execution never revalidates what the loader accepted.
//!
//! # Usage
//!
//! ```
//! use ippcode_common::Opcode;
//! use ippcode_loader::load;
//!
//! let source = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <program language="IPPcode23">
//!   <instruction order="2" opcode="WRITE"><arg1 type="string">world</arg1></instruction>
//!   <instruction order="1" opcode="write"><arg1 type="string">hello\032</arg1></instruction>
//! </program>"#;
//!
//! let program = load(source).unwrap();
//! assert_eq!(program.len(), 2);
//! assert_eq!(program.instructions[0].opcode, Opcode::Write);
//! assert_eq!(program.instructions[0].order, 1);
//! ```

mod document;
mod operand;

pub use ippcode_common::LoadError;

use ippcode_common::Program;
use tracing::debug;

/// Load a program from its XML representation.
///
/// # Errors
///
/// Returns the first [`LoadError`] found. Use [`LoadError::exit_code`] for
/// the process exit status.
pub fn load(source: &str) -> Result<Program, LoadError> {
    let instructions = document::parse_document(source)?;
    let program = Program::new(instructions)?;
    debug!(
        instructions = program.len(),
        labels = program.labels.len(),
        "program loaded"
    );
    Ok(program)
}
