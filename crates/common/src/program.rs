//! Program representation: the ordered instruction list and its labels.

use std::collections::HashMap;

use crate::error::LoadError;
use crate::instruction::{Instruction, Operand};
use crate::opcode::Opcode;

/// Label name to instruction index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    targets: HashMap<String, usize>,
}

impl LabelTable {
    /// Record every LABEL instruction. A name defined twice is an error.
    pub fn build(instructions: &[Instruction]) -> Result<Self, LoadError> {
        let mut targets = HashMap::new();
        for instr in instructions {
            if instr.opcode != Opcode::Label {
                continue;
            }
            if let Some(Operand::Label(name)) = instr.args.first() {
                if targets.insert(name.clone(), instr.index).is_some() {
                    return Err(LoadError::DuplicateLabel {
                        label: name.clone(),
                    });
                }
            }
        }
        Ok(Self { targets })
    }

    /// Index of the LABEL instruction with this name.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.targets.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// An IPPcode23 program: instructions in execution order plus labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The instruction stream. `instructions[i].index == i`.
    pub instructions: Vec<Instruction>,
    /// Labels resolved against `instructions`.
    pub labels: LabelTable,
}

impl Program {
    /// Create a program from instructions already in execution order.
    ///
    /// Each instruction's `index` is set to its position, then the label
    /// table is built.
    pub fn new(mut instructions: Vec<Instruction>) -> Result<Self, LoadError> {
        for (index, instr) in instructions.iter_mut().enumerate() {
            instr.index = index;
        }
        let labels = LabelTable::build(&instructions)?;
        Ok(Self {
            instructions,
            labels,
        })
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
