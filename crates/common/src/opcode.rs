//! Opcode definitions for the IPPcode23 instruction set.
//!
//! The set is closed: the loader rejects any mnemonic not listed here, and
//! the VM dispatches with an exhaustive `match`.

use crate::instruction::OperandKind;

/// Identifies the operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    // Frames, calls
    /// Copy a symbol into a variable.
    Move,
    /// Replace the temporary frame with a fresh empty one.
    CreateFrame,
    /// Move the temporary frame onto the frame stack.
    PushFrame,
    /// Move the top of the frame stack into the temporary frame.
    PopFrame,
    /// Declare an uninitialized variable.
    DefVar,
    /// Push the return position, jump to a label.
    Call,
    /// Jump to the most recent return position.
    Return,

    // Data stack
    /// Push a symbol onto the data stack.
    PushS,
    /// Pop the data stack into a variable.
    PopS,
    /// Remove every value from the data stack.
    ClearS,

    // Arithmetic, relational, boolean, conversions
    /// Int + Int or Float + Float.
    Add,
    /// Int - Int or Float - Float.
    Sub,
    /// Int * Int or Float * Float.
    Mul,
    /// Floor division of two ints.
    IDiv,
    /// Division of two floats.
    Div,
    /// Less-than over two values of one non-nil type.
    Lt,
    /// Greater-than over two values of one non-nil type.
    Gt,
    /// Equality; nil compares with anything.
    Eq,
    /// Boolean conjunction.
    And,
    /// Boolean disjunction.
    Or,
    /// Boolean negation.
    Not,
    /// Code point to one-character string.
    Int2Char,
    /// Code point of the character at an index.
    Stri2Int,
    /// Int to float.
    Int2Float,
    /// Float to int, truncating.
    Float2Int,

    // I/O
    /// Read one line of program input as the given type.
    Read,
    /// Write a symbol to program output.
    Write,

    // Strings
    /// Concatenate two strings.
    Concat,
    /// Length of a string in code points.
    StrLen,
    /// One-character string at an index.
    GetChar,
    /// Replace the character at an index.
    SetChar,

    // Types
    /// Type name of a symbol, empty for an uninitialized variable.
    Type,

    // Control flow
    /// Jump target; no effect when executed.
    Label,
    /// Unconditional jump.
    Jump,
    /// Jump when two symbols are equal.
    JumpIfEq,
    /// Jump when two symbols differ.
    JumpIfNeq,
    /// Terminate with an exit code in `0..=49`.
    Exit,

    // Debugging
    /// Write a symbol to the diagnostics stream.
    DPrint,
    /// Dump the machine state to the diagnostics stream.
    Break,

    // Stack variants: operands come from the data stack
    /// ADD over the data stack.
    AddS,
    /// SUB over the data stack.
    SubS,
    /// MUL over the data stack.
    MulS,
    /// IDIV over the data stack.
    IDivS,
    /// LT over the data stack.
    LtS,
    /// GT over the data stack.
    GtS,
    /// EQ over the data stack.
    EqS,
    /// AND over the data stack.
    AndS,
    /// OR over the data stack.
    OrS,
    /// NOT over the data stack.
    NotS,
    /// INT2CHAR over the data stack.
    Int2CharS,
    /// STRI2INT over the data stack.
    Stri2IntS,
    /// JUMPIFEQ over the data stack.
    JumpIfEqS,
    /// JUMPIFNEQ over the data stack.
    JumpIfNeqS,
}

/// All valid opcodes, in definition order.
pub const ALL_OPCODES: [Opcode; 53] = [
    Opcode::Move,
    Opcode::CreateFrame,
    Opcode::PushFrame,
    Opcode::PopFrame,
    Opcode::DefVar,
    Opcode::Call,
    Opcode::Return,
    Opcode::PushS,
    Opcode::PopS,
    Opcode::ClearS,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::IDiv,
    Opcode::Div,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Eq,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Int2Char,
    Opcode::Stri2Int,
    Opcode::Int2Float,
    Opcode::Float2Int,
    Opcode::Read,
    Opcode::Write,
    Opcode::Concat,
    Opcode::StrLen,
    Opcode::GetChar,
    Opcode::SetChar,
    Opcode::Type,
    Opcode::Label,
    Opcode::Jump,
    Opcode::JumpIfEq,
    Opcode::JumpIfNeq,
    Opcode::Exit,
    Opcode::DPrint,
    Opcode::Break,
    Opcode::AddS,
    Opcode::SubS,
    Opcode::MulS,
    Opcode::IDivS,
    Opcode::LtS,
    Opcode::GtS,
    Opcode::EqS,
    Opcode::AndS,
    Opcode::OrS,
    Opcode::NotS,
    Opcode::Int2CharS,
    Opcode::Stri2IntS,
    Opcode::JumpIfEqS,
    Opcode::JumpIfNeqS,
];

impl Opcode {
    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::CreateFrame => "CREATEFRAME",
            Opcode::PushFrame => "PUSHFRAME",
            Opcode::PopFrame => "POPFRAME",
            Opcode::DefVar => "DEFVAR",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::PushS => "PUSHS",
            Opcode::PopS => "POPS",
            Opcode::ClearS => "CLEARS",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::IDiv => "IDIV",
            Opcode::Div => "DIV",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Int2Char => "INT2CHAR",
            Opcode::Stri2Int => "STRI2INT",
            Opcode::Int2Float => "INT2FLOAT",
            Opcode::Float2Int => "FLOAT2INT",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Concat => "CONCAT",
            Opcode::StrLen => "STRLEN",
            Opcode::GetChar => "GETCHAR",
            Opcode::SetChar => "SETCHAR",
            Opcode::Type => "TYPE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfEq => "JUMPIFEQ",
            Opcode::JumpIfNeq => "JUMPIFNEQ",
            Opcode::Exit => "EXIT",
            Opcode::DPrint => "DPRINT",
            Opcode::Break => "BREAK",
            Opcode::AddS => "ADDS",
            Opcode::SubS => "SUBS",
            Opcode::MulS => "MULS",
            Opcode::IDivS => "IDIVS",
            Opcode::LtS => "LTS",
            Opcode::GtS => "GTS",
            Opcode::EqS => "EQS",
            Opcode::AndS => "ANDS",
            Opcode::OrS => "ORS",
            Opcode::NotS => "NOTS",
            Opcode::Int2CharS => "INT2CHARS",
            Opcode::Stri2IntS => "STRI2INTS",
            Opcode::JumpIfEqS => "JUMPIFEQS",
            Opcode::JumpIfNeqS => "JUMPIFNEQS",
        }
    }

    /// Look up an opcode by mnemonic, ignoring ASCII case.
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
            .copied()
    }

    /// The operand shape this opcode expects, in `arg1, arg2, arg3` order.
    pub fn signature(&self) -> &'static [OperandKind] {
        use OperandKind::{Label as L, Symb as S, Type as T, Var as V};

        match self {
            Opcode::CreateFrame
            | Opcode::PushFrame
            | Opcode::PopFrame
            | Opcode::Return
            | Opcode::Break
            | Opcode::ClearS
            | Opcode::AddS
            | Opcode::SubS
            | Opcode::MulS
            | Opcode::IDivS
            | Opcode::LtS
            | Opcode::GtS
            | Opcode::EqS
            | Opcode::AndS
            | Opcode::OrS
            | Opcode::NotS
            | Opcode::Int2CharS
            | Opcode::Stri2IntS => &[],

            Opcode::DefVar | Opcode::PopS => &[V],
            Opcode::PushS | Opcode::Write | Opcode::Exit | Opcode::DPrint => &[S],
            Opcode::Call | Opcode::Label | Opcode::Jump | Opcode::JumpIfEqS | Opcode::JumpIfNeqS => {
                &[L]
            }

            Opcode::Move
            | Opcode::Not
            | Opcode::Int2Char
            | Opcode::Int2Float
            | Opcode::Float2Int
            | Opcode::StrLen
            | Opcode::Type => &[V, S],
            Opcode::Read => &[V, T],

            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::IDiv
            | Opcode::Div
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or
            | Opcode::Stri2Int
            | Opcode::Concat
            | Opcode::GetChar
            | Opcode::SetChar => &[V, S, S],
            Opcode::JumpIfEq | Opcode::JumpIfNeq => &[L, S, S],
        }
    }

    /// Number of operands the opcode takes.
    pub fn arity(&self) -> usize {
        self.signature().len()
    }

    /// Whether an execution of this opcode counts toward the executed
    /// instruction total. Labels and debugging opcodes do not.
    pub fn counts_as_executed(&self) -> bool {
        !matches!(self, Opcode::Label | Opcode::Break | Opcode::DPrint)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_opcodes_count() {
        assert_eq!(ALL_OPCODES.len(), 53);
    }

    #[test]
    fn mnemonic_lookup_roundtrip() {
        for &opcode in &ALL_OPCODES {
            assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
        }
    }

    #[test]
    fn mnemonic_lookup_ignores_case() {
        assert_eq!(Opcode::from_mnemonic("move"), Some(Opcode::Move));
        assert_eq!(Opcode::from_mnemonic("JumpIfNeqS"), Some(Opcode::JumpIfNeqS));
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(Opcode::from_mnemonic("NOP"), None);
        assert_eq!(Opcode::from_mnemonic(""), None);
        assert_eq!(Opcode::from_mnemonic("DIVS"), None);
    }

    #[test]
    fn mnemonics_are_uppercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for &opcode in &ALL_OPCODES {
            let m = opcode.mnemonic();
            assert_eq!(m, m.to_uppercase(), "mnemonic should be uppercase: {m}");
            assert!(seen.insert(m), "duplicate mnemonic {m}");
        }
    }

    #[test]
    fn arities() {
        assert_eq!(Opcode::CreateFrame.arity(), 0);
        assert_eq!(Opcode::DefVar.arity(), 1);
        assert_eq!(Opcode::Read.arity(), 2);
        assert_eq!(Opcode::JumpIfEq.arity(), 3);
        assert_eq!(Opcode::JumpIfEqS.arity(), 1);
        assert_eq!(Opcode::AddS.arity(), 0);
    }

    #[test]
    fn conditional_jump_takes_label_first() {
        assert_eq!(
            Opcode::JumpIfNeq.signature(),
            &[OperandKind::Label, OperandKind::Symb, OperandKind::Symb]
        );
    }

    #[test]
    fn uncounted_opcodes() {
        let uncounted: Vec<_> = ALL_OPCODES
            .iter()
            .filter(|op| !op.counts_as_executed())
            .collect();
        assert_eq!(uncounted, vec![&Opcode::Label, &Opcode::DPrint, &Opcode::Break]);
    }
}
