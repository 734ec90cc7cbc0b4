//! Instructions and their typed operands.
//!
//! An instruction is an opcode plus a fixed-shape operand list. The loader
//! checks every operand against [`Opcode::signature`]; the VM trusts it.

use std::fmt;

use crate::opcode::Opcode;
use crate::value::Value;

/// The kind of operand an opcode expects in a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// A variable reference.
    Var,
    /// A variable reference or a constant.
    Symb,
    /// A label name.
    Label,
    /// A type name.
    Type,
}

/// The frame a variable reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// `GF`, the global frame.
    Global,
    /// `LF`, the top of the frame stack.
    Local,
    /// `TF`, the temporary frame.
    Temporary,
}

impl FrameKind {
    /// The two-letter prefix used in operand text.
    pub fn prefix(&self) -> &'static str {
        match self {
            FrameKind::Global => "GF",
            FrameKind::Local => "LF",
            FrameKind::Temporary => "TF",
        }
    }

    /// Parse a frame prefix. Case-sensitive.
    pub fn from_prefix(prefix: &str) -> Option<FrameKind> {
        match prefix {
            "GF" => Some(FrameKind::Global),
            "LF" => Some(FrameKind::Local),
            "TF" => Some(FrameKind::Temporary),
            _ => None,
        }
    }
}

/// A variable reference such as `GF@counter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarRef {
    pub frame: FrameKind,
    pub name: String,
}

impl VarRef {
    pub fn new(frame: FrameKind, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame.prefix(), self.name)
    }
}

/// A type name operand, as used by READ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Int,
    Float,
    Bool,
    String,
    Nil,
}

impl TypeName {
    pub fn name(&self) -> &'static str {
        match self {
            TypeName::Int => "int",
            TypeName::Float => "float",
            TypeName::Bool => "bool",
            TypeName::String => "string",
            TypeName::Nil => "nil",
        }
    }

    /// Parse a type name. Case-sensitive.
    pub fn from_name(name: &str) -> Option<TypeName> {
        match name {
            "int" => Some(TypeName::Int),
            "float" => Some(TypeName::Float),
            "bool" => Some(TypeName::Bool),
            "string" => Some(TypeName::String),
            "nil" => Some(TypeName::Nil),
            _ => None,
        }
    }
}

/// A parsed, typed operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A variable reference.
    Var(VarRef),
    /// A literal constant.
    Const(Value),
    /// A label name, resolved against the label table at execution time.
    Label(String),
    /// A type name.
    Type(TypeName),
}

impl Operand {
    /// Whether this operand may appear where `kind` is expected.
    pub fn fits(&self, kind: OperandKind) -> bool {
        matches!(
            (self, kind),
            (Operand::Var(_), OperandKind::Var)
                | (Operand::Var(_), OperandKind::Symb)
                | (Operand::Const(_), OperandKind::Symb)
                | (Operand::Label(_), OperandKind::Label)
                | (Operand::Type(_), OperandKind::Type)
        )
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(var) => write!(f, "{var}"),
            Operand::Const(value) => f.write_str(&value.typed()),
            Operand::Label(name) => write!(f, "label@{name}"),
            Operand::Type(ty) => write!(f, "type@{}", ty.name()),
        }
    }
}

/// A single loaded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Zero-based execution position. Assigned by [`crate::Program::new`].
    pub index: usize,
    /// Order declared in the source document. Only statistics use it.
    pub order: u32,
    /// Operands in `arg1, arg2, arg3` order.
    pub args: Vec<Operand>,
}

impl Instruction {
    /// Create an instruction with no declared order.
    pub fn new(opcode: Opcode, args: Vec<Operand>) -> Self {
        Self {
            opcode,
            index: 0,
            order: 0,
            args,
        }
    }

    /// Set the declared source order.
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
