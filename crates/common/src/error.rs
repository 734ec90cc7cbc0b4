//! Load errors for IPPcode23 program documents.

use thiserror::Error;

/// Errors detected before any instruction executes.
///
/// `order` fields carry the declared order of the offending instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// The root element is not `program`.
    #[error("unexpected root element '{tag}'")]
    UnexpectedRoot { tag: String },

    /// The root element carries an attribute outside language/name/description.
    #[error("unexpected attribute '{name}' on program element")]
    UnexpectedRootAttribute { name: String },

    /// The `language` attribute is absent or names another language.
    #[error("unsupported language '{found}'")]
    WrongLanguage { found: String },

    /// A child of the root is not an `instruction` element.
    #[error("unexpected element '{tag}'")]
    UnexpectedElement { tag: String },

    /// A required attribute is missing.
    #[error("{element} element is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    /// The `order` attribute is not an integer or not positive.
    #[error("invalid instruction order '{text}'")]
    InvalidOrder { text: String },

    /// Two instructions declare the same order.
    #[error("duplicate instruction order {order}")]
    DuplicateOrder { order: u32 },

    /// The opcode is not a known mnemonic.
    #[error("instruction {order}: unknown opcode '{token}'")]
    UnknownOpcode { order: u32, token: String },

    /// The instruction has the wrong number of arguments.
    #[error("instruction {order}: {opcode} expects {expected} argument(s), found {found}")]
    ArgumentCount {
        order: u32,
        opcode: &'static str,
        expected: usize,
        found: usize,
    },

    /// An argument element is not one of `arg1..argN`, or appears twice.
    #[error("instruction {order}: unexpected argument element '{tag}'")]
    UnexpectedArgument { order: u32, tag: String },

    /// The argument `type` attribute is not a known operand type.
    #[error("instruction {order}: unknown operand type '{ty}'")]
    UnknownOperandType { order: u32, ty: String },

    /// The literal text does not match its declared type.
    #[error("instruction {order}: invalid {ty} literal '{text}'")]
    InvalidLiteral {
        order: u32,
        ty: &'static str,
        text: String,
    },

    /// An operand of the wrong kind for its position.
    #[error("instruction {order}: {opcode} argument {position} has the wrong kind")]
    OperandKindMismatch {
        order: u32,
        opcode: &'static str,
        position: usize,
    },

    /// READ asks for a type that cannot be read.
    #[error("instruction {order}: cannot READ type '{ty}'")]
    InvalidReadType { order: u32, ty: &'static str },

    /// The same label is defined more than once.
    #[error("duplicate label '{label}'")]
    DuplicateLabel { label: String },
}

impl LoadError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::MalformedXml(_) => 31,
            LoadError::DuplicateLabel { .. } => 52,
            _ => 32,
        }
    }
}
