//! VM state management: frames, stacks, operand access and I/O.

use std::io::{BufRead, Write};

use ippcode_common::{FrameKind, Instruction, Operand, Program, Slot, TypeName, Value, VarRef};

use crate::error::RuntimeError;
use crate::frame::Frame;
use crate::stats::Statistics;

/// The IPPcode23 virtual machine.
///
/// `R` supplies program input for READ, `W` receives WRITE output and `D`
/// receives DPRINT and BREAK diagnostics.
pub struct Machine<'a, R, W, D> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    pub(crate) input: R,
    pub(crate) output: W,
    pub(crate) diagnostics: D,
    /// The global frame. Exists for the whole run.
    pub(crate) globals: Frame,
    /// The frame stack. The last element is the local frame.
    pub(crate) frames: Vec<Frame>,
    /// The temporary frame, if one has been created.
    pub(crate) temporary: Option<Frame>,
    /// Return addresses pushed by CALL.
    pub(crate) call_stack: Vec<usize>,
    /// Values pushed by PUSHS and the stack opcodes.
    pub(crate) data_stack: Vec<Value>,
    /// Program counter (instruction index).
    pub(crate) pc: usize,
    pub(crate) stats: Statistics,
}

impl<'a, R: BufRead, W: Write, D: Write> Machine<'a, R, W, D> {
    /// Create a new VM for the given program.
    pub fn new(program: &'a Program, input: R, output: W, diagnostics: D) -> Self {
        Self {
            program,
            input,
            output,
            diagnostics,
            globals: Frame::new(),
            frames: Vec::new(),
            temporary: None,
            call_stack: Vec::new(),
            data_stack: Vec::new(),
            pc: 0,
            stats: Statistics::new(),
        }
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn into_stats(self) -> Statistics {
        self.stats
    }

    /// Current data stack, bottom first.
    pub fn data_stack(&self) -> &[Value] {
        &self.data_stack
    }

    pub fn globals(&self) -> &Frame {
        &self.globals
    }

    /// Index of the instruction being executed.
    pub(crate) fn at(&self) -> usize {
        self.pc.saturating_sub(1)
    }

    fn frame(&self, kind: FrameKind) -> Result<&Frame, RuntimeError> {
        let frame = match kind {
            FrameKind::Global => Some(&self.globals),
            FrameKind::Local => self.frames.last(),
            FrameKind::Temporary => self.temporary.as_ref(),
        };
        frame.ok_or(RuntimeError::MissingFrame {
            at: self.at(),
            frame: kind.prefix(),
        })
    }

    pub(crate) fn frame_mut(&mut self, kind: FrameKind) -> Result<&mut Frame, RuntimeError> {
        let at = self.at();
        let frame = match kind {
            FrameKind::Global => Some(&mut self.globals),
            FrameKind::Local => self.frames.last_mut(),
            FrameKind::Temporary => self.temporary.as_mut(),
        };
        frame.ok_or(RuntimeError::MissingFrame {
            at,
            frame: kind.prefix(),
        })
    }

    fn slot(&self, var: &VarRef) -> Result<&Slot, RuntimeError> {
        self.frame(var.frame)?
            .get(&var.name)
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                at: self.at(),
                var: var.to_string(),
            })
    }

    /// Store `slot` into an already declared variable.
    pub(crate) fn store(&mut self, var: &VarRef, slot: Slot) -> Result<(), RuntimeError> {
        let at = self.at();
        let target = self
            .frame_mut(var.frame)?
            .get_mut(&var.name)
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                at,
                var: var.to_string(),
            })?;
        *target = slot;
        Ok(())
    }

    pub(crate) fn assign(&mut self, var: &VarRef, value: Value) -> Result<(), RuntimeError> {
        self.store(var, Slot::Value(value))
    }

    /// The storage state behind a symbol operand. Constants are always set.
    pub(crate) fn operand_slot(&self, operand: &Operand) -> Result<Slot, RuntimeError> {
        match operand {
            Operand::Const(value) => Ok(Slot::Value(value.clone())),
            Operand::Var(var) => self.slot(var).cloned(),
            Operand::Label(_) | Operand::Type(_) => Err(self.malformed()),
        }
    }

    /// The value of a symbol operand. An uninitialized variable is an error.
    pub(crate) fn value(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        match operand {
            Operand::Const(value) => Ok(value.clone()),
            Operand::Var(var) => match self.slot(var)? {
                Slot::Value(value) => Ok(value.clone()),
                Slot::Uninitialized => Err(RuntimeError::MissingValue {
                    at: self.at(),
                    var: var.to_string(),
                }),
            },
            Operand::Label(_) | Operand::Type(_) => Err(self.malformed()),
        }
    }

    pub(crate) fn malformed(&self) -> RuntimeError {
        RuntimeError::InvalidOperand { at: self.at() }
    }

    pub(crate) fn arg<'i>(&self, instr: &'i Instruction, n: usize) -> Result<&'i Operand, RuntimeError> {
        instr.args.get(n).ok_or_else(|| self.malformed())
    }

    pub(crate) fn var_arg<'i>(&self, instr: &'i Instruction, n: usize) -> Result<&'i VarRef, RuntimeError> {
        match self.arg(instr, n)? {
            Operand::Var(var) => Ok(var),
            _ => Err(self.malformed()),
        }
    }

    /// The destination variable in arg1. Its frame and declaration are
    /// checked before any source operand is read.
    pub(crate) fn dest_arg<'i>(&self, instr: &'i Instruction) -> Result<&'i VarRef, RuntimeError> {
        let var = self.var_arg(instr, 0)?;
        self.slot(var)?;
        Ok(var)
    }

    pub(crate) fn label_arg<'i>(&self, instr: &'i Instruction, n: usize) -> Result<&'i str, RuntimeError> {
        match self.arg(instr, n)? {
            Operand::Label(name) => Ok(name),
            _ => Err(self.malformed()),
        }
    }

    pub(crate) fn type_arg(&self, instr: &Instruction, n: usize) -> Result<TypeName, RuntimeError> {
        match self.arg(instr, n)? {
            Operand::Type(ty) => Ok(*ty),
            _ => Err(self.malformed()),
        }
    }

    /// Resolve a label to its instruction index.
    pub(crate) fn resolve(&self, label: &str) -> Result<usize, RuntimeError> {
        self.program
            .labels
            .resolve(label)
            .ok_or_else(|| RuntimeError::UndefinedLabel {
                at: self.at(),
                label: label.to_string(),
            })
    }

    /// Push a value onto the data stack.
    pub(crate) fn push(&mut self, value: Value) {
        self.data_stack.push(value);
    }

    /// Pop a value from the data stack.
    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        let at = self.at();
        self.data_stack
            .pop()
            .ok_or(RuntimeError::DataStackUnderflow { at })
    }

    /// Pop `(left, right)`: right is the top of the stack.
    pub(crate) fn pop_pair(&mut self) -> Result<(Value, Value), RuntimeError> {
        if self.data_stack.len() < 2 {
            return Err(RuntimeError::DataStackUnderflow { at: self.at() });
        }
        let right = self.pop()?;
        let left = self.pop()?;
        Ok((left, right))
    }

    /// Variables currently reachable through GF, LF and TF.
    pub(crate) fn live_vars(&self) -> usize {
        self.globals.len()
            + self.frames.last().map_or(0, Frame::len)
            + self.temporary.as_ref().map_or(0, Frame::len)
    }

    /// Read one input line without its terminator. `None` at end of input
    /// and for a line that is not valid UTF-8.
    pub(crate) fn read_line(&mut self) -> Result<Option<String>, RuntimeError> {
        let mut bytes = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut bytes)
            .map_err(|e| self.io_error(e))?;
        if read == 0 {
            return Ok(None);
        }
        if bytes.ends_with(b"\n") {
            bytes.pop();
            if bytes.ends_with(b"\r") {
                bytes.pop();
            }
        }
        Ok(String::from_utf8(bytes).ok())
    }

    pub(crate) fn io_error(&self, err: std::io::Error) -> RuntimeError {
        RuntimeError::Io {
            at: self.at(),
            message: err.to_string(),
        }
    }

    /// Text dump of the execution state for BREAK.
    pub(crate) fn dump(&self) -> String {
        fn frame_contents(frame: Option<&Frame>) -> String {
            match frame {
                None => "<none>".to_string(),
                Some(frame) => {
                    let vars: Vec<String> = frame
                        .iter()
                        .map(|(name, slot)| format!("{name}={slot}"))
                        .collect();
                    format!("{{{}}}", vars.join(", "))
                }
            }
        }

        let data: Vec<String> = self.data_stack.iter().map(Value::typed).collect();
        let mut out = String::new();
        out.push_str(&format!("position: {}\n", self.at()));
        out.push_str(&format!("executed: {}\n", self.stats.executed()));
        out.push_str(&format!("call stack: {:?}\n", self.call_stack));
        out.push_str(&format!("frame stack depth: {}\n", self.frames.len()));
        out.push_str(&format!("data stack: [{}]\n", data.join(", ")));
        out.push_str(&format!("GF: {}\n", frame_contents(Some(&self.globals))));
        out.push_str(&format!("LF: {}\n", frame_contents(self.frames.last())));
        out.push_str(&format!("TF: {}\n", frame_contents(self.temporary.as_ref())));
        out
    }
}
