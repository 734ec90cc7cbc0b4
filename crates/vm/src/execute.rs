//! Main execution loop and opcode dispatch for the IPPcode23 VM.

use std::io::{BufRead, Write};

use ippcode_common::literal::{parse_float, parse_int};
use ippcode_common::{Instruction, Opcode, TypeName, Value};
use tracing::{debug, trace};

use crate::error::RuntimeError;
use crate::frame::Frame;
use crate::machine::Machine;
use crate::operators::{self, Arith};

/// What the loop does once an instruction completes.
enum Flow {
    Next,
    Exit(i32),
}

impl<'a, R: BufRead, W: Write, D: Write> Machine<'a, R, W, D> {
    /// Execute the program until the program counter leaves the program,
    /// EXIT runs, or an error occurs.
    ///
    /// Returns the exit code: 0, or the EXIT operand. Output and
    /// diagnostics are flushed on every path.
    pub fn execute(&mut self) -> Result<i32, RuntimeError> {
        let result = self.execute_loop();
        let flushed = self.output.flush().and_then(|()| self.diagnostics.flush());
        let code = result?;
        flushed.map_err(|e| self.io_error(e))?;
        Ok(code)
    }

    fn execute_loop(&mut self) -> Result<i32, RuntimeError> {
        let program = self.program;

        loop {
            let Some(instr) = program.instructions.get(self.pc) else {
                return Ok(0);
            };
            self.pc += 1;
            trace!(index = instr.index, opcode = %instr.opcode, "execute");

            let flow = self.step(instr)?;
            self.stats.record(instr);

            if let Flow::Exit(code) = flow {
                debug!(code, "exit");
                return Ok(code);
            }
        }
    }

    fn step(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        match instr.opcode {
            // Frames and calls
            Opcode::Move => self.exec_move(instr)?,
            Opcode::CreateFrame => self.temporary = Some(Frame::new()),
            Opcode::PushFrame => self.exec_pushframe()?,
            Opcode::PopFrame => self.exec_popframe()?,
            Opcode::DefVar => self.exec_defvar(instr)?,
            Opcode::Call => self.exec_call(instr)?,
            Opcode::Return => self.exec_return()?,

            // Data stack
            Opcode::PushS => {
                let value = self.value(self.arg(instr, 0)?)?;
                self.push(value);
            }
            Opcode::PopS => {
                let var = self.dest_arg(instr)?;
                let value = self.pop()?;
                self.assign(var, value)?;
            }
            Opcode::ClearS => self.data_stack.clear(),

            // Arithmetic, relational, boolean, conversions
            Opcode::Add => self.exec_binary(instr, |a, b, at| {
                operators::arithmetic(Arith::Add, a, b, at)
            })?,
            Opcode::Sub => self.exec_binary(instr, |a, b, at| {
                operators::arithmetic(Arith::Sub, a, b, at)
            })?,
            Opcode::Mul => self.exec_binary(instr, |a, b, at| {
                operators::arithmetic(Arith::Mul, a, b, at)
            })?,
            Opcode::IDiv => self.exec_binary(instr, operators::int_divide)?,
            Opcode::Div => self.exec_binary(instr, operators::float_divide)?,
            Opcode::Lt => self.exec_binary(instr, |a, b, at| {
                operators::less(&a, &b, at).map(Value::Bool)
            })?,
            Opcode::Gt => self.exec_binary(instr, |a, b, at| {
                operators::greater(&a, &b, at).map(Value::Bool)
            })?,
            Opcode::Eq => self.exec_binary(instr, |a, b, at| {
                operators::equals(&a, &b, at).map(Value::Bool)
            })?,
            Opcode::And => self.exec_binary(instr, operators::logic_and)?,
            Opcode::Or => self.exec_binary(instr, operators::logic_or)?,
            Opcode::Not => self.exec_unary(instr, operators::logic_not)?,
            Opcode::Int2Char => self.exec_unary(instr, operators::int_to_char)?,
            Opcode::Stri2Int => self.exec_binary(instr, operators::string_to_int)?,
            Opcode::Int2Float => self.exec_unary(instr, operators::int_to_float)?,
            Opcode::Float2Int => self.exec_unary(instr, operators::float_to_int)?,

            // Input and output
            Opcode::Read => self.exec_read(instr)?,
            Opcode::Write => self.exec_write(instr)?,

            // Strings
            Opcode::Concat => self.exec_binary(instr, operators::concat)?,
            Opcode::StrLen => self.exec_unary(instr, operators::string_length)?,
            Opcode::GetChar => self.exec_binary(instr, operators::get_char)?,
            Opcode::SetChar => self.exec_setchar(instr)?,

            // Types
            Opcode::Type => self.exec_type(instr)?,

            // Control flow
            Opcode::Label => {}
            Opcode::Jump => self.pc = self.resolve(self.label_arg(instr, 0)?)?,
            Opcode::JumpIfEq => self.exec_conditional_jump(instr, true)?,
            Opcode::JumpIfNeq => self.exec_conditional_jump(instr, false)?,
            Opcode::Exit => return self.exec_exit(instr),

            // Debugging
            Opcode::DPrint => self.exec_dprint(instr)?,
            Opcode::Break => self.exec_break()?,

            // Stack variants
            Opcode::AddS => self.exec_stack_binary(|a, b, at| {
                operators::arithmetic(Arith::Add, a, b, at)
            })?,
            Opcode::SubS => self.exec_stack_binary(|a, b, at| {
                operators::arithmetic(Arith::Sub, a, b, at)
            })?,
            Opcode::MulS => self.exec_stack_binary(|a, b, at| {
                operators::arithmetic(Arith::Mul, a, b, at)
            })?,
            Opcode::IDivS => self.exec_stack_binary(operators::int_divide)?,
            Opcode::LtS => self.exec_stack_binary(|a, b, at| {
                operators::less(&a, &b, at).map(Value::Bool)
            })?,
            Opcode::GtS => self.exec_stack_binary(|a, b, at| {
                operators::greater(&a, &b, at).map(Value::Bool)
            })?,
            Opcode::EqS => self.exec_stack_binary(|a, b, at| {
                operators::equals(&a, &b, at).map(Value::Bool)
            })?,
            Opcode::AndS => self.exec_stack_binary(operators::logic_and)?,
            Opcode::OrS => self.exec_stack_binary(operators::logic_or)?,
            Opcode::NotS => self.exec_stack_unary(operators::logic_not)?,
            Opcode::Int2CharS => self.exec_stack_unary(operators::int_to_char)?,
            Opcode::Stri2IntS => self.exec_stack_binary(operators::string_to_int)?,
            Opcode::JumpIfEqS => self.exec_stack_jump(instr, true)?,
            Opcode::JumpIfNeqS => self.exec_stack_jump(instr, false)?,
        }

        Ok(Flow::Next)
    }

    // ---- Frames and calls ----

    /// MOVE copies the source slot, so an uninitialized source leaves the
    /// destination uninitialized.
    fn exec_move(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.dest_arg(instr)?;
        let source = self.operand_slot(self.arg(instr, 1)?)?;
        self.store(dest, source)
    }

    fn exec_pushframe(&mut self) -> Result<(), RuntimeError> {
        let at = self.at();
        let frame = self
            .temporary
            .take()
            .ok_or(RuntimeError::MissingFrame { at, frame: "TF" })?;
        self.frames.push(frame);
        debug!(depth = self.frames.len(), "frame pushed");
        Ok(())
    }

    fn exec_popframe(&mut self) -> Result<(), RuntimeError> {
        let at = self.at();
        let frame = self
            .frames
            .pop()
            .ok_or(RuntimeError::MissingFrame { at, frame: "LF" })?;
        self.temporary = Some(frame);
        debug!(depth = self.frames.len(), "frame popped");
        self.stats.observe_vars(self.live_vars());
        Ok(())
    }

    fn exec_defvar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let var = self.var_arg(instr, 0)?;
        let at = self.at();
        if !self.frame_mut(var.frame)?.declare(&var.name) {
            return Err(RuntimeError::RedefinedVariable {
                at,
                var: var.to_string(),
            });
        }
        self.stats.observe_vars(self.live_vars());
        Ok(())
    }

    fn exec_call(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.resolve(self.label_arg(instr, 0)?)?;
        self.call_stack.push(self.pc);
        debug!(from = self.at(), to = target, "call");
        self.pc = target;
        Ok(())
    }

    fn exec_return(&mut self) -> Result<(), RuntimeError> {
        let at = self.at();
        self.pc = self
            .call_stack
            .pop()
            .ok_or(RuntimeError::CallStackEmpty { at })?;
        debug!(from = at, to = self.pc, "return");
        Ok(())
    }

    // ---- Operand plumbing ----

    /// `dest := op(arg2, arg3)`.
    fn exec_binary<F>(&mut self, instr: &Instruction, op: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(Value, Value, usize) -> Result<Value, RuntimeError>,
    {
        let dest = self.dest_arg(instr)?;
        let a = self.value(self.arg(instr, 1)?)?;
        let b = self.value(self.arg(instr, 2)?)?;
        let result = op(a, b, self.at())?;
        self.assign(dest, result)
    }

    /// `dest := op(arg2)`.
    fn exec_unary<F>(&mut self, instr: &Instruction, op: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(Value, usize) -> Result<Value, RuntimeError>,
    {
        let dest = self.dest_arg(instr)?;
        let a = self.value(self.arg(instr, 1)?)?;
        let result = op(a, self.at())?;
        self.assign(dest, result)
    }

    /// Pop right then left, push `op(left, right)`.
    fn exec_stack_binary<F>(&mut self, op: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(Value, Value, usize) -> Result<Value, RuntimeError>,
    {
        let (a, b) = self.pop_pair()?;
        let result = op(a, b, self.at())?;
        self.push(result);
        Ok(())
    }

    fn exec_stack_unary<F>(&mut self, op: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(Value, usize) -> Result<Value, RuntimeError>,
    {
        let a = self.pop()?;
        let result = op(a, self.at())?;
        self.push(result);
        Ok(())
    }

    // ---- Input and output ----

    fn exec_read(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let var = self.dest_arg(instr)?;
        let ty = self.type_arg(instr, 1)?;
        if ty == TypeName::Nil {
            return Err(self.malformed());
        }

        let value = match self.read_line()? {
            None => Value::Nil,
            Some(line) if line.is_empty() => Value::Nil,
            Some(line) => match ty {
                TypeName::Int => parse_int(&line).map_or(Value::Nil, Value::Int),
                TypeName::Float => parse_float(&line).map_or(Value::Nil, Value::Float),
                TypeName::Bool => Value::Bool(line.trim().eq_ignore_ascii_case("true")),
                TypeName::String | TypeName::Nil => Value::Str(line),
            },
        };
        self.assign(var, value)
    }

    fn exec_write(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.value(self.arg(instr, 0)?)?;
        write!(self.output, "{value}").map_err(|e| self.io_error(e))
    }

    // ---- Strings and types ----

    fn exec_setchar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.dest_arg(instr)?;
        let target = self.value(self.arg(instr, 0)?)?;
        let index = self.value(self.arg(instr, 1)?)?;
        let replacement = self.value(self.arg(instr, 2)?)?;
        let result = operators::set_char(target, index, replacement, self.at())?;
        self.assign(dest, result)
    }

    /// TYPE reports an empty name for an uninitialized operand.
    fn exec_type(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.dest_arg(instr)?;
        let slot = self.operand_slot(self.arg(instr, 1)?)?;
        self.assign(dest, Value::Str(slot.type_name().to_string()))
    }

    // ---- Control flow ----

    /// Operands are read first, then the label is resolved, then the guard
    /// is evaluated. A missing label fails even when the jump is not taken.
    fn exec_conditional_jump(
        &mut self,
        instr: &Instruction,
        when_equal: bool,
    ) -> Result<(), RuntimeError> {
        let a = self.value(self.arg(instr, 1)?)?;
        let b = self.value(self.arg(instr, 2)?)?;
        let target = self.resolve(self.label_arg(instr, 0)?)?;
        if operators::equals(&a, &b, self.at())? == when_equal {
            self.pc = target;
        }
        Ok(())
    }

    fn exec_stack_jump(&mut self, instr: &Instruction, when_equal: bool) -> Result<(), RuntimeError> {
        let (a, b) = self.pop_pair()?;
        let target = self.resolve(self.label_arg(instr, 0)?)?;
        if operators::equals(&a, &b, self.at())? == when_equal {
            self.pc = target;
        }
        Ok(())
    }

    fn exec_exit(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        let at = self.at();
        match self.value(self.arg(instr, 0)?)? {
            Value::Int(code @ 0..=49) => Ok(Flow::Exit(code as i32)),
            Value::Int(code) => Err(RuntimeError::ExitCodeOutOfRange { at, code }),
            _ => Err(RuntimeError::TypeMismatch { at }),
        }
    }

    // ---- Debugging ----

    fn exec_dprint(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.value(self.arg(instr, 0)?)?;
        write!(self.diagnostics, "{value}").map_err(|e| self.io_error(e))
    }

    fn exec_break(&mut self) -> Result<(), RuntimeError> {
        let dump = self.dump();
        self.diagnostics
            .write_all(dump.as_bytes())
            .map_err(|e| self.io_error(e))
    }
}
