//! Run statistics: executed instruction counts, hot spots, peak variables.
//!
//! The collector only observes. It is updated after an instruction
//! completes, so the instruction that raises a runtime error is never
//! counted.

use std::collections::BTreeMap;

use ippcode_common::opcode::ALL_OPCODES;
use ippcode_common::{Instruction, Opcode};

/// One field of the statistics report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatField {
    /// Number of executed instructions.
    Insts,
    /// Declared order of the most executed instruction.
    Hot,
    /// Peak number of simultaneously declared variables.
    Vars,
    /// Mnemonics of the most executed opcodes.
    Frequent,
    /// A literal string.
    Print(String),
    /// A line break.
    Eol,
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    executed: u64,
    /// Declared order and execution count per instruction index.
    per_instruction: BTreeMap<usize, (u32, u64)>,
    per_opcode: BTreeMap<Opcode, u64>,
    peak_vars: usize,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed instruction.
    pub fn record(&mut self, instr: &Instruction) {
        if instr.opcode.counts_as_executed() {
            self.executed += 1;
        }
        self.per_instruction
            .entry(instr.index)
            .or_insert((instr.order, 0))
            .1 += 1;
        *self.per_opcode.entry(instr.opcode).or_insert(0) += 1;
    }

    /// Record the number of variables currently reachable.
    pub fn observe_vars(&mut self, count: usize) {
        self.peak_vars = self.peak_vars.max(count);
    }

    /// Executed instructions, not counting LABEL, DPRINT and BREAK.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Lowest declared order among the most executed instructions, 0 if
    /// nothing ran.
    pub fn hot(&self) -> u32 {
        let max = self
            .per_instruction
            .values()
            .map(|&(_, count)| count)
            .max()
            .unwrap_or(0);
        self.per_instruction
            .values()
            .filter(|&&(_, count)| count == max)
            .map(|&(order, _)| order)
            .min()
            .unwrap_or(0)
    }

    pub fn peak_vars(&self) -> usize {
        self.peak_vars
    }

    /// How often `opcode` ran.
    pub fn count(&self, opcode: Opcode) -> u64 {
        self.per_opcode.get(&opcode).copied().unwrap_or(0)
    }

    /// Every opcode sharing the highest count, reverse-lexicographic by
    /// mnemonic.
    pub fn frequent(&self) -> Vec<Opcode> {
        let max = ALL_OPCODES.iter().map(|&op| self.count(op)).max().unwrap_or(0);
        let mut tied: Vec<Opcode> = ALL_OPCODES
            .iter()
            .copied()
            .filter(|&op| self.count(op) == max)
            .collect();
        tied.sort_by(|a, b| b.mnemonic().cmp(a.mnemonic()));
        tied
    }

    /// Render the report fields in order with no separators.
    pub fn render(&self, fields: &[StatField]) -> String {
        let mut out = String::new();
        for field in fields {
            match field {
                StatField::Insts => out.push_str(&self.executed.to_string()),
                StatField::Hot => out.push_str(&self.hot().to_string()),
                StatField::Vars => out.push_str(&self.peak_vars.to_string()),
                StatField::Frequent => {
                    let names: Vec<&str> = self.frequent().iter().map(Opcode::mnemonic).collect();
                    out.push_str(&names.join(","));
                }
                StatField::Print(text) => out.push_str(text),
                StatField::Eol => out.push('\n'),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippcode_common::{Operand, Value};

    fn at_order(opcode: Opcode, order: u32) -> Instruction {
        let args = match opcode {
            Opcode::Label => vec![Operand::Label("l".into())],
            Opcode::Write | Opcode::DPrint => vec![Operand::Const(Value::Nil)],
            _ => vec![],
        };
        let mut instr = Instruction::new(opcode, args).with_order(order);
        instr.index = order as usize;
        instr
    }

    #[test]
    fn empty_run() {
        let stats = Statistics::new();
        assert_eq!(stats.executed(), 0);
        assert_eq!(stats.hot(), 0);
        assert_eq!(stats.peak_vars(), 0);
        assert_eq!(stats.frequent().len(), ALL_OPCODES.len());
    }

    #[test]
    fn label_break_dprint_are_not_executed() {
        let mut stats = Statistics::new();
        stats.record(&at_order(Opcode::Label, 1));
        stats.record(&at_order(Opcode::Break, 2));
        stats.record(&at_order(Opcode::DPrint, 3));
        stats.record(&at_order(Opcode::CreateFrame, 4));
        assert_eq!(stats.executed(), 1);
        assert_eq!(stats.count(Opcode::Label), 1);
    }

    #[test]
    fn hot_picks_lowest_order_among_ties() {
        let mut stats = Statistics::new();
        for _ in 0..3 {
            stats.record(&at_order(Opcode::Write, 20));
            stats.record(&at_order(Opcode::Write, 7));
        }
        stats.record(&at_order(Opcode::CreateFrame, 2));
        assert_eq!(stats.hot(), 7);
    }

    #[test]
    fn frequent_is_reverse_lexicographic() {
        let mut stats = Statistics::new();
        stats.record(&at_order(Opcode::CreateFrame, 1));
        stats.record(&at_order(Opcode::Write, 2));
        stats.record(&at_order(Opcode::Break, 3));
        stats.record(&at_order(Opcode::Write, 2));
        stats.record(&at_order(Opcode::Break, 3));
        assert_eq!(stats.frequent(), vec![Opcode::Write, Opcode::Break]);
    }

    #[test]
    fn peak_vars_keeps_maximum() {
        let mut stats = Statistics::new();
        stats.observe_vars(2);
        stats.observe_vars(5);
        stats.observe_vars(1);
        assert_eq!(stats.peak_vars(), 5);
    }

    #[test]
    fn render_concatenates_fields() {
        let mut stats = Statistics::new();
        stats.record(&at_order(Opcode::Write, 4));
        stats.record(&at_order(Opcode::Write, 4));
        stats.record(&at_order(Opcode::CreateFrame, 5));
        stats.observe_vars(3);
        let report = stats.render(&[
            StatField::Print("insts=".into()),
            StatField::Insts,
            StatField::Eol,
            StatField::Hot,
            StatField::Vars,
            StatField::Frequent,
            StatField::Eol,
        ]);
        assert_eq!(report, "insts=3\n43WRITE\n");
    }
}
