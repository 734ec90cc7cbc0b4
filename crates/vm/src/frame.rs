//! Variable storage frames.

use std::collections::BTreeMap;

use ippcode_common::Slot;

/// A named-variable scope: the global frame, a local frame, or the
/// temporary frame.
///
/// Names are kept ordered so BREAK dumps are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    vars: BTreeMap<String, Slot>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` as uninitialized. Returns false if it already exists.
    pub fn declare(&mut self, name: &str) -> bool {
        if self.vars.contains_key(name) {
            return false;
        }
        self.vars.insert(name.to_string(), Slot::Uninitialized);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.vars.get_mut(name)
    }

    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.vars.iter().map(|(name, slot)| (name.as_str(), slot))
    }
}
