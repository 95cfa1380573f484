use std::collections::HashMap;

use pathwise_ir::{NodeIndex, Value};
use smallvec::SmallVec;

use crate::analyses::Dominators;

/// One member of a congruence class, remembered with its defining block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderEntry {
    pub value: Value,
    pub block: NodeIndex,
}

/// Occurrence lists per congruence class, in insertion order.
///
/// `find_leader` answers "which existing value can stand in for this class
/// at this block". Constants, parameters and call targets are live on
/// every path, so the first one wins outright; instruction results only
/// count when their defining block dominates the asking block.
#[derive(Default, Debug)]
pub struct LeaderTable {
    classes: HashMap<u32, SmallVec<[LeaderEntry; 2]>>,
}

impl LeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.classes.clear();
    }

    pub fn add(&mut self, class: u32, value: Value, block: NodeIndex) {
        self.classes
            .entry(class)
            .or_default()
            .push(LeaderEntry { value, block });
    }

    /// First member of `class` usable at `block`.
    pub fn find_leader(
        &self,
        doms: &Dominators,
        class: u32,
        block: NodeIndex,
    ) -> Option<Value> {
        for entry in self.classes.get(&class)? {
            match entry.value {
                Value::Inst(_) => {
                    if doms.dominates(entry.block, block) {
                        return Some(entry.value);
                    }
                }
                _ => return Some(entry.value),
            }
        }
        None
    }

    /// Members of `class` in insertion order.
    pub fn entries(&self, class: u32) -> &[LeaderEntry] {
        self.classes
            .get(&class)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Drop the exact `(value, block)` entry. The entry must exist;
    /// removing something that was never added is a caller bug.
    #[track_caller]
    pub fn remove(&mut self, class: u32, value: Value, block: NodeIndex) {
        let list = self
            .classes
            .get_mut(&class)
            .expect("removing from an empty congruence class");
        let pos = list
            .iter()
            .position(|entry| entry.value == value && entry.block == block)
            .expect("leader entry was never added");
        list.remove(pos);
    }
}
