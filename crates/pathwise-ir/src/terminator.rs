use petgraph::graph::NodeIndex;
use smallvec::SmallVec;

use crate::Value;

/// Control flow at the end of a basic block.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Unconditional jump.
    Br { dest: NodeIndex },
    /// Two-way branch on a boolean condition.
    CondBr {
        cond: Value,
        then_dest: NodeIndex,
        else_dest: NodeIndex,
    },
    /// Multi-way branch on an integer value.
    Switch {
        value: Value,
        default: NodeIndex,
        cases: Vec<(i64, NodeIndex)>,
    },
    /// Computed jump. `dests` lists every block the address may reach.
    IndirectBr { address: Value, dests: Vec<NodeIndex> },
    /// Function return.
    Ret { value: Option<Value> },
    /// Placeholder on blocks still under construction.
    #[default]
    None,
}

impl Terminator {
    /// Successor blocks in branch order, without duplicates.
    pub fn targets(&self) -> SmallVec<[NodeIndex; 2]> {
        let mut targets: SmallVec<[NodeIndex; 2]> = SmallVec::new();
        let mut push = |target: NodeIndex| {
            if !targets.contains(&target) {
                targets.push(target);
            }
        };
        match self {
            Terminator::Br { dest } => push(*dest),
            Terminator::CondBr {
                then_dest,
                else_dest,
                ..
            } => {
                push(*then_dest);
                push(*else_dest);
            }
            Terminator::Switch { default, cases, .. } => {
                push(*default);
                for (_, dest) in cases {
                    push(*dest);
                }
            }
            Terminator::IndirectBr { dests, .. } => {
                for dest in dests {
                    push(*dest);
                }
            }
            Terminator::Ret { .. } | Terminator::None => {}
        }
        targets
    }

    /// Value the terminator branches or returns on, if any.
    pub fn operand(&self) -> Option<&Value> {
        match self {
            Terminator::CondBr { cond, .. } => Some(cond),
            Terminator::Switch { value, .. } => Some(value),
            Terminator::IndirectBr { address, .. } => Some(address),
            Terminator::Ret { value } => value.as_ref(),
            Terminator::Br { .. } | Terminator::None => None,
        }
    }

    pub fn operand_mut(&mut self) -> Option<&mut Value> {
        match self {
            Terminator::CondBr { cond, .. } => Some(cond),
            Terminator::Switch { value, .. } => Some(value),
            Terminator::IndirectBr { address, .. } => Some(address),
            Terminator::Ret { value } => value.as_mut(),
            Terminator::Br { .. } | Terminator::None => None,
        }
    }

    pub fn is_indirect(&self) -> bool {
        matches!(self, Terminator::IndirectBr { .. })
    }

    /// Redirect every occurrence of `from` among the targets to `to`.
    pub(crate) fn retarget(&mut self, from: NodeIndex, to: NodeIndex) {
        let update = |id: &mut NodeIndex| {
            if *id == from {
                *id = to;
            }
        };
        match self {
            Terminator::Br { dest } => update(dest),
            Terminator::CondBr {
                then_dest,
                else_dest,
                ..
            } => {
                update(then_dest);
                update(else_dest);
            }
            Terminator::Switch { default, cases, .. } => {
                update(default);
                for (_, dest) in cases {
                    update(dest);
                }
            }
            Terminator::IndirectBr { dests, .. } => {
                for dest in dests {
                    update(dest);
                }
            }
            Terminator::Ret { .. } | Terminator::None => {}
        }
    }
}
