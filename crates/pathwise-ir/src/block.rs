use crate::{InstId, Terminator};

/// A basic block: phi nodes, an ordered body of instructions and a
/// terminator. Bodies store arena ids; the instruction data lives in the
/// owning [`Function`](crate::Function).
#[derive(Default, Debug, Clone)]
pub struct BasicBlock {
    /// Phi nodes, conceptually executed on entry before the body.
    pub phis: Vec<InstId>,
    /// Body instructions in execution order.
    pub ops: Vec<InstId>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn is_empty(&self) -> bool {
        self.phis.is_empty() && self.ops.is_empty()
    }
}
