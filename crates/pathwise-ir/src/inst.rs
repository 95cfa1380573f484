use petgraph::graph::NodeIndex;
use smallvec::SmallVec;

use crate::{OpCode, Type, Value};

/// Arena index of an instruction. Indices stay valid across unrelated
/// insertions and erasures.
pub type InstId = usize;

/// One instruction in the function arena.
#[derive(Debug, Clone)]
pub struct InstData {
    pub opcode: OpCode,
    pub ty: Type,
    pub operands: SmallVec<[Value; 2]>,
    /// Incoming blocks, parallel to `operands`. Populated on phis only.
    pub incoming: SmallVec<[NodeIndex; 2]>,
    pub(crate) block: NodeIndex,
}

impl InstData {
    pub fn new(opcode: OpCode, ty: Type, operands: &[Value]) -> Self {
        InstData {
            opcode,
            ty,
            operands: SmallVec::from_slice(operands),
            incoming: SmallVec::new(),
            block: NodeIndex::end(),
        }
    }

    /// Block this instruction currently lives in.
    pub fn block(&self) -> NodeIndex {
        self.block
    }

    pub fn is_phi(&self) -> bool {
        self.opcode.is_phi()
    }

    pub fn may_read_memory(&self) -> bool {
        self.opcode.may_read_memory()
    }

    pub fn may_write_memory(&self) -> bool {
        self.opcode.may_write_memory()
    }

    pub fn has_side_effects(&self) -> bool {
        self.opcode.has_side_effects()
    }

    /// Incoming value contributed by `pred`, on a phi.
    pub fn incoming_for(&self, pred: NodeIndex) -> Option<Value> {
        self.incoming
            .iter()
            .position(|it| *it == pred)
            .map(|pos| self.operands[pos])
    }
}
