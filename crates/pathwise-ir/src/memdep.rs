use crate::{Function, InstId, OpCode, Value};

/// Answer to "where does this memory read get its value from".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemDep {
    /// The read is satisfied by this instruction: a prior load of the same
    /// location, or the store that wrote it.
    Def(InstId),
    /// This instruction may overwrite the location before the read.
    Clobber(InstId),
    /// No dependency inside the reader's block; the value flows in from a
    /// predecessor.
    NonLocal,
    /// The oracle has no information.
    Unknown,
}

/// Memory-dependence oracle supplied by the host compiler.
///
/// Queried for loads and read-only calls. `Def` answers are trusted: when
/// the oracle says a read is satisfied by a congruent earlier read, the two
/// may be merged.
pub trait MemDepOracle {
    fn dependency(&self, func: &Function, inst: InstId) -> MemDep;
}

/// Oracle that claims no knowledge. Every query answers
/// [`MemDep::Unknown`], which keeps all memory reads distinct.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoMemDep;

impl MemDepOracle for NoMemDep {
    fn dependency(&self, _func: &Function, _inst: InstId) -> MemDep {
        MemDep::Unknown
    }
}

/// Oracle that scans backwards through the reading instruction's own block,
/// matching locations by exact pointer value identity. Distinct pointer
/// values are treated as possible aliases.
#[derive(Default, Debug, Clone, Copy)]
pub struct BlockLocalMemDep;

impl BlockLocalMemDep {
    fn load_dependency(&self, func: &Function, inst: InstId, ptr: Value) -> MemDep {
        for prior in Self::preceding(func, inst) {
            let data = func.inst(prior);
            match data.opcode {
                OpCode::Load if data.operands[0] == ptr => return MemDep::Def(prior),
                OpCode::Store if data.operands[0] == ptr => return MemDep::Def(prior),
                _ if data.may_write_memory() => return MemDep::Clobber(prior),
                _ => {}
            }
        }
        MemDep::NonLocal
    }

    fn call_dependency(&self, func: &Function, inst: InstId) -> MemDep {
        let data = func.inst(inst);
        for prior in Self::preceding(func, inst) {
            let prior_data = func.inst(prior);
            if prior_data.opcode == data.opcode && prior_data.operands == data.operands {
                return MemDep::Def(prior);
            }
            if prior_data.may_write_memory() {
                return MemDep::Clobber(prior);
            }
        }
        MemDep::NonLocal
    }

    /// Body instructions before `inst` in its block, nearest first.
    fn preceding(func: &Function, inst: InstId) -> impl Iterator<Item = InstId> + '_ {
        let block = func.inst(inst).block();
        let ops = &func.block(block).ops;
        let pos = ops
            .iter()
            .position(|it| *it == inst)
            .expect("instruction not in its block");
        ops[..pos].iter().rev().copied()
    }
}

impl MemDepOracle for BlockLocalMemDep {
    fn dependency(&self, func: &Function, inst: InstId) -> MemDep {
        let data = func.inst(inst);
        match data.opcode {
            OpCode::Load => self.load_dependency(func, inst, data.operands[0]),
            OpCode::Call(_) if data.may_read_memory() => self.call_dependency(func, inst),
            _ => MemDep::Unknown,
        }
    }
}
