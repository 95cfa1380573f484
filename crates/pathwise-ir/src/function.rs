use std::collections::HashSet;

use petgraph::{Direction, graph::NodeIndex, prelude::StableDiGraph, visit::EdgeRef};
use stable_vec::StableVec;

use crate::{BasicBlock, InstData, InstId, OpCode, Terminator, Type, Value};

/// A function in SSA form: a control-flow graph of [`BasicBlock`]s over a
/// shared instruction arena.
///
/// Blocks are graph nodes; arena ids stay stable across unrelated
/// insertions and erasures, so passes may hold ids while they mutate the
/// function. Every structural edit goes through this API, which keeps the
/// graph edges consistent with the block terminators.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    params: Vec<Type>,
    graph: StableDiGraph<BasicBlock, ()>,
    insts: StableVec<InstData>,
    entry: NodeIndex,
}

impl Function {
    /// Create a function with an empty entry block.
    pub fn new(name: impl Into<String>, params: &[Type]) -> Self {
        let mut graph = StableDiGraph::default();
        let entry = graph.add_node(BasicBlock::default());
        Function {
            name: name.into(),
            params: params.to_vec(),
            graph,
            insts: StableVec::new(),
            entry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Type] {
        &self.params
    }

    pub fn entry(&self) -> NodeIndex {
        self.entry
    }

    /// Read-only view of the control-flow graph, for analyses.
    pub fn graph(&self) -> &StableDiGraph<BasicBlock, ()> {
        &self.graph
    }

    pub fn node_ids(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    pub fn num_blocks(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_insts(&self) -> usize {
        self.insts.num_elements()
    }

    #[track_caller]
    pub fn block(&self, block: NodeIndex) -> &BasicBlock {
        self.graph.node_weight(block).expect("block not in graph")
    }

    #[track_caller]
    pub fn block_mut(&mut self, block: NodeIndex) -> &mut BasicBlock {
        self.graph.node_weight_mut(block).expect("block not in graph")
    }

    #[track_caller]
    pub fn inst(&self, id: InstId) -> &InstData {
        self.insts.get(id).expect("instruction was erased")
    }

    #[track_caller]
    pub fn inst_mut(&mut self, id: InstId) -> &mut InstData {
        self.insts.get_mut(id).expect("instruction was erased")
    }

    pub fn contains_inst(&self, id: InstId) -> bool {
        self.insts.has_element_at(id)
    }

    pub fn predecessors(&self, block: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(block, Direction::Incoming)
            .collect()
    }

    pub fn successors(&self, block: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(block, Direction::Outgoing)
            .collect()
    }

    /// Snapshot of `block`'s body ids, safe to iterate while erasing.
    pub fn inst_ids(&self, block: NodeIndex) -> Vec<InstId> {
        self.block(block).ops.clone()
    }

    /// Snapshot of `block`'s phi ids.
    pub fn phi_ids(&self, block: NodeIndex) -> Vec<InstId> {
        self.block(block).phis.clone()
    }

    /// Whether `block` starts with a landing pad and must stay untouched by
    /// block-level transforms.
    pub fn is_landing_pad(&self, block: NodeIndex) -> bool {
        self.block(block)
            .ops
            .first()
            .is_some_and(|id| self.inst(*id).opcode == OpCode::LandingPad)
    }

    pub fn create_block(&mut self) -> NodeIndex {
        self.graph.add_node(BasicBlock::default())
    }

    /// Install `terminator` on `block` and bring the graph edges in line
    /// with its targets. Parallel branches to the same block collapse into
    /// one edge.
    pub fn set_terminator(&mut self, block: NodeIndex, terminator: Terminator) {
        let stale: Vec<_> = self
            .graph
            .edges_directed(block, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();
        for edge in stale {
            self.graph.remove_edge(edge);
        }
        for target in terminator.targets() {
            self.graph.add_edge(block, target, ());
        }
        self.graph[block].terminator = terminator;
    }

    /// Append an instruction to `block`'s body, in the slot just before the
    /// terminator.
    pub fn push_inst(&mut self, block: NodeIndex, mut data: InstData) -> InstId {
        assert!(!data.is_phi(), "phis go through create_phi");
        data.block = block;
        let id = self.insts.push(data);
        self.graph[block].ops.push(id);
        id
    }

    /// Insert an instruction into `at`'s block, directly before `at`.
    #[track_caller]
    pub fn insert_before(&mut self, at: InstId, mut data: InstData) -> InstId {
        assert!(!data.is_phi(), "phis go through create_phi");
        let block = self.inst(at).block;
        data.block = block;
        let id = self.insts.push(data);
        let ops = &mut self.graph[block].ops;
        let pos = ops
            .iter()
            .position(|it| *it == at)
            .expect("instruction not in its block");
        ops.insert(pos, id);
        id
    }

    /// Create an empty phi at the head of `block`. Incoming values are
    /// filled in with [`Function::add_incoming`].
    pub fn create_phi(&mut self, block: NodeIndex, ty: Type) -> InstId {
        let mut data = InstData::new(OpCode::Phi, ty, &[]);
        data.block = block;
        let id = self.insts.push(data);
        self.graph[block].phis.push(id);
        id
    }

    #[track_caller]
    pub fn add_incoming(&mut self, phi: InstId, value: Value, pred: NodeIndex) {
        let inst = self.inst_mut(phi);
        assert!(inst.is_phi(), "add_incoming on a non-phi");
        inst.operands.push(value);
        inst.incoming.push(pred);
    }

    /// Copy of `id`'s data, detached from any block. The caller re-attaches
    /// it with [`Function::push_inst`] or [`Function::insert_before`].
    pub fn clone_inst(&self, id: InstId) -> InstData {
        let mut data = self.inst(id).clone();
        data.block = NodeIndex::end();
        data
    }

    /// Number of places `value` occurs as an operand, phi input or
    /// terminator operand.
    pub fn use_count(&self, value: Value) -> usize {
        let mut count = 0;
        for inst in self.insts.values() {
            count += inst.operands.iter().filter(|op| **op == value).count();
        }
        for node in self.graph.node_indices() {
            if self.graph[node].terminator.operand() == Some(&value) {
                count += 1;
            }
        }
        count
    }

    /// Rewrite every use of `old`'s result to `new`, across the whole
    /// function. Returns the number of rewritten uses.
    pub fn replace_all_uses(&mut self, old: InstId, new: Value) -> usize {
        let old = Value::Inst(old);
        debug_assert!(old != new);
        let mut count = 0;
        let ids: Vec<_> = self.insts.indices().collect();
        for id in ids {
            for op in self.insts[id].operands.iter_mut() {
                if *op == old {
                    *op = new;
                    count += 1;
                }
            }
        }
        for node in self.node_ids() {
            if let Some(op) = self.graph[node].terminator.operand_mut() {
                if *op == old {
                    *op = new;
                    count += 1;
                }
            }
        }
        count
    }

    /// Rewrite uses of `old` to `new`, restricted to `region`. A use inside
    /// a phi belongs to the edge it flows in over, so it is rewritten when
    /// the incoming block is in the region, wherever the phi itself lives.
    pub fn replace_uses_in(
        &mut self,
        region: &HashSet<NodeIndex>,
        old: Value,
        new: Value,
    ) -> usize {
        if old == new {
            return 0;
        }
        let mut count = 0;
        for node in self.node_ids() {
            for phi in self.graph[node].phis.clone() {
                let inst = &mut self.insts[phi];
                for (pos, op) in inst.operands.iter_mut().enumerate() {
                    if *op == old && region.contains(&inst.incoming[pos]) {
                        *op = new;
                        count += 1;
                    }
                }
            }
            if !region.contains(&node) {
                continue;
            }
            for id in self.graph[node].ops.clone() {
                for op in self.insts[id].operands.iter_mut() {
                    if *op == old {
                        *op = new;
                        count += 1;
                    }
                }
            }
            if let Some(op) = self.graph[node].terminator.operand_mut() {
                if *op == old {
                    *op = new;
                    count += 1;
                }
            }
        }
        count
    }

    /// Remove `id` from its block and from the arena. The instruction must
    /// have no remaining uses.
    #[track_caller]
    pub fn erase(&mut self, id: InstId) {
        let uses = self.use_count(Value::Inst(id));
        assert!(uses == 0, "erasing %{id} which still has {uses} uses");
        let inst = self.insts.remove(id).expect("instruction was erased");
        let block = &mut self.graph[inst.block];
        let list = if inst.opcode.is_phi() {
            &mut block.phis
        } else {
            &mut block.ops
        };
        let pos = list
            .iter()
            .position(|it| *it == id)
            .expect("instruction not in its block");
        list.remove(pos);
    }

    /// Split the `from -> to` edge by routing it through a fresh block that
    /// jumps straight to `to`. Phis in `to` are retargeted to the new
    /// block. Returns the new block.
    #[track_caller]
    pub fn split_critical_edge(&mut self, from: NodeIndex, to: NodeIndex) -> NodeIndex {
        let edge = self
            .graph
            .find_edge(from, to)
            .expect("splitting an edge that is not in the graph");
        self.graph.remove_edge(edge);

        let mid = self.graph.add_node(BasicBlock::default());
        self.set_terminator(mid, Terminator::Br { dest: to });
        self.graph.add_edge(from, mid, ());
        self.graph[from].terminator.retarget(to, mid);

        for phi in self.phi_ids(to) {
            let inst = &mut self.insts[phi];
            for pred in inst.incoming.iter_mut() {
                if *pred == from {
                    *pred = mid;
                }
            }
        }
        log::trace!(
            "split edge bb{} -> bb{} through bb{}",
            from.index(),
            to.index(),
            mid.index()
        );
        mid
    }

    /// Fold `succ` into `block`. `block` must be `succ`'s only predecessor
    /// and `succ` its only successor target; `succ` must carry no phis.
    #[track_caller]
    pub fn merge_blocks(&mut self, block: NodeIndex, succ: NodeIndex) {
        assert!(succ != self.entry, "merging the entry block");
        assert!(
            self.predecessors(succ) == vec![block],
            "merge target has other predecessors"
        );
        assert!(
            self.block(block).terminator.targets().as_slice() == [succ],
            "merge source has other successors"
        );
        assert!(self.block(succ).phis.is_empty(), "merge target carries phis");

        let moved = std::mem::take(&mut self.graph[succ].ops);
        for id in &moved {
            self.insts[*id].block = block;
        }
        self.graph[block].ops.extend(moved);

        let terminator = std::mem::take(&mut self.graph[succ].terminator);
        for target in terminator.targets() {
            for phi in self.phi_ids(target) {
                let inst = &mut self.insts[phi];
                for pred in inst.incoming.iter_mut() {
                    if *pred == succ {
                        *pred = block;
                    }
                }
            }
        }
        self.set_terminator(block, terminator);
        self.graph.remove_node(succ);
        log::trace!("merged bb{} into bb{}", succ.index(), block.index());
    }
}
