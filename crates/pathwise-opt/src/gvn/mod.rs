//! Value numbering with profile-guided partial redundancy elimination.
//!
//! [`GvnPrePass`] is the entry point; the submodules carry the machinery:
//! congruence numbering, dominance-scoped leader lookup, path
//! enumeration, availability classification and the speculation verdict.

use pathwise_ir::{Function, InstId, MemDepOracle, NodeIndex, ProfileInfo, Type, Value};
use smallvec::SmallVec;

use crate::OptUnit;
use crate::analyses::Dominators;

mod avail;
mod equality;
mod leaders;
mod merge;
mod paths;
mod simplify;
mod speculate;
mod value_table;

pub use avail::{Availability, classify};
pub use leaders::{LeaderEntry, LeaderTable};
pub use paths::{GraphPath, ProfiledPaths};
pub use speculate::{benefit, cost, enable_spec};
pub use value_table::{Expression, ValueTable};

/// Outcome counters of one [`GvnPrePass::run`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Instructions reduced to an existing value by local simplification.
    pub folded: usize,
    /// Instructions dropped for a dominating congruent leader.
    pub eliminated: usize,
    /// Operand uses rewritten from branch-implied equalities.
    pub equalities: usize,
    /// Redundant occurrences completed by hoisting into a predecessor.
    pub hoisted: usize,
    /// Phis created to merge hoisted values at joins.
    pub phis_inserted: usize,
    /// Fall-through blocks folded into their predecessor.
    pub blocks_merged: usize,
    /// Critical edges split to make room for a hoist.
    pub edges_split: usize,
}

impl Stats {
    /// Count of changes that rewrote the function in some way.
    pub fn total(&self) -> usize {
        self.folded
            + self.eliminated
            + self.equalities
            + self.hoisted
            + self.blocks_merged
            + self.edges_split
    }
}

/// Tuning knobs for [`GvnPrePass`].
#[derive(Debug, Clone)]
pub struct GvnPreOpts {
    /// Run the partial redundancy phase after the elimination fixpoint.
    pub enable_pre: bool,
    /// Path enumeration cap. Beyond it the path set is truncated and the
    /// speculation verdicts get more conservative.
    pub max_paths: usize,
}

impl Default for GvnPreOpts {
    fn default() -> Self {
        GvnPreOpts {
            enable_pre: true,
            max_paths: 4096,
        }
    }
}

/// Redundancy elimination over one function, in four phases.
///
/// 1. Fall-through block merging, to shorten the graph.
/// 2. A fixpoint of dominator-order numbering: simplify, drop
///    instructions with a dominating congruent leader and push
///    branch-implied equalities into the guarded subtrees.
/// 3. Partial redundancy elimination at joins: an occurrence whose value
///    already flows in along all predecessors but one is completed by
///    cloning it into that predecessor and merging through a fresh phi,
///    when the profile says the speculation pays off. Critical edges are
///    split on demand to create the insertion point.
/// 4. A final table reset so no stale ids outlive the run.
///
/// The pass owns its tables so a caller can keep one instance and run it
/// over many functions.
pub struct GvnPrePass {
    opts: GvnPreOpts,
    values: ValueTable,
    leaders: LeaderTable,
    stats: Stats,
}

impl Default for GvnPrePass {
    fn default() -> Self {
        Self::new()
    }
}

impl GvnPrePass {
    pub fn new() -> Self {
        Self::with_opts(GvnPreOpts::default())
    }

    pub fn with_opts(opts: GvnPreOpts) -> Self {
        GvnPrePass {
            opts,
            values: ValueTable::new(),
            leaders: LeaderTable::new(),
            stats: Stats::default(),
        }
    }

    /// Counters of the most recent [`run`](Self::run).
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Optimize `func` in place. Returns whether anything changed.
    pub fn run(
        &mut self,
        func: &mut Function,
        profile: &mut ProfileInfo,
        memdep: &dyn MemDepOracle,
    ) -> bool {
        self.stats = Stats::default();
        let mut unit = OptUnit::new(func, profile, memdep);
        log::debug!("gvn: running on {}", unit.func.name());

        self.stats.blocks_merged = merge::merge_blocks(&mut unit);
        if self.stats.blocks_merged > 0 {
            unit.invalidate_structure();
        }

        loop {
            self.values.clear();
            self.leaders.clear();
            if self.number_and_eliminate(&mut unit) == 0 {
                break;
            }
        }

        if self.opts.enable_pre {
            self.perform_pre(&mut unit);
        }

        self.values.clear();
        self.leaders.clear();
        log::debug!("gvn: {} done, {:?}", unit.func.name(), self.stats);
        self.stats.total() > 0
    }

    /// One dominator-preorder numbering round. Returns how many changes
    /// it made; a zero round means the fixpoint is reached.
    fn number_and_eliminate(&mut self, unit: &mut OptUnit<'_>) -> usize {
        let doms = unit.analysis::<Dominators>();
        let mut changed = 0;
        for block in doms.pre_order() {
            for phi in unit.func.phi_ids(block) {
                if let Some(replacement) = simplify::simplify(unit.func, phi) {
                    changed += self.replace_with(unit, phi, replacement, block);
                    continue;
                }
                let num = self
                    .values
                    .lookup_or_add(unit.func, unit.memdep, &Value::Inst(phi));
                self.leaders.add(num, Value::Inst(phi), block);
            }

            let mut index = 0;
            loop {
                let ops = &unit.func.block(block).ops;
                let Some(&id) = ops.get(index) else { break };
                let inst = unit.func.inst(id);
                if inst.has_side_effects() || inst.ty.is_void() || inst.ty == Type::Aggregate {
                    index += 1;
                    continue;
                }
                if let Some(replacement) = simplify::simplify(unit.func, id) {
                    changed += self.replace_with(unit, id, replacement, block);
                    continue;
                }
                let num = self
                    .values
                    .lookup_or_add(unit.func, unit.memdep, &Value::Inst(id));
                if let Some(leader) = self.leaders.find_leader(&doms, num, block) {
                    unit.func.replace_all_uses(id, leader);
                    self.values.erase(&Value::Inst(id));
                    unit.func.erase(id);
                    self.stats.eliminated += 1;
                    changed += 1;
                    continue;
                }
                self.leaders.add(num, Value::Inst(id), block);
                index += 1;
            }

            let rewrites =
                equality::propagate(unit.func, &self.values, &self.leaders, &doms, block);
            self.stats.equalities += rewrites;
            changed += rewrites;
        }
        changed
    }

    /// Swap a simplified instruction for `replacement` and leave the
    /// replacement behind as the leader of the instruction's class, so
    /// congruent occurrences downstream collapse onto it directly.
    fn replace_with(
        &mut self,
        unit: &mut OptUnit<'_>,
        id: InstId,
        replacement: Value,
        block: NodeIndex,
    ) -> usize {
        let num = self
            .values
            .lookup_or_add(unit.func, unit.memdep, &Value::Inst(id));
        self.leaders.add(num, replacement, block);
        unit.func.replace_all_uses(id, replacement);
        self.values.erase(&Value::Inst(id));
        unit.func.erase(id);
        self.stats.folded += 1;
        1
    }

    /// Partial redundancy phase: renumber everything once, enumerate
    /// profiled paths, then sweep the join blocks until no hoist or edge
    /// split remains.
    fn perform_pre(&mut self, unit: &mut OptUnit<'_>) {
        self.values.clear();
        self.leaders.clear();
        self.renumber(unit);
        let mut paths = ProfiledPaths::build(unit.func, unit.profile, self.opts.max_paths);
        loop {
            let mut split_queue = Vec::new();
            let hoisted = self.pre_sweep(unit, &paths, &mut split_queue);

            let mut split = 0;
            for (pred, join) in split_queue {
                if !unit.func.successors(pred).contains(&join)
                    || unit.func.successors(pred).len() < 2
                    || unit.func.predecessors(join).len() < 2
                {
                    continue;
                }
                let mid = unit.func.split_critical_edge(pred, join);
                unit.profile.split_edge(pred, join, mid);
                self.stats.edges_split += 1;
                split += 1;
            }
            if split > 0 {
                unit.invalidate_structure();
                paths = ProfiledPaths::build(unit.func, unit.profile, self.opts.max_paths);
            }
            if hoisted == 0 && split == 0 {
                break;
            }
        }
    }

    /// Number every phi and candidate without eliminating anything, so
    /// the sweep sees a complete leader table.
    fn renumber(&mut self, unit: &mut OptUnit<'_>) {
        let doms = unit.analysis::<Dominators>();
        for block in doms.pre_order() {
            for phi in unit.func.phi_ids(block) {
                let num = self
                    .values
                    .lookup_or_add(unit.func, unit.memdep, &Value::Inst(phi));
                self.leaders.add(num, Value::Inst(phi), block);
            }
            for id in unit.func.inst_ids(block) {
                let inst = unit.func.inst(id);
                if inst.has_side_effects() || inst.ty.is_void() || inst.ty == Type::Aggregate {
                    continue;
                }
                let num = self
                    .values
                    .lookup_or_add(unit.func, unit.memdep, &Value::Inst(id));
                self.leaders.add(num, Value::Inst(id), block);
            }
        }
    }

    /// Visit every join and try to complete partially redundant
    /// occurrences. Sites needing an edge split are queued instead of
    /// mutated. Returns the number of hoists performed.
    fn pre_sweep(
        &mut self,
        unit: &mut OptUnit<'_>,
        paths: &ProfiledPaths,
        split_queue: &mut Vec<(NodeIndex, NodeIndex)>,
    ) -> usize {
        let doms = unit.analysis::<Dominators>();
        let mut hoisted = 0;
        for block in doms.pre_order() {
            let preds = unit.func.predecessors(block);
            if preds.len() < 2
                || block == unit.func.entry()
                || unit.func.is_landing_pad(block)
                || preds.contains(&block)
            {
                continue;
            }
            for id in unit.func.inst_ids(block) {
                if !unit.func.contains_inst(id) {
                    continue;
                }
                let inst = unit.func.inst(id);
                if inst.has_side_effects()
                    || inst.ty.is_void()
                    || inst.ty == Type::Aggregate
                    || inst.may_read_memory()
                {
                    continue;
                }
                let num = self
                    .values
                    .lookup(&Value::Inst(id))
                    .expect("instruction numbered during renumbering");

                let mut available: Vec<(NodeIndex, Value)> = Vec::new();
                let mut missing: SmallVec<[NodeIndex; 2]> = SmallVec::new();
                let mut blocked = false;
                for &pred in &preds {
                    if !doms.is_reachable(pred) {
                        blocked = true;
                        break;
                    }
                    match self.leaders.find_leader(&doms, num, pred) {
                        Some(leader) if leader == Value::Inst(id) => {
                            blocked = true;
                            break;
                        }
                        Some(leader) => available.push((pred, leader)),
                        None => missing.push(pred),
                    }
                }
                if blocked || missing.len() != 1 {
                    continue;
                }
                let miss = missing[0];
                if unit.func.block(miss).terminator.is_indirect() {
                    continue;
                }
                if unit.func.successors(miss).len() > 1 {
                    split_queue.push((miss, block));
                    continue;
                }

                let Some(operands) = self.translate_operands(unit, &doms, id, miss) else {
                    continue;
                };

                // The speculation verdict is taken where the value
                // already exists: at the defining block of the first
                // instruction leader. Constant and argument leaders cost
                // nothing to keep alive, so they need no verdict.
                let gate = available
                    .iter()
                    .find_map(|(_, leader)| leader.as_inst())
                    .map(|lead| (lead, unit.func.inst(lead).block()));
                if let Some((lead, lead_bb)) = gate {
                    if !paths.has_mass(lead_bb) {
                        continue;
                    }
                    let sets = classify(unit.func, paths, lead);
                    if !enable_spec(paths, &sets, lead_bb) {
                        continue;
                    }
                }

                let mut clone = unit.func.clone_inst(id);
                clone.operands = operands;
                let ty = clone.ty;
                let new_id = unit.func.push_inst(miss, clone);
                let new_num =
                    self.values
                        .lookup_or_add(unit.func, unit.memdep, &Value::Inst(new_id));
                debug_assert_eq!(new_num, num);
                self.leaders.add(num, Value::Inst(new_id), miss);
                log::trace!(
                    "pre: hoisted %{id} into bb{} as %{new_id}, phi at bb{}",
                    miss.index(),
                    block.index()
                );

                let phi = unit.func.create_phi(block, ty);
                for &pred in &preds {
                    if pred == miss {
                        unit.func.add_incoming(phi, Value::Inst(new_id), pred);
                        continue;
                    }
                    let incoming = available
                        .iter()
                        .find(|(source, _)| *source == pred)
                        .map(|(_, leader)| *leader)
                        .expect("predecessor was classified available");
                    unit.func.add_incoming(phi, incoming, pred);
                }
                self.values.insert(Value::Inst(phi), num);
                self.leaders.add(num, Value::Inst(phi), block);
                self.leaders.remove(num, Value::Inst(id), block);
                unit.func.replace_all_uses(id, Value::Inst(phi));
                self.values.erase(&Value::Inst(id));
                unit.func.erase(id);
                self.stats.hoisted += 1;
                self.stats.phis_inserted += 1;
                hoisted += 1;
            }
        }
        hoisted
    }

    /// Rewrite `id`'s operands through the leaders visible at `target`.
    /// Fails when an operand's class has no leader there, which means the
    /// clone could not be materialized soundly.
    fn translate_operands(
        &self,
        unit: &OptUnit<'_>,
        doms: &Dominators,
        id: InstId,
        target: NodeIndex,
    ) -> Option<SmallVec<[Value; 2]>> {
        let mut translated = SmallVec::new();
        for &operand in &unit.func.inst(id).operands {
            if operand.is_global() {
                translated.push(operand);
                continue;
            }
            let num = self.values.lookup(&operand)?;
            translated.push(self.leaders.find_leader(doms, num, target)?);
        }
        Some(translated)
    }
}
