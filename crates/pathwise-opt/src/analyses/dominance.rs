use std::collections::HashMap;

use pathwise_ir::NodeIndex;
use petgraph::algo::dominators;

use crate::{OptUnit, analyses::Analysis};

/// Dominator tree over the reachable part of the control-flow graph.
///
/// Children lists are kept sorted by node index, so tree walks visit
/// blocks in a stable order regardless of hash-map iteration.
pub struct Dominators {
    root: NodeIndex,
    idoms: HashMap<NodeIndex, NodeIndex>,
    children: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl Analysis for Dominators {
    fn init(unit: &mut OptUnit<'_>) -> Self {
        let doms = dominators::simple_fast(unit.func.graph(), unit.func.entry());
        let root = unit.func.entry();
        let mut idoms = HashMap::new();
        let mut children: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for node in unit.func.node_ids() {
            if node == root {
                continue;
            }
            if let Some(idom) = doms.immediate_dominator(node) {
                idoms.insert(node, idom);
                children.entry(idom).or_default().push(node);
            }
        }
        for list in children.values_mut() {
            list.sort();
        }
        Dominators {
            root,
            idoms,
            children,
        }
    }
}

impl Dominators {
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Whether `block` is reachable from the entry.
    pub fn is_reachable(&self, block: NodeIndex) -> bool {
        block == self.root || self.idoms.contains_key(&block)
    }

    pub fn immediate_dominator(&self, block: NodeIndex) -> Option<NodeIndex> {
        self.idoms.get(&block).copied()
    }

    /// Whether `a` dominates `b`. Every block dominates itself.
    pub fn dominates(&self, a: NodeIndex, b: NodeIndex) -> bool {
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            match self.immediate_dominator(current) {
                Some(idom) => current = idom,
                None => return false,
            }
        }
    }

    pub fn strictly_dominates(&self, a: NodeIndex, b: NodeIndex) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Reachable blocks in dominator-tree preorder.
    pub fn pre_order(&self) -> Vec<NodeIndex> {
        self.subtree(self.root)
    }

    /// Blocks dominated by `block`, itself included, in preorder.
    pub fn dominated_by(&self, block: NodeIndex) -> Vec<NodeIndex> {
        self.subtree(block)
    }

    fn subtree(&self, from: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            order.push(node);
            if let Some(children) = self.children.get(&node) {
                stack.extend(children.iter().rev());
            }
        }
        order
    }
}
