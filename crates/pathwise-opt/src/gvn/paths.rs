use std::collections::{HashMap, HashSet, VecDeque};

use pathwise_ir::{Function, NodeIndex, ProfileInfo};

/// A chain of blocks with the profile weight of every traversed edge.
/// `weights[i]` belongs to the `blocks[i] -> blocks[i + 1]` edge.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub blocks: Vec<NodeIndex>,
    pub weights: Vec<f64>,
}

impl GraphPath {
    pub(crate) fn single(block: NodeIndex) -> Self {
        GraphPath {
            blocks: vec![block],
            weights: Vec::new(),
        }
    }

    /// Frequency of the whole path: its weakest edge. A single-block path
    /// traverses no edge and has no frequency.
    pub fn frequency(&self) -> Option<f64> {
        self.weights.iter().copied().reduce(f64::min)
    }

    pub fn first(&self) -> NodeIndex {
        self.blocks[0]
    }

    pub fn last(&self) -> NodeIndex {
        self.blocks[self.blocks.len() - 1]
    }

    pub fn position(&self, block: NodeIndex) -> Option<usize> {
        self.blocks.iter().position(|it| *it == block)
    }

    pub(crate) fn extended(&self, block: NodeIndex, weight: f64) -> GraphPath {
        let mut next = self.clone();
        next.blocks.push(block);
        next.weights.push(weight);
        next
    }

    /// Suffix starting at position `from`.
    pub(crate) fn suffix(&self, from: usize) -> GraphPath {
        GraphPath {
            blocks: self.blocks[from..].to_vec(),
            weights: self.weights[from..].to_vec(),
        }
    }

    /// Prefix ending at position `until`, inclusive.
    pub(crate) fn prefix(&self, until: usize) -> GraphPath {
        GraphPath {
            blocks: self.blocks[..=until].to_vec(),
            weights: self.weights[..until].to_vec(),
        }
    }
}

/// Profile-weighted paths through a function, enumerated once per
/// partial-redundancy round.
///
/// Enumeration starts a path at the entry and extends it only through
/// blocks with a single predecessor, so every path is the unique
/// jump-free chain leading to its last block. Blocks with several
/// predecessors start no chain and appear on no path; the availability
/// analysis deliberately sees a coarse view around joins. All suffixes of
/// the chains are materialized so anticipability can be read off
/// directly, and the total profile mass entering each reachable block is
/// recorded along the way.
pub struct ProfiledPaths {
    from_entry: Vec<GraphPath>,
    tails: Vec<GraphPath>,
    in_mass: HashMap<NodeIndex, f64>,
    truncated: bool,
}

impl ProfiledPaths {
    pub fn build(func: &Function, profile: &ProfileInfo, max_paths: usize) -> Self {
        let mut from_entry: Vec<GraphPath> = Vec::new();
        let mut in_mass = HashMap::new();
        let mut truncated = false;

        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        queue.push_back(func.entry());
        visited.insert(func.entry());
        while let Some(block) = queue.pop_front() {
            let preds = func.predecessors(block);
            let mass: f64 = preds
                .iter()
                .map(|pred| profile.edge_weight(*pred, block))
                .sum();
            in_mass.insert(block, mass);

            if block == func.entry() {
                from_entry.push(GraphPath::single(block));
            } else if let [pred] = preds.as_slice() {
                let weight = profile.edge_weight(*pred, block);
                let mut extended = Vec::new();
                for path in from_entry.iter().filter(|path| path.last() == *pred) {
                    if from_entry.len() + extended.len() >= max_paths {
                        truncated = true;
                        break;
                    }
                    extended.push(path.extended(block, weight));
                }
                from_entry.extend(extended);
            }

            for succ in func.successors(block) {
                if visited.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }
        if truncated {
            log::warn!(
                "path enumeration for {} stopped at {max_paths} paths; speculation sees a partial view",
                func.name()
            );
        }

        let mut tails = Vec::new();
        let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
        for path in &from_entry {
            for start in 0..path.blocks.len() {
                let tail = path.suffix(start);
                if seen.insert(tail.blocks.clone()) {
                    tails.push(tail);
                }
            }
        }

        ProfiledPaths {
            from_entry,
            tails,
            in_mass,
            truncated,
        }
    }

    /// Chains from the entry, in discovery order.
    pub fn entry_paths(&self) -> &[GraphPath] {
        &self.from_entry
    }

    /// All distinct suffixes of the entry chains.
    pub fn tails(&self) -> &[GraphPath] {
        &self.tails
    }

    /// Entry chains that run through `block`.
    pub fn entry_paths_through(&self, block: NodeIndex) -> impl Iterator<Item = &GraphPath> {
        self.from_entry
            .iter()
            .filter(move |path| path.position(block).is_some())
    }

    /// Suffixes that start at `block`.
    pub fn tails_from(&self, block: NodeIndex) -> impl Iterator<Item = &GraphPath> {
        self.tails.iter().filter(move |path| path.first() == block)
    }

    /// Total profile weight entering `block`. Zero for the entry and for
    /// blocks outside the profile.
    pub fn in_mass(&self, block: NodeIndex) -> f64 {
        self.in_mass.get(&block).copied().unwrap_or(0.0)
    }

    /// Whether `block` may be the evaluation point for speculation. The
    /// cost model divides by the incoming mass, so zero-mass blocks are
    /// out of bounds.
    pub fn has_mass(&self, block: NodeIndex) -> bool {
        self.in_mass(block) > 0.0
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}
