use std::collections::HashMap;

use petgraph::graph::NodeIndex;

/// Execution-frequency data the host profiler collected for one function.
///
/// Counts are estimates. Blocks and edges the profiler never saw simply
/// have no entry; edge weights read as zero in that case, and passes treat
/// zero-mass blocks as unprofitable rather than dividing by the missing
/// frequency.
#[derive(Default, Debug, Clone)]
pub struct ProfileInfo {
    block_counts: HashMap<NodeIndex, f64>,
    edge_weights: HashMap<(NodeIndex, NodeIndex), f64>,
}

impl ProfileInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block_count(&mut self, block: NodeIndex, count: f64) {
        self.block_counts.insert(block, count);
    }

    pub fn set_edge_weight(&mut self, from: NodeIndex, to: NodeIndex, weight: f64) {
        self.edge_weights.insert((from, to), weight);
    }

    /// Execution count recorded for `block`, if any.
    pub fn execution_count(&self, block: NodeIndex) -> Option<f64> {
        self.block_counts.get(&block).copied()
    }

    /// Weight of the `from -> to` edge. Unprofiled edges read as zero.
    pub fn edge_weight(&self, from: NodeIndex, to: NodeIndex) -> f64 {
        self.edge_weights.get(&(from, to)).copied().unwrap_or(0.0)
    }

    /// Account for a `from -> to` edge that now routes through `mid`: both
    /// halves inherit the original weight, and `mid` executes exactly as
    /// often as the edge did.
    pub fn split_edge(&mut self, from: NodeIndex, to: NodeIndex, mid: NodeIndex) {
        if let Some(weight) = self.edge_weights.remove(&(from, to)) {
            self.edge_weights.insert((from, mid), weight);
            self.edge_weights.insert((mid, to), weight);
            self.block_counts.insert(mid, weight);
        }
    }

    /// Account for `from` being folded into `into`: outgoing edge weights
    /// move to `into` and `from`'s own count disappears.
    pub fn merge_into(&mut self, from: NodeIndex, into: NodeIndex) {
        let moved: Vec<_> = self
            .edge_weights
            .keys()
            .filter(|(src, _)| *src == from)
            .copied()
            .collect();
        for (src, dst) in moved {
            if let Some(weight) = self.edge_weights.remove(&(src, dst)) {
                self.edge_weights.insert((into, dst), weight);
            }
        }
        self.edge_weights.remove(&(into, from));
        self.block_counts.remove(&from);
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn split_edge_moves_weight_through_the_middle_block() {
        let (a, b, mid) = (NodeIndex::new(0), NodeIndex::new(1), NodeIndex::new(2));
        let mut profile = ProfileInfo::new();
        profile.set_edge_weight(a, b, 40.0);

        profile.split_edge(a, b, mid);
        assert_eq!(profile.edge_weight(a, b), 0.0);
        assert_eq!(profile.edge_weight(a, mid), 40.0);
        assert_eq!(profile.edge_weight(mid, b), 40.0);
        assert_eq!(profile.execution_count(mid), Some(40.0));
    }

    #[test]
    fn merge_moves_outgoing_weights() {
        let (a, b, c) = (NodeIndex::new(0), NodeIndex::new(1), NodeIndex::new(2));
        let mut profile = ProfileInfo::new();
        profile.set_edge_weight(a, b, 10.0);
        profile.set_edge_weight(b, c, 10.0);
        profile.set_block_count(b, 10.0);

        profile.merge_into(b, a);
        assert_eq!(profile.edge_weight(a, c), 10.0);
        assert_eq!(profile.edge_weight(a, b), 0.0);
        assert_eq!(profile.execution_count(b), None);
    }
}
