use pathwise_ir::NodeIndex;

use crate::gvn::avail::Availability;
use crate::gvn::paths::{GraphPath, ProfiledPaths};

/// Frequency of one prefix/suffix pair: the weakest edge across both.
/// Pairs that traverse no edge at all carry no mass.
fn pair_frequency(prefix: &GraphPath, tail: &GraphPath) -> f64 {
    prefix
        .weights
        .iter()
        .chain(tail.weights.iter())
        .copied()
        .reduce(f64::min)
        .unwrap_or(0.0)
}

/// Profile mass spent if the value is computed speculatively: every way
/// of arriving without it and leaving without needing it.
pub fn cost(sets: &Availability) -> f64 {
    let mut total = 0.0;
    for prefix in &sets.unavailable {
        for tail in &sets.unanticipable {
            total += pair_frequency(prefix, tail);
        }
    }
    total
}

/// Profile mass saved: every way of arriving with the value in hand and
/// leaving through a use of it.
pub fn benefit(sets: &Availability) -> f64 {
    let mut total = 0.0;
    for prefix in &sets.available {
        for tail in &sets.anticipable {
            total += pair_frequency(prefix, tail);
        }
    }
    total
}

/// Decide whether hoisting pays off for an occurrence in `block`, by
/// comparing cost and benefit normalized to the profile mass entering the
/// block. Callers must check [`ProfiledPaths::has_mass`] first; asking
/// about a block with no incoming mass is a caller bug.
#[track_caller]
pub fn enable_spec(paths: &ProfiledPaths, sets: &Availability, block: NodeIndex) -> bool {
    let mass = paths.in_mass(block);
    assert!(
        mass > 0.0,
        "cost/benefit requested for bb{} with no incoming profile mass",
        block.index()
    );
    let prob_cost = cost(sets) / mass;
    let prob_benefit = benefit(sets) / mass;
    log::trace!(
        "enable_spec bb{}: cost {prob_cost:.4} benefit {prob_benefit:.4}",
        block.index()
    );
    prob_cost < prob_benefit
}

#[cfg(test)]
mod test {
    use pathwise_ir::{Function, FunctionBuilder, InstId, OpCode, ProfileInfo, Type, Value};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::gvn::avail::classify;

    /// Entry branches to a hot block computing a sum and a cold block
    /// that does not, both meeting at a join.
    fn hot_cold(hot_weight: f64) -> (Function, ProfileInfo, InstId, NodeIndex) {
        let mut builder = FunctionBuilder::new("hot-cold", &[Type::Bool, Type::I32]);
        let entry = builder.current();
        let hot = builder.create_block();
        let cold = builder.create_block();
        let join = builder.create_block();
        builder.cond_br(builder.arg(0), hot, cold);
        builder.switch_to(hot);
        let sum = builder.binary(OpCode::Add, Type::I32, builder.arg(1), Value::from(1i64));
        builder.br(join);
        builder.switch_to(cold);
        builder.br(join);
        builder.switch_to(join);
        builder.ret(None);
        let func = builder.finish();

        let mut profile = ProfileInfo::new();
        profile.set_edge_weight(entry, hot, hot_weight);
        profile.set_edge_weight(entry, cold, 1.0);
        profile.set_edge_weight(hot, join, hot_weight);
        profile.set_edge_weight(cold, join, 1.0);
        (func, profile, sum.as_inst().unwrap(), hot)
    }

    #[test]
    fn hot_occurrence_is_approved() {
        let (func, profile, sum, hot) = hot_cold(100.0);
        let paths = ProfiledPaths::build(&func, &profile, 128);
        let sets = classify(&func, &paths, sum);

        assert_eq!(benefit(&sets), 100.0);
        assert_eq!(cost(&sets), 0.0);
        assert!(enable_spec(&paths, &sets, hot));
    }

    #[test]
    fn pair_frequency_is_the_weakest_edge() {
        let a = NodeIndex::new(0);
        let b = NodeIndex::new(1);
        let c = NodeIndex::new(2);
        let prefix = GraphPath::single(a).extended(b, 7.0);
        let tail = GraphPath::single(b).extended(c, 3.0);
        assert_eq!(pair_frequency(&prefix, &tail), 3.0);
        assert_eq!(pair_frequency(&GraphPath::single(a), &GraphPath::single(a)), 0.0);
    }

    #[test]
    #[should_panic(expected = "no incoming profile mass")]
    fn zero_mass_block_is_rejected_loudly() {
        let (func, profile, sum, _) = hot_cold(100.0);
        let paths = ProfiledPaths::build(&func, &profile, 128);
        let sets = classify(&func, &paths, sum);
        enable_spec(&paths, &sets, func.entry());
    }

    #[test]
    fn verdict_is_deterministic() {
        let (func, profile, sum, hot) = hot_cold(100.0);
        let paths = ProfiledPaths::build(&func, &profile, 128);
        let sets = classify(&func, &paths, sum);
        let first = enable_spec(&paths, &sets, hot);
        for _ in 0..8 {
            assert_eq!(enable_spec(&paths, &sets, hot), first);
        }
    }
}
