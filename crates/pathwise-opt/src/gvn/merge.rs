use pathwise_ir::{NodeIndex, Terminator};

use crate::OptUnit;

/// Fold every block that unconditionally falls through into its sole
/// successor, provided that successor has no other way in. Shrinking the
/// graph first gives the numbering walks fewer blocks and longer
/// straight-line stretches to work with.
pub(crate) fn merge_blocks(unit: &mut OptUnit<'_>) -> usize {
    let mut merged = 0;
    while let Some((block, succ)) = find_candidate(unit) {
        unit.profile.merge_into(succ, block);
        unit.func.merge_blocks(block, succ);
        merged += 1;
    }
    merged
}

fn find_candidate(unit: &OptUnit<'_>) -> Option<(NodeIndex, NodeIndex)> {
    let func = &*unit.func;
    for block in func.node_ids() {
        let Terminator::Br { dest } = func.block(block).terminator else {
            continue;
        };
        if dest == block
            || dest == func.entry()
            || func.predecessors(dest).len() != 1
            || !func.block(dest).phis.is_empty()
            || func.is_landing_pad(dest)
        {
            continue;
        }
        return Some((block, dest));
    }
    None
}

#[cfg(test)]
mod test {
    use pathwise_ir::{FunctionBuilder, NoMemDep, OpCode, ProfileInfo, Type, Value};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn a_fall_through_chain_collapses_to_one_block() {
        let mut builder = FunctionBuilder::new("chain", &[Type::I32]);
        let entry = builder.current();
        let sum = builder.binary(OpCode::Add, Type::I32, builder.arg(0), Value::from(1i64));
        let second = builder.create_block();
        let third = builder.create_block();
        builder.br(second);
        builder.switch_to(second);
        let shifted = builder.binary(OpCode::Shl, Type::I32, sum, Value::from(1i64));
        builder.br(third);
        builder.switch_to(third);
        builder.ret(Some(shifted));
        let mut func = builder.finish();

        let mut profile = ProfileInfo::new();
        profile.set_edge_weight(entry, second, 10.0);
        profile.set_edge_weight(second, third, 10.0);
        profile.set_block_count(second, 10.0);
        profile.set_block_count(third, 10.0);

        let merged = {
            let mut unit = OptUnit::new(&mut func, &mut profile, &NoMemDep);
            merge_blocks(&mut unit)
        };

        assert_eq!(merged, 2);
        assert_eq!(func.num_blocks(), 1);
        assert_eq!(
            func.inst_ids(entry),
            vec![sum.as_inst().unwrap(), shifted.as_inst().unwrap()]
        );
        assert_eq!(func.inst(shifted.as_inst().unwrap()).block(), entry);
        assert_eq!(profile.edge_weight(entry, second), 0.0);
        assert_eq!(profile.execution_count(second), None);
        assert!(func.verify().is_ok());
    }

    #[test]
    fn join_blocks_are_left_alone() {
        let mut builder = FunctionBuilder::new("diamond", &[Type::Bool]);
        let left = builder.create_block();
        let right = builder.create_block();
        let join = builder.create_block();
        builder.cond_br(builder.arg(0), left, right);
        builder.switch_to(left);
        builder.br(join);
        builder.switch_to(right);
        builder.br(join);
        builder.switch_to(join);
        builder.ret(None);
        let mut func = builder.finish();
        let mut profile = ProfileInfo::new();

        let merged = {
            let mut unit = OptUnit::new(&mut func, &mut profile, &NoMemDep);
            merge_blocks(&mut unit)
        };

        assert_eq!(merged, 0);
        assert_eq!(func.num_blocks(), 4);
    }

    #[test]
    fn phi_bearing_successors_are_left_alone() {
        let mut builder = FunctionBuilder::new("phi", &[Type::I32]);
        let entry = builder.current();
        let next = builder.create_block();
        builder.br(next);
        builder.switch_to(next);
        let merged_val = builder.phi(Type::I32, &[(builder.arg(0), entry)]);
        builder.ret(Some(merged_val));
        let mut func = builder.finish();
        let mut profile = ProfileInfo::new();

        let merged = {
            let mut unit = OptUnit::new(&mut func, &mut profile, &NoMemDep);
            merge_blocks(&mut unit)
        };

        assert_eq!(merged, 0);
        assert_eq!(func.num_blocks(), 2);
    }

    #[test]
    fn landing_pads_are_left_alone() {
        let mut builder = FunctionBuilder::new("pad", &[]);
        let pad = builder.create_block();
        builder.br(pad);
        builder.switch_to(pad);
        builder.push(OpCode::LandingPad, Type::Aggregate, &[]);
        builder.ret(None);
        let mut func = builder.finish();
        let mut profile = ProfileInfo::new();

        let merged = {
            let mut unit = OptUnit::new(&mut func, &mut profile, &NoMemDep);
            merge_blocks(&mut unit)
        };

        assert_eq!(merged, 0);
        assert_eq!(func.num_blocks(), 2);
    }
}
