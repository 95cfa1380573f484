use std::collections::HashSet;

use pathwise_ir::{Function, InstId, NodeIndex};

use crate::gvn::paths::{GraphPath, ProfiledPaths};

/// Path classification around one occurrence of a value.
///
/// Prefixes end at the occurrence's block; suffixes start there. A prefix
/// is available when none of the occurrence's operands is defined
/// strictly before the block on it, so the value could have been carried
/// the whole way. A suffix is anticipable when no operand is redefined
/// strictly after the block, so computing the value early stays correct
/// along it. Memory reads are never anticipable; their value can change
/// under any block on the suffix.
#[derive(Debug, Default)]
pub struct Availability {
    pub available: Vec<GraphPath>,
    pub unavailable: Vec<GraphPath>,
    pub anticipable: Vec<GraphPath>,
    pub unanticipable: Vec<GraphPath>,
}

/// Classify every enumerated path around `inst`'s block. Rebuilt per
/// occurrence; the sets borrow nothing so the caller can keep mutating
/// the function between classifications.
pub fn classify(func: &Function, paths: &ProfiledPaths, inst: InstId) -> Availability {
    let data = func.inst(inst);
    let block = data.block();
    let operand_defs: Vec<NodeIndex> = data
        .operands
        .iter()
        .filter_map(|op| op.as_inst())
        .map(|id| func.inst(id).block())
        .collect();
    let reads_memory = data.may_read_memory();

    let mut sets = Availability::default();
    let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
    for path in paths.entry_paths_through(block) {
        let Some(pos) = path.position(block) else {
            continue;
        };
        let prefix = path.prefix(pos);
        if !seen.insert(prefix.blocks.clone()) {
            continue;
        }
        let killed = prefix.blocks[..pos]
            .iter()
            .any(|it| operand_defs.contains(it));
        if killed {
            sets.unavailable.push(prefix);
        } else {
            sets.available.push(prefix);
        }
    }

    for tail in paths.tails_from(block) {
        let killed = reads_memory
            || tail.blocks[1..]
                .iter()
                .any(|it| operand_defs.contains(it));
        if killed {
            sets.unanticipable.push(tail.clone());
        } else {
            sets.anticipable.push(tail.clone());
        }
    }
    sets
}

#[cfg(test)]
mod test {
    use pathwise_ir::{FunctionBuilder, OpCode, ProfileInfo, Type, Value};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn clean_chain_is_available_and_anticipable() {
        let mut builder = FunctionBuilder::new("chain", &[Type::I32]);
        let entry = builder.current();
        let mid = builder.create_block();
        builder.br(mid);
        builder.switch_to(mid);
        let sum = builder.binary(OpCode::Add, Type::I32, builder.arg(0), Value::from(1i64));
        builder.ret(Some(sum));
        let func = builder.finish();

        let mut profile = ProfileInfo::new();
        profile.set_edge_weight(entry, mid, 10.0);
        let paths = ProfiledPaths::build(&func, &profile, 128);

        let sets = classify(&func, &paths, sum.as_inst().unwrap());
        assert_eq!(sets.available.len(), 1);
        assert_eq!(sets.available[0].blocks, vec![entry, mid]);
        assert!(sets.unavailable.is_empty());
        assert_eq!(sets.anticipable.len(), 1);
        assert_eq!(sets.anticipable[0].blocks, vec![mid]);
        assert!(sets.unanticipable.is_empty());
    }

    #[test]
    fn operand_defined_on_the_prefix_kills_availability() {
        let mut builder = FunctionBuilder::new("killed", &[Type::I32]);
        let entry = builder.current();
        let mid = builder.create_block();
        let last = builder.create_block();
        builder.br(mid);
        builder.switch_to(mid);
        let base = builder.binary(OpCode::Mul, Type::I32, builder.arg(0), Value::from(3i64));
        builder.br(last);
        builder.switch_to(last);
        let user = builder.binary(OpCode::Add, Type::I32, base, Value::from(1i64));
        builder.ret(Some(user));
        let func = builder.finish();

        let mut profile = ProfileInfo::new();
        profile.set_edge_weight(entry, mid, 5.0);
        profile.set_edge_weight(mid, last, 5.0);
        let paths = ProfiledPaths::build(&func, &profile, 128);

        // `base` is born in `mid`, strictly before `user`'s block
        let sets = classify(&func, &paths, user.as_inst().unwrap());
        assert!(sets.available.is_empty());
        assert_eq!(sets.unavailable.len(), 1);
        assert_eq!(sets.unavailable[0].blocks, vec![entry, mid, last]);
        // nothing redefines the operand after `last`
        assert_eq!(sets.anticipable.len(), 1);

        // the producer itself, sitting in `mid`, is available on its
        // prefix since its own operands live at the entry
        let base_sets = classify(&func, &paths, base.as_inst().unwrap());
        assert_eq!(base_sets.available.len(), 1);
        assert!(base_sets.unavailable.is_empty());
    }

    #[test]
    fn memory_reads_are_never_anticipable() {
        let mut builder = FunctionBuilder::new("loads", &[Type::Ptr]);
        let entry = builder.current();
        let mid = builder.create_block();
        builder.br(mid);
        builder.switch_to(mid);
        let load = builder.load(Type::I32, builder.arg(0));
        builder.ret(Some(load));
        let func = builder.finish();

        let mut profile = ProfileInfo::new();
        profile.set_edge_weight(entry, mid, 8.0);
        let paths = ProfiledPaths::build(&func, &profile, 128);

        let sets = classify(&func, &paths, load.as_inst().unwrap());
        assert!(sets.anticipable.is_empty());
        assert_eq!(sets.unanticipable.len(), 1);
        assert_eq!(sets.available.len(), 1);
    }

    #[test]
    fn join_blocks_sit_on_no_path() {
        let mut builder = FunctionBuilder::new("join", &[Type::Bool, Type::I32]);
        let left = builder.create_block();
        let right = builder.create_block();
        let join = builder.create_block();
        builder.cond_br(builder.arg(0), left, right);
        builder.switch_to(left);
        builder.br(join);
        builder.switch_to(right);
        builder.br(join);
        builder.switch_to(join);
        let sum = builder.binary(OpCode::Add, Type::I32, builder.arg(1), Value::from(1i64));
        builder.ret(Some(sum));
        let func = builder.finish();

        let paths = ProfiledPaths::build(&func, &ProfileInfo::new(), 128);
        let sets = classify(&func, &paths, sum.as_inst().unwrap());
        assert!(sets.available.is_empty());
        assert!(sets.unavailable.is_empty());
        assert!(sets.anticipable.is_empty());
        assert!(sets.unanticipable.is_empty());
    }
}
