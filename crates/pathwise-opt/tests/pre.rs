use pathwise_ir::{
    CallEffects, FuncRef, FunctionBuilder, NoMemDep, OpCode, ProfileInfo, Terminator, Type, Value,
};
use pathwise_opt::GvnPrePass;
use pretty_assertions::assert_eq;

#[test_log::test]
fn hot_value_is_completed_through_the_cold_arm() {
    let mut builder = FunctionBuilder::new("complete", &[Type::Bool, Type::I32, Type::I32]);
    let entry = builder.current();
    let hot = builder.create_block();
    let cold = builder.create_block();
    let join = builder.create_block();
    builder.cond_br(builder.arg(0), hot, cold);
    builder.switch_to(hot);
    let first = builder.binary(OpCode::Add, Type::I32, builder.arg(1), builder.arg(2));
    builder.br(join);
    builder.switch_to(cold);
    builder.br(join);
    builder.switch_to(join);
    let again = builder.binary(OpCode::Add, Type::I32, builder.arg(1), builder.arg(2));
    builder.ret(Some(again));
    let mut func = builder.finish();

    let mut profile = ProfileInfo::new();
    profile.set_edge_weight(entry, hot, 100.0);
    profile.set_edge_weight(entry, cold, 10.0);
    profile.set_edge_weight(hot, join, 100.0);
    profile.set_edge_weight(cold, join, 10.0);

    let mut pass = GvnPrePass::new();
    let changed = pass.run(&mut func, &mut profile, &NoMemDep);

    assert!(changed);
    assert!(func.verify().is_ok());
    assert_eq!(pass.stats().hoisted, 1);
    assert_eq!(pass.stats().phis_inserted, 1);
    assert_eq!(pass.stats().edges_split, 0);
    assert_eq!(pass.stats().eliminated, 0);

    // the clone landed in the cold arm
    let cold_ops = func.inst_ids(cold);
    assert_eq!(cold_ops.len(), 1);
    let clone = func.inst(cold_ops[0]);
    assert_eq!(clone.opcode, OpCode::Add);
    assert_eq!(clone.operands.as_slice(), &[Value::Arg(1), Value::Arg(2)]);

    // the join computes nothing anymore; the phi merges both arms
    assert!(func.inst_ids(join).is_empty());
    let phis = func.phi_ids(join);
    assert_eq!(phis.len(), 1);
    let phi = phis[0];
    assert_eq!(func.inst(phi).incoming_for(hot), Some(first));
    assert_eq!(
        func.inst(phi).incoming_for(cold),
        Some(Value::Inst(cold_ops[0]))
    );
    assert_eq!(
        func.block(join).terminator,
        Terminator::Ret {
            value: Some(Value::Inst(phi))
        }
    );
}

#[test_log::test]
fn unresolvable_operand_aborts_the_site_untouched() {
    let mut builder = FunctionBuilder::new("abort", &[Type::Bool]);
    let entry = builder.current();
    let left = builder.create_block();
    let right = builder.create_block();
    let join = builder.create_block();
    // the call result has no leader anywhere, so the clone cannot name it
    let fetched = builder.call(CallEffects::Unknown, Type::I32, FuncRef(0), &[]);
    builder.cond_br(builder.arg(0), left, right);
    builder.switch_to(left);
    builder.binary(OpCode::Add, Type::I32, fetched, Value::from(1i64));
    builder.br(join);
    builder.switch_to(right);
    builder.br(join);
    builder.switch_to(join);
    let again = builder.binary(OpCode::Add, Type::I32, fetched, Value::from(1i64));
    builder.ret(Some(again));
    let mut func = builder.finish();

    let mut profile = ProfileInfo::new();
    profile.set_edge_weight(entry, left, 5.0);
    profile.set_edge_weight(entry, right, 95.0);
    profile.set_edge_weight(left, join, 5.0);
    profile.set_edge_weight(right, join, 95.0);

    let mut pass = GvnPrePass::new();
    let changed = pass.run(&mut func, &mut profile, &NoMemDep);

    assert!(!changed);
    assert_eq!(pass.stats().total(), 0);
    assert!(func.inst_ids(right).is_empty());
    assert_eq!(func.inst_ids(join).len(), 1);
    assert!(func.phi_ids(join).is_empty());
}

#[test_log::test]
fn an_upstream_operand_leaves_no_profitable_pair() {
    let mut builder = FunctionBuilder::new("stale", &[Type::Bool, Type::I32]);
    let entry = builder.current();
    let left = builder.create_block();
    let right = builder.create_block();
    let join = builder.create_block();
    // the leader's operand is born en route, so no prefix carries the value
    let base = builder.binary(OpCode::Mul, Type::I32, builder.arg(1), Value::from(3i64));
    builder.cond_br(builder.arg(0), left, right);
    builder.switch_to(left);
    builder.binary(OpCode::Add, Type::I32, base, Value::from(7i64));
    builder.br(join);
    builder.switch_to(right);
    builder.br(join);
    builder.switch_to(join);
    let again = builder.binary(OpCode::Add, Type::I32, base, Value::from(7i64));
    builder.ret(Some(again));
    let mut func = builder.finish();

    let mut profile = ProfileInfo::new();
    profile.set_edge_weight(entry, left, 100.0);
    profile.set_edge_weight(entry, right, 10.0);
    profile.set_edge_weight(left, join, 100.0);
    profile.set_edge_weight(right, join, 10.0);

    let mut pass = GvnPrePass::new();
    let changed = pass.run(&mut func, &mut profile, &NoMemDep);

    assert!(!changed);
    assert_eq!(pass.stats().hoisted, 0);
    assert_eq!(func.inst_ids(join).len(), 1);
    assert!(func.phi_ids(join).is_empty());
}

#[test_log::test]
fn unprofiled_functions_never_speculate() {
    let mut builder = FunctionBuilder::new("blind", &[Type::Bool, Type::I32, Type::I32]);
    let hot = builder.create_block();
    let cold = builder.create_block();
    let join = builder.create_block();
    builder.cond_br(builder.arg(0), hot, cold);
    builder.switch_to(hot);
    builder.binary(OpCode::Add, Type::I32, builder.arg(1), builder.arg(2));
    builder.br(join);
    builder.switch_to(cold);
    builder.br(join);
    builder.switch_to(join);
    let again = builder.binary(OpCode::Add, Type::I32, builder.arg(1), builder.arg(2));
    builder.ret(Some(again));
    let mut func = builder.finish();
    let mut profile = ProfileInfo::new();

    let mut pass = GvnPrePass::new();
    let changed = pass.run(&mut func, &mut profile, &NoMemDep);

    assert!(!changed);
    assert_eq!(pass.stats().hoisted, 0);
    assert!(func.inst_ids(cold).is_empty());
    assert_eq!(func.inst_ids(join).len(), 1);
}

#[test_log::test]
fn critical_edges_are_split_and_the_hoist_retried() {
    let mut builder = FunctionBuilder::new("split", &[Type::Bool, Type::I32]);
    let entry = builder.current();
    let left = builder.create_block();
    let join = builder.create_block();
    // entry -> join is critical: entry branches out, join merges in
    builder.cond_br(builder.arg(0), left, join);
    builder.switch_to(left);
    let first = builder.binary(OpCode::Add, Type::I32, builder.arg(1), Value::from(1i64));
    builder.br(join);
    builder.switch_to(join);
    let again = builder.binary(OpCode::Add, Type::I32, builder.arg(1), Value::from(1i64));
    builder.ret(Some(again));
    let mut func = builder.finish();

    let mut profile = ProfileInfo::new();
    profile.set_edge_weight(entry, left, 10.0);
    profile.set_edge_weight(left, join, 10.0);
    profile.set_edge_weight(entry, join, 90.0);

    let mut pass = GvnPrePass::new();
    let changed = pass.run(&mut func, &mut profile, &NoMemDep);

    assert!(changed);
    assert!(func.verify().is_ok());
    assert_eq!(pass.stats().edges_split, 1);
    assert_eq!(pass.stats().hoisted, 1);
    assert_eq!(pass.stats().phis_inserted, 1);
    assert_eq!(func.num_blocks(), 4);

    // the fresh block took over the edge and its weight, and now
    // carries the clone
    let mid = func
        .successors(entry)
        .into_iter()
        .find(|block| *block != left)
        .unwrap();
    assert_eq!(func.successors(mid), vec![join]);
    assert_eq!(profile.edge_weight(entry, mid), 90.0);
    assert_eq!(profile.edge_weight(mid, join), 90.0);
    assert_eq!(profile.edge_weight(entry, join), 0.0);
    let mid_ops = func.inst_ids(mid);
    assert_eq!(mid_ops.len(), 1);
    assert_eq!(func.inst(mid_ops[0]).opcode, OpCode::Add);

    assert!(func.inst_ids(join).is_empty());
    let phi = func.phi_ids(join)[0];
    assert_eq!(func.inst(phi).incoming_for(left), Some(first));
    assert_eq!(
        func.inst(phi).incoming_for(mid),
        Some(Value::Inst(mid_ops[0]))
    );
}

#[test_log::test]
fn landing_pad_joins_are_left_alone() {
    let mut builder = FunctionBuilder::new("pad", &[Type::Bool, Type::I32]);
    let entry = builder.current();
    let hot = builder.create_block();
    let cold = builder.create_block();
    let join = builder.create_block();
    builder.cond_br(builder.arg(0), hot, cold);
    builder.switch_to(hot);
    builder.binary(OpCode::Add, Type::I32, builder.arg(1), Value::from(1i64));
    builder.br(join);
    builder.switch_to(cold);
    builder.br(join);
    builder.switch_to(join);
    builder.push(OpCode::LandingPad, Type::Aggregate, &[]);
    let again = builder.binary(OpCode::Add, Type::I32, builder.arg(1), Value::from(1i64));
    builder.ret(Some(again));
    let mut func = builder.finish();

    let mut profile = ProfileInfo::new();
    profile.set_edge_weight(entry, hot, 100.0);
    profile.set_edge_weight(entry, cold, 10.0);
    profile.set_edge_weight(hot, join, 100.0);
    profile.set_edge_weight(cold, join, 10.0);

    let mut pass = GvnPrePass::new();
    let changed = pass.run(&mut func, &mut profile, &NoMemDep);

    assert!(!changed);
    assert_eq!(pass.stats().hoisted, 0);
    assert!(func.inst_ids(cold).is_empty());
    assert!(func.phi_ids(join).is_empty());
    assert_eq!(func.inst_ids(join).len(), 2);
}

#[test_log::test]
fn indirect_edges_are_never_split() {
    let mut builder = FunctionBuilder::new("indirect", &[Type::Ptr, Type::I32]);
    let entry = builder.current();
    let left = builder.create_block();
    let join = builder.create_block();
    builder.indirect_br(builder.arg(0), &[left, join]);
    builder.switch_to(left);
    builder.binary(OpCode::Add, Type::I32, builder.arg(1), Value::from(1i64));
    builder.br(join);
    builder.switch_to(join);
    let again = builder.binary(OpCode::Add, Type::I32, builder.arg(1), Value::from(1i64));
    builder.ret(Some(again));
    let mut func = builder.finish();

    let mut profile = ProfileInfo::new();
    profile.set_edge_weight(entry, left, 50.0);
    profile.set_edge_weight(left, join, 50.0);
    profile.set_edge_weight(entry, join, 50.0);

    let mut pass = GvnPrePass::new();
    let changed = pass.run(&mut func, &mut profile, &NoMemDep);

    assert!(!changed);
    assert_eq!(pass.stats().edges_split, 0);
    assert_eq!(pass.stats().hoisted, 0);
    assert_eq!(func.num_blocks(), 3);
    assert_eq!(func.inst_ids(join).len(), 1);
}

#[test_log::test]
fn memory_reads_stay_where_they_are() {
    let mut builder = FunctionBuilder::new("loads", &[Type::Bool, Type::Ptr]);
    let entry = builder.current();
    let hot = builder.create_block();
    let cold = builder.create_block();
    let join = builder.create_block();
    builder.cond_br(builder.arg(0), hot, cold);
    builder.switch_to(hot);
    builder.load(Type::I32, builder.arg(1));
    builder.br(join);
    builder.switch_to(cold);
    builder.br(join);
    builder.switch_to(join);
    let again = builder.load(Type::I32, builder.arg(1));
    builder.ret(Some(again));
    let mut func = builder.finish();

    let mut profile = ProfileInfo::new();
    profile.set_edge_weight(entry, hot, 100.0);
    profile.set_edge_weight(entry, cold, 10.0);
    profile.set_edge_weight(hot, join, 100.0);
    profile.set_edge_weight(cold, join, 10.0);

    let mut pass = GvnPrePass::new();
    pass.run(&mut func, &mut profile, &NoMemDep);

    assert_eq!(pass.stats().hoisted, 0);
    assert!(func.inst_ids(cold).is_empty());
    assert_eq!(func.inst_ids(join).len(), 1);
    assert!(func.phi_ids(join).is_empty());
    assert_eq!(func.inst_ids(hot).len(), 1);
}
