use std::collections::{HashSet, VecDeque};

use pathwise_ir::{Constant, Function, NodeIndex, OpCode, Predicate, Terminator, Value};

use crate::analyses::Dominators;
use crate::gvn::leaders::LeaderTable;
use crate::gvn::value_table::{Expression, ValueTable};

/// Push facts learned from `block`'s terminator into the regions its edges
/// guard, and rewrite uses there. A conditional branch proves its condition
/// true on the taken edge and false on the other; a switch proves its
/// scrutinee equal to the matched case. Facts only hold where the guarded
/// edge is the sole way in, so each target must have a single predecessor,
/// and rewrites stay inside the target's dominator subtree.
///
/// Returns the number of uses rewritten.
pub(crate) fn propagate(
    func: &mut Function,
    values: &ValueTable,
    leaders: &LeaderTable,
    doms: &Dominators,
    block: NodeIndex,
) -> usize {
    let mut seeds: Vec<(NodeIndex, Value, Value)> = Vec::new();
    match &func.block(block).terminator {
        Terminator::CondBr {
            cond,
            then_dest,
            else_dest,
        } if then_dest != else_dest => {
            seeds.push((*then_dest, *cond, Value::from(true)));
            seeds.push((*else_dest, *cond, Value::from(false)));
        }
        Terminator::Switch {
            value,
            default,
            cases,
        } => {
            for (case, dest) in cases {
                // A target reached by several cases, or doubling as the
                // default, pins the scrutinee to no single constant.
                let unique =
                    dest != default && cases.iter().filter(|entry| entry.1 == *dest).count() == 1;
                if unique {
                    seeds.push((*dest, *value, Value::from(*case)));
                }
            }
        }
        _ => {}
    }

    let mut rewritten = 0;
    for (target, lhs, rhs) in seeds {
        if lhs.is_constant() || func.predecessors(target).len() != 1 {
            continue;
        }
        let region: HashSet<NodeIndex> = doms.dominated_by(target).into_iter().collect();

        let mut worklist = VecDeque::new();
        let mut seen = HashSet::new();
        worklist.push_back((lhs, rhs));
        while let Some((old, new)) = worklist.pop_front() {
            if old == new || !seen.insert((old, new)) {
                continue;
            }
            rewritten += func.replace_uses_in(&region, old, new);
            expand(func, values, leaders, old, new, &mut worklist);
        }
    }
    rewritten
}

/// Derive further equalities from a proven one. Knowing a boolean
/// instruction's value pins down its operands for `and`, `or`, `not` and
/// comparisons, and settles every member of the inverted comparison's
/// congruence class.
fn expand(
    func: &Function,
    values: &ValueTable,
    leaders: &LeaderTable,
    lhs: Value,
    rhs: Value,
    worklist: &mut VecDeque<(Value, Value)>,
) {
    let Value::Inst(id) = lhs else {
        return;
    };
    let Some(Constant::Bool(truth)) = rhs.as_const() else {
        return;
    };
    let inst = func.inst(id);
    match inst.opcode {
        OpCode::And if truth => {
            worklist.push_back((inst.operands[0], Value::from(true)));
            worklist.push_back((inst.operands[1], Value::from(true)));
        }
        OpCode::Or if !truth => {
            worklist.push_back((inst.operands[0], Value::from(false)));
            worklist.push_back((inst.operands[1], Value::from(false)));
        }
        OpCode::Not => {
            worklist.push_back((inst.operands[0], Value::from(!truth)));
        }
        OpCode::Cmp(pred) => {
            let holds = if truth { pred } else { pred.inverse() };
            if holds == Predicate::Eq {
                push_operand_equality(values, inst.operands[0], inst.operands[1], worklist);
            }
            // Whatever this comparison settled to, its inverse settled to
            // the opposite, and so did every congruent computation of it.
            if let (Some(first), Some(second)) = (
                values.lookup(&inst.operands[0]),
                values.lookup(&inst.operands[1]),
            ) {
                let inverted = Expression::new(
                    OpCode::Cmp(pred.inverse()),
                    inst.ty,
                    smallvec::smallvec![first, second],
                );
                if let Some(class) = values.lookup_expression(&inverted) {
                    for entry in leaders.entries(class) {
                        worklist.push_back((entry.value, Value::from(!truth)));
                    }
                }
            }
        }
        _ => {}
    }
}

/// `a == b` held: pick a replacement direction. A constant side replaces
/// the other outright; otherwise the member of the older congruence class
/// stands in for the newer one.
fn push_operand_equality(
    values: &ValueTable,
    a: Value,
    b: Value,
    worklist: &mut VecDeque<(Value, Value)>,
) {
    if a.is_constant() {
        worklist.push_back((b, a));
        return;
    }
    if b.is_constant() {
        worklist.push_back((a, b));
        return;
    }
    let (Some(a_num), Some(b_num)) = (values.lookup(&a), values.lookup(&b)) else {
        return;
    };
    if a_num < b_num {
        worklist.push_back((b, a));
    } else if b_num < a_num {
        worklist.push_back((a, b));
    }
}
