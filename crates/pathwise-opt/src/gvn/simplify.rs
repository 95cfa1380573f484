use std::cmp::Ordering;

use float_ord::FloatOrd;
use pathwise_ir::{Constant, Function, InstData, InstId, OpCode, Predicate, Type, Value};

/// Reduce `id` to an existing value when its result is already decided.
/// Constant operands fold, algebraic identities collapse, a select with a
/// known condition picks a side and a phi whose incomings agree disappears.
/// Integer arithmetic wraps. Division by a constant zero is left in place
/// so the trap survives, and float comparisons stay put whenever NaN could
/// be involved.
pub(crate) fn simplify(func: &Function, id: InstId) -> Option<Value> {
    let inst = func.inst(id);
    if inst.is_phi() {
        return trivial_phi(inst, id);
    }
    match inst.opcode {
        OpCode::Neg | OpCode::Not => fold_unary(inst),
        OpCode::Cmp(pred) => simplify_cmp(func, inst, pred),
        OpCode::Select => simplify_select(inst),
        OpCode::Add
        | OpCode::Sub
        | OpCode::Mul
        | OpCode::Div
        | OpCode::Rem
        | OpCode::And
        | OpCode::Or
        | OpCode::Xor
        | OpCode::Shl
        | OpCode::Shr => {
            let lhs = inst.operands[0];
            let rhs = inst.operands[1];
            if let (Some(l), Some(r)) = (lhs.as_const(), rhs.as_const()) {
                if let Some(folded) = fold_binary(inst.opcode, l, r) {
                    return Some(Value::from(folded));
                }
            }
            binary_identity(inst.opcode, inst.ty, lhs, rhs)
        }
        _ => None,
    }
}

/// A phi is redundant when every incoming that is not the phi itself is
/// the same value.
fn trivial_phi(inst: &InstData, id: InstId) -> Option<Value> {
    let mut unique = None;
    for &incoming in &inst.operands {
        if incoming == Value::Inst(id) {
            continue;
        }
        match unique {
            None => unique = Some(incoming),
            Some(seen) if seen == incoming => {}
            Some(_) => return None,
        }
    }
    unique
}

fn fold_unary(inst: &InstData) -> Option<Value> {
    let operand = inst.operands[0].as_const()?;
    let folded = match (inst.opcode, operand) {
        (OpCode::Neg, Constant::Int(val)) => Constant::Int(val.wrapping_neg()),
        (OpCode::Neg, Constant::Float(val)) => Constant::Float(FloatOrd(-val.0)),
        (OpCode::Not, Constant::Bool(val)) => Constant::Bool(!val),
        (OpCode::Not, Constant::Int(val)) => Constant::Int(!val),
        _ => return None,
    };
    Some(Value::from(folded))
}

fn fold_binary(opcode: OpCode, l: Constant, r: Constant) -> Option<Constant> {
    use Constant::{Bool, Float, Int};
    let folded = match (opcode, l, r) {
        (OpCode::Add, Int(a), Int(b)) => Int(a.wrapping_add(b)),
        (OpCode::Sub, Int(a), Int(b)) => Int(a.wrapping_sub(b)),
        (OpCode::Mul, Int(a), Int(b)) => Int(a.wrapping_mul(b)),
        (OpCode::Div, Int(a), Int(b)) => Int(a.checked_div(b)?),
        (OpCode::Rem, Int(a), Int(b)) => Int(a.checked_rem(b)?),
        (OpCode::And, Int(a), Int(b)) => Int(a & b),
        (OpCode::Or, Int(a), Int(b)) => Int(a | b),
        (OpCode::Xor, Int(a), Int(b)) => Int(a ^ b),
        (OpCode::Shl, Int(a), Int(b)) if (0..64).contains(&b) => Int(a.wrapping_shl(b as u32)),
        (OpCode::Shr, Int(a), Int(b)) if (0..64).contains(&b) => Int(a.wrapping_shr(b as u32)),
        (OpCode::Add, Float(a), Float(b)) => Float(FloatOrd(a.0 + b.0)),
        (OpCode::Sub, Float(a), Float(b)) => Float(FloatOrd(a.0 - b.0)),
        (OpCode::Mul, Float(a), Float(b)) => Float(FloatOrd(a.0 * b.0)),
        (OpCode::Div, Float(a), Float(b)) => Float(FloatOrd(a.0 / b.0)),
        (OpCode::Rem, Float(a), Float(b)) => Float(FloatOrd(a.0 % b.0)),
        (OpCode::And, Bool(a), Bool(b)) => Bool(a && b),
        (OpCode::Or, Bool(a), Bool(b)) => Bool(a || b),
        (OpCode::Xor, Bool(a), Bool(b)) => Bool(a != b),
        _ => return None,
    };
    Some(folded)
}

fn binary_identity(opcode: OpCode, ty: Type, lhs: Value, rhs: Value) -> Option<Value> {
    if ty.is_int() {
        int_identity(opcode, lhs, rhs)
    } else if ty.is_bool() {
        bool_identity(opcode, lhs, rhs)
    } else {
        None
    }
}

fn int_identity(opcode: OpCode, lhs: Value, rhs: Value) -> Option<Value> {
    let zero = |value: Value| int_const(value) == Some(0);
    let one = |value: Value| int_const(value) == Some(1);
    match opcode {
        OpCode::Add if zero(rhs) => Some(lhs),
        OpCode::Add if zero(lhs) => Some(rhs),
        OpCode::Sub if zero(rhs) => Some(lhs),
        OpCode::Sub if lhs == rhs => Some(Value::from(0i64)),
        OpCode::Mul if one(rhs) => Some(lhs),
        OpCode::Mul if one(lhs) => Some(rhs),
        OpCode::Mul if zero(lhs) || zero(rhs) => Some(Value::from(0i64)),
        OpCode::Div if one(rhs) => Some(lhs),
        OpCode::And | OpCode::Or if lhs == rhs => Some(lhs),
        OpCode::And if zero(lhs) || zero(rhs) => Some(Value::from(0i64)),
        OpCode::Or | OpCode::Xor if zero(rhs) => Some(lhs),
        OpCode::Or | OpCode::Xor if zero(lhs) => Some(rhs),
        OpCode::Xor if lhs == rhs => Some(Value::from(0i64)),
        OpCode::Shl | OpCode::Shr if zero(rhs) => Some(lhs),
        _ => None,
    }
}

fn bool_identity(opcode: OpCode, lhs: Value, rhs: Value) -> Option<Value> {
    let truthy = |value: Value| bool_const(value) == Some(true);
    let falsy = |value: Value| bool_const(value) == Some(false);
    match opcode {
        OpCode::And | OpCode::Or if lhs == rhs => Some(lhs),
        OpCode::And if truthy(rhs) => Some(lhs),
        OpCode::And if truthy(lhs) => Some(rhs),
        OpCode::And if falsy(lhs) || falsy(rhs) => Some(Value::from(false)),
        OpCode::Or if falsy(rhs) => Some(lhs),
        OpCode::Or if falsy(lhs) => Some(rhs),
        OpCode::Or if truthy(lhs) || truthy(rhs) => Some(Value::from(true)),
        OpCode::Xor if lhs == rhs => Some(Value::from(false)),
        OpCode::Xor if falsy(rhs) => Some(lhs),
        OpCode::Xor if falsy(lhs) => Some(rhs),
        _ => None,
    }
}

fn simplify_cmp(func: &Function, inst: &InstData, pred: Predicate) -> Option<Value> {
    let lhs = inst.operands[0];
    let rhs = inst.operands[1];
    if let (Some(l), Some(r)) = (lhs.as_const(), rhs.as_const()) {
        if let Some(ord) = const_ordering(l, r) {
            return Some(Value::from(pred_holds(pred, ord)));
        }
    }
    if lhs == rhs && operand_type(func, lhs).is_some_and(|ty| !ty.is_float()) {
        let verdict = matches!(pred, Predicate::Eq | Predicate::Le | Predicate::Ge);
        return Some(Value::from(verdict));
    }
    None
}

fn const_ordering(l: Constant, r: Constant) -> Option<Ordering> {
    match (l, r) {
        (Constant::Int(a), Constant::Int(b)) => Some(a.cmp(&b)),
        // partial_cmp keeps NaN comparisons unfolded
        (Constant::Float(a), Constant::Float(b)) => a.0.partial_cmp(&b.0),
        (Constant::Bool(a), Constant::Bool(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

fn pred_holds(pred: Predicate, ord: Ordering) -> bool {
    match pred {
        Predicate::Eq => ord == Ordering::Equal,
        Predicate::Ne => ord != Ordering::Equal,
        Predicate::Lt => ord == Ordering::Less,
        Predicate::Le => ord != Ordering::Greater,
        Predicate::Gt => ord == Ordering::Greater,
        Predicate::Ge => ord != Ordering::Less,
    }
}

fn simplify_select(inst: &InstData) -> Option<Value> {
    let cond = inst.operands[0];
    let then_val = inst.operands[1];
    let else_val = inst.operands[2];
    if let Some(verdict) = bool_const(cond) {
        return Some(if verdict { then_val } else { else_val });
    }
    if then_val == else_val {
        return Some(then_val);
    }
    None
}

fn int_const(value: Value) -> Option<i64> {
    value.as_const()?.as_int()
}

fn bool_const(value: Value) -> Option<bool> {
    value.as_const()?.as_bool()
}

fn operand_type(func: &Function, value: Value) -> Option<Type> {
    match value {
        Value::Constant(val) => Some(val.ty()),
        Value::Arg(idx) => func.params().get(idx as usize).copied(),
        Value::Inst(id) => Some(func.inst(id).ty),
        Value::Func(_) => None,
    }
}
