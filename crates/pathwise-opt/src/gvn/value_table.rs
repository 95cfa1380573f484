use std::collections::HashMap;

use pathwise_ir::{CallEffects, Function, InstId, MemDep, MemDepOracle, OpCode, Type, Value};
use smallvec::SmallVec;

/// Structural key of a pure instruction: opcode, result type and the class
/// ids of its operands. Commutative operands are ordered by class id, and
/// comparisons swap their predicate along with the operands, so `a < b`
/// and `b > a` share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    opcode: OpCode,
    ty: Type,
    args: SmallVec<[u32; 2]>,
}

impl Expression {
    pub fn new(opcode: OpCode, ty: Type, args: SmallVec<[u32; 2]>) -> Self {
        let mut expr = Expression { opcode, ty, args };
        expr.canonicalize();
        expr
    }

    fn canonicalize(&mut self) {
        if self.args.len() != 2 {
            return;
        }
        if let OpCode::Cmp(pred) = self.opcode {
            if self.args[0] > self.args[1] {
                self.args.swap(0, 1);
                self.opcode = OpCode::Cmp(pred.swapped());
            }
        } else if self.opcode.is_commutative() && self.args[0] > self.args[1] {
            self.args.swap(0, 1);
        }
    }
}

/// Congruence-class numbering for all values in a function.
///
/// Classes are identified by dense `u32` ids handed out in first-seen
/// order. Two values share an id exactly when the table could prove them
/// congruent: structurally for pure instructions, through the
/// memory-dependence oracle for loads and read-only calls. Phis, stores,
/// calls with unknown effects, landing pads and inline assembly are
/// opaque; each occurrence gets a fresh id.
#[derive(Debug)]
pub struct ValueTable {
    values: HashMap<Value, u32>,
    expressions: HashMap<Expression, u32>,
    next_id: u32,
}

impl Default for ValueTable {
    fn default() -> Self {
        ValueTable {
            values: HashMap::new(),
            expressions: HashMap::new(),
            next_id: 1,
        }
    }
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every numbering. Ids restart from the beginning.
    pub fn clear(&mut self) {
        self.values.clear();
        self.expressions.clear();
        self.next_id = 1;
    }

    /// Class id of `value`, if it was numbered before.
    pub fn lookup(&self, value: &Value) -> Option<u32> {
        self.values.get(value).copied()
    }

    /// Class id recorded for a structural key.
    pub fn lookup_expression(&self, expr: &Expression) -> Option<u32> {
        self.expressions.get(expr).copied()
    }

    /// Force `value` into an existing class. Used for phis and clones the
    /// caller knows to be congruent with the class members.
    pub fn insert(&mut self, value: Value, num: u32) {
        self.values.insert(value, num);
    }

    /// Forget `value`'s numbering, usually right before erasing it.
    pub fn erase(&mut self, value: &Value) {
        self.values.remove(value);
    }

    /// Number `value`, assigning a fresh class id if no congruent value
    /// was seen before.
    pub fn lookup_or_add(
        &mut self,
        func: &Function,
        memdep: &dyn MemDepOracle,
        value: &Value,
    ) -> u32 {
        if let Some(num) = self.values.get(value) {
            return *num;
        }
        let num = match value {
            Value::Inst(id) => self.number_inst(func, memdep, *id),
            _ => self.fresh(),
        };
        self.values.insert(*value, num);
        num
    }

    fn number_inst(&mut self, func: &Function, memdep: &dyn MemDepOracle, id: InstId) -> u32 {
        let inst = func.inst(id);
        if inst.is_phi()
            || inst.has_side_effects()
            || inst.ty.is_void()
            || inst.ty == Type::Aggregate
        {
            return self.fresh();
        }
        match inst.opcode {
            OpCode::Load => self.number_load(func, memdep, id),
            OpCode::Call(CallEffects::ReadOnly) => self.number_dependent_call(func, memdep, id),
            _ => self.number_structural(func, memdep, id),
        }
    }

    fn number_structural(&mut self, func: &Function, memdep: &dyn MemDepOracle, id: InstId) -> u32 {
        let inst = func.inst(id);
        let args = inst
            .operands
            .iter()
            .map(|op| self.lookup_or_add(func, memdep, op))
            .collect();
        let expr = Expression::new(inst.opcode, inst.ty, args);
        match self.expressions.get(&expr) {
            Some(num) => *num,
            None => {
                let num = self.fresh();
                self.expressions.insert(expr, num);
                num
            }
        }
    }

    /// A load joins the class of a prior load of the same location when
    /// the oracle proves the value still holds. Stores are not forwarded.
    fn number_load(&mut self, func: &Function, memdep: &dyn MemDepOracle, id: InstId) -> u32 {
        let ty = func.inst(id).ty;
        match memdep.dependency(func, id) {
            MemDep::Def(dep) if func.contains_inst(dep) => {
                let dep_inst = func.inst(dep);
                if dep_inst.opcode == OpCode::Load && dep_inst.ty == ty {
                    return self.lookup_or_add(func, memdep, &Value::Inst(dep));
                }
                // TODO: forward Def(store) answers once stored operands
                // can stand in for the loaded value
                self.fresh()
            }
            _ => self.fresh(),
        }
    }

    /// A read-only call joins the class of a congruent earlier call only
    /// when the oracle proves no write reached memory in between.
    fn number_dependent_call(
        &mut self,
        func: &Function,
        memdep: &dyn MemDepOracle,
        id: InstId,
    ) -> u32 {
        match memdep.dependency(func, id) {
            MemDep::Def(dep)
                if func.contains_inst(dep) && func.inst(dep).opcode == func.inst(id).opcode =>
            {
                let key = self.call_key(func, memdep, id);
                let dep_key = self.call_key(func, memdep, dep);
                if key == dep_key {
                    return self.lookup_or_add(func, memdep, &Value::Inst(dep));
                }
                self.fresh()
            }
            _ => self.fresh(),
        }
    }

    fn call_key(&mut self, func: &Function, memdep: &dyn MemDepOracle, id: InstId) -> Expression {
        let inst = func.inst(id);
        let args = inst
            .operands
            .iter()
            .map(|op| self.lookup_or_add(func, memdep, op))
            .collect();
        Expression::new(inst.opcode, inst.ty, args)
    }

    fn fresh(&mut self) -> u32 {
        let num = self.next_id;
        self.next_id += 1;
        num
    }
}
