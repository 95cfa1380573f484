use petgraph::graph::NodeIndex;

use crate::{
    CallEffects, Function, FuncRef, InstData, OpCode, Predicate, Terminator, Type, Value,
};

/// Incremental [`Function`] construction, one block at a time.
///
/// Instructions append to the current block until [`switch_to`] selects
/// another one. Terminators install the matching graph edges, so the
/// finished function is ready for [`Function::verify`].
///
/// [`switch_to`]: FunctionBuilder::switch_to
#[derive(Debug)]
pub struct FunctionBuilder {
    func: Function,
    current: NodeIndex,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, params: &[Type]) -> Self {
        let func = Function::new(name, params);
        let current = func.entry();
        FunctionBuilder { func, current }
    }

    /// Block new instructions currently append to.
    pub fn current(&self) -> NodeIndex {
        self.current
    }

    pub fn create_block(&mut self) -> NodeIndex {
        self.func.create_block()
    }

    pub fn switch_to(&mut self, block: NodeIndex) {
        self.current = block;
    }

    /// Reference to the `idx`-th function parameter.
    #[track_caller]
    pub fn arg(&self, idx: u16) -> Value {
        assert!(
            (idx as usize) < self.func.params().len(),
            "function has no parameter {idx}"
        );
        Value::Arg(idx)
    }

    /// Append an instruction to the current block.
    pub fn push(&mut self, opcode: OpCode, ty: Type, operands: &[Value]) -> Value {
        let id = self
            .func
            .push_inst(self.current, InstData::new(opcode, ty, operands));
        Value::Inst(id)
    }

    pub fn binary(&mut self, opcode: OpCode, ty: Type, lhs: Value, rhs: Value) -> Value {
        self.push(opcode, ty, &[lhs, rhs])
    }

    pub fn unary(&mut self, opcode: OpCode, ty: Type, operand: Value) -> Value {
        self.push(opcode, ty, &[operand])
    }

    pub fn cmp(&mut self, pred: Predicate, lhs: Value, rhs: Value) -> Value {
        self.push(OpCode::Cmp(pred), Type::Bool, &[lhs, rhs])
    }

    pub fn select(&mut self, ty: Type, cond: Value, then_val: Value, else_val: Value) -> Value {
        self.push(OpCode::Select, ty, &[cond, then_val, else_val])
    }

    pub fn load(&mut self, ty: Type, ptr: Value) -> Value {
        self.push(OpCode::Load, ty, &[ptr])
    }

    pub fn store(&mut self, ptr: Value, value: Value) -> Value {
        self.push(OpCode::Store, Type::Void, &[ptr, value])
    }

    pub fn call(&mut self, effects: CallEffects, ty: Type, target: FuncRef, args: &[Value]) -> Value {
        let mut operands = vec![Value::Func(target)];
        operands.extend_from_slice(args);
        self.push(OpCode::Call(effects), ty, &operands)
    }

    /// Create a phi in the current block with the given incoming values.
    pub fn phi(&mut self, ty: Type, incoming: &[(Value, NodeIndex)]) -> Value {
        let id = self.func.create_phi(self.current, ty);
        for (value, pred) in incoming {
            self.func.add_incoming(id, *value, *pred);
        }
        Value::Inst(id)
    }

    pub fn br(&mut self, dest: NodeIndex) {
        self.func.set_terminator(self.current, Terminator::Br { dest });
    }

    pub fn cond_br(&mut self, cond: Value, then_dest: NodeIndex, else_dest: NodeIndex) {
        self.func.set_terminator(
            self.current,
            Terminator::CondBr {
                cond,
                then_dest,
                else_dest,
            },
        );
    }

    pub fn switch(&mut self, value: Value, default: NodeIndex, cases: &[(i64, NodeIndex)]) {
        self.func.set_terminator(
            self.current,
            Terminator::Switch {
                value,
                default,
                cases: cases.to_vec(),
            },
        );
    }

    pub fn indirect_br(&mut self, address: Value, dests: &[NodeIndex]) {
        self.func.set_terminator(
            self.current,
            Terminator::IndirectBr {
                address,
                dests: dests.to_vec(),
            },
        );
    }

    pub fn ret(&mut self, value: Option<Value>) {
        self.func
            .set_terminator(self.current, Terminator::Ret { value });
    }

    pub fn finish(self) -> Function {
        self.func
    }
}
