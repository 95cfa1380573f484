use std::fmt::Display;

use float_ord::FloatOrd;

use crate::{InstId, Type};

/// Compile-time constant operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constant {
    Int(i64),
    Float(FloatOrd<f64>),
    Bool(bool),
}

impl Constant {
    pub fn ty(&self) -> Type {
        match self {
            Constant::Int(_) => Type::I64,
            Constant::Float(_) => Type::F64,
            Constant::Bool(_) => Type::Bool,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Bool(val) => Some(*val),
            _ => None,
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Int(val) => write!(f, "{val}"),
            Constant::Float(val) => write!(f, "{:?}", val.0),
            Constant::Bool(val) => write!(f, "{val}"),
        }
    }
}

/// Reference to a call target by symbol index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncRef(pub u32);

impl Display for FuncRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@f{}", self.0)
    }
}

/// An SSA operand: a constant, a function parameter, a call target or the
/// result of another instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Constant(Constant),
    Arg(u16),
    Func(FuncRef),
    Inst(InstId),
}

impl Value {
    pub fn as_const(&self) -> Option<Constant> {
        match self {
            Value::Constant(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_inst(&self) -> Option<InstId> {
        match self {
            Value::Inst(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Constant(_))
    }

    /// Constants, parameters and call targets are live on every path from
    /// the entry; only instruction results have a defining block.
    pub fn is_global(&self) -> bool {
        !matches!(self, Value::Inst(_))
    }
}

impl From<Constant> for Value {
    fn from(value: Constant) -> Self {
        Value::Constant(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Constant(Constant::Int(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Constant(Constant::Float(FloatOrd(value)))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Constant(Constant::Bool(value))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Constant(val) => write!(f, "{val}"),
            Value::Arg(idx) => write!(f, "%a{idx}"),
            Value::Func(func) => write!(f, "{func}"),
            Value::Inst(id) => write!(f, "%{id}"),
        }
    }
}
