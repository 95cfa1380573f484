use std::fmt::Display;

/// Result type of an instruction or function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    Bool,
    I32,
    I64,
    F32,
    F64,
    /// Opaque pointer into addressable memory.
    Ptr,
    /// Opaque aggregate. Loads and stores of aggregates are left untouched
    /// by the optimizer.
    Aggregate,
    /// Produces no value.
    Void,
}

impl Type {
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::I32 | Type::I64)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::I32 => write!(f, "i32"),
            Type::I64 => write!(f, "i64"),
            Type::F32 => write!(f, "f32"),
            Type::F64 => write!(f, "f64"),
            Type::Ptr => write!(f, "ptr"),
            Type::Aggregate => write!(f, "agg"),
            Type::Void => write!(f, "void"),
        }
    }
}
