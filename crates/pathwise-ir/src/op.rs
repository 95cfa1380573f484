use std::fmt::Display;

/// Comparison predicate with signed integer semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Predicate {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Predicate {
    /// Predicate that yields the same result with the operands swapped.
    pub fn swapped(&self) -> Predicate {
        match self {
            Predicate::Eq => Predicate::Eq,
            Predicate::Ne => Predicate::Ne,
            Predicate::Lt => Predicate::Gt,
            Predicate::Le => Predicate::Ge,
            Predicate::Gt => Predicate::Lt,
            Predicate::Ge => Predicate::Le,
        }
    }

    /// Predicate for the negated comparison.
    pub fn inverse(&self) -> Predicate {
        match self {
            Predicate::Eq => Predicate::Ne,
            Predicate::Ne => Predicate::Eq,
            Predicate::Lt => Predicate::Ge,
            Predicate::Le => Predicate::Gt,
            Predicate::Gt => Predicate::Lt,
            Predicate::Ge => Predicate::Le,
        }
    }

    pub fn is_commutative(&self) -> bool {
        matches!(self, Predicate::Eq | Predicate::Ne)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Eq => write!(f, "eq"),
            Predicate::Ne => write!(f, "ne"),
            Predicate::Lt => write!(f, "lt"),
            Predicate::Le => write!(f, "le"),
            Predicate::Gt => write!(f, "gt"),
            Predicate::Ge => write!(f, "ge"),
        }
    }
}

/// Memory behavior the host frontend recorded for a call target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CallEffects {
    /// Neither reads nor writes memory.
    Pure,
    /// Reads memory but never writes it.
    ReadOnly,
    /// May read and write arbitrary memory.
    Unknown,
}

/// Closed set of instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpCode {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Neg,
    Not,
    Cmp(Predicate),
    /// Ternary select on a boolean condition.
    Select,
    Load,
    Store,
    Call(CallEffects),
    Phi,
    /// Exception landing point. A block led by one is pinned in place and
    /// never a target of hoisting or merging.
    LandingPad,
    /// Opaque inline assembly. Treated as reading and writing everything.
    InlineAsm,
}

impl OpCode {
    pub fn is_commutative(&self) -> bool {
        match self {
            OpCode::Add | OpCode::Mul | OpCode::And | OpCode::Or | OpCode::Xor => true,
            OpCode::Cmp(pred) => pred.is_commutative(),
            _ => false,
        }
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, OpCode::Phi)
    }

    pub fn may_read_memory(&self) -> bool {
        matches!(
            self,
            OpCode::Load
                | OpCode::Call(CallEffects::ReadOnly)
                | OpCode::Call(CallEffects::Unknown)
                | OpCode::InlineAsm
        )
    }

    pub fn may_write_memory(&self) -> bool {
        matches!(
            self,
            OpCode::Store | OpCode::Call(CallEffects::Unknown) | OpCode::InlineAsm
        )
    }

    /// Whether executing the instruction has an effect beyond producing its
    /// result. Such instructions are never merged or removed.
    pub fn has_side_effects(&self) -> bool {
        self.may_write_memory() || matches!(self, OpCode::LandingPad)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Rem => "rem",
            OpCode::And => "and",
            OpCode::Or => "or",
            OpCode::Xor => "xor",
            OpCode::Shl => "shl",
            OpCode::Shr => "shr",
            OpCode::Neg => "neg",
            OpCode::Not => "not",
            OpCode::Cmp(_) => "cmp",
            OpCode::Select => "select",
            OpCode::Load => "load",
            OpCode::Store => "store",
            OpCode::Call(_) => "call",
            OpCode::Phi => "phi",
            OpCode::LandingPad => "landingpad",
            OpCode::InlineAsm => "asm",
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpCode::Cmp(pred) => write!(f, "cmp.{pred}"),
            OpCode::Call(CallEffects::Pure) => write!(f, "call.pure"),
            OpCode::Call(CallEffects::ReadOnly) => write!(f, "call.ro"),
            OpCode::Call(CallEffects::Unknown) => write!(f, "call"),
            _ => write!(f, "{}", self.mnemonic()),
        }
    }
}
