//! # Pathwise optimizer
//!
//! Profile-guided redundancy elimination over [`pathwise_ir`] functions.
//! The only pass today is [`GvnPrePass`], which runs in four phases:
//!
//! 1. Merge fall-through chains so the graph is as short as possible.
//! 2. Iterate dominator-order value numbering to a fixpoint: fold what
//!    simplifies, drop instructions with a dominating congruent leader
//!    and propagate branch-implied equalities into guarded subtrees.
//! 3. Complete partial redundancies at joins. Jump-free paths enumerated
//!    from the profile decide, per occurrence, whether hoisting a clone
//!    into the one lacking predecessor is worth the speculation; critical
//!    edges are split on demand to make the insertion point exist.
//! 4. Reset the tables so no stale ids survive into the next function.
//!
//! Structural facts like dominance are computed lazily through
//! [`OptUnit::analysis`] and cached until a pass changes the graph shape.
//!
//! ```
//! use pathwise_ir::{FunctionBuilder, NoMemDep, OpCode, ProfileInfo, Type};
//! use pathwise_opt::GvnPrePass;
//!
//! let mut builder = FunctionBuilder::new("twice", &[Type::I32, Type::I32]);
//! let a = builder.arg(0);
//! let b = builder.arg(1);
//! let first = builder.binary(OpCode::Add, Type::I32, a, b);
//! let second = builder.binary(OpCode::Add, Type::I32, b, a);
//! let product = builder.binary(OpCode::Mul, Type::I32, first, second);
//! builder.ret(Some(product));
//! let mut func = builder.finish();
//!
//! let mut profile = ProfileInfo::new();
//! let mut pass = GvnPrePass::new();
//! assert!(pass.run(&mut func, &mut profile, &NoMemDep));
//! assert_eq!(pass.stats().eliminated, 1);
//! ```

use std::rc::Rc;

use pathwise_ir::{Function, MemDepOracle, ProfileInfo};

use crate::analyses::{Analysis, AnalysisCache, Dominators};

pub mod analyses;
mod gvn;
mod hints;

pub use gvn::*;
pub use hints::*;
pub use pathwise_ir::NodeIndex;

/// One function under optimization: the function itself, its profile,
/// the memory dependence oracle the host provides and a cache of lazily
/// computed analyses.
pub struct OptUnit<'a> {
    pub func: &'a mut Function,
    pub profile: &'a mut ProfileInfo,
    pub memdep: &'a dyn MemDepOracle,
    analyses: Rc<AnalysisCache>,
}

impl<'a> OptUnit<'a> {
    pub fn new(
        func: &'a mut Function,
        profile: &'a mut ProfileInfo,
        memdep: &'a dyn MemDepOracle,
    ) -> Self {
        OptUnit {
            func,
            profile,
            memdep,
            analyses: Rc::default(),
        }
    }

    /// Fetch an analysis, computing it on first use.
    pub fn analysis<A: Analysis + 'static>(&mut self) -> Rc<A> {
        let cache = self.analyses.clone();
        cache.get(self)
    }

    pub fn invalidate_analysis<A: 'static>(&self) {
        self.analyses.invalidate::<A>();
    }

    /// Drop every analysis that depends on the block graph. Must run
    /// after any change to the set of blocks or edges.
    pub fn invalidate_structure(&self) {
        self.analyses.invalidate::<Dominators>();
    }
}
