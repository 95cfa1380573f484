//! # Pathwise IR
//!
//! SSA program model consumed by the pathwise optimizer. A [`Function`] is
//! a control-flow graph of basic blocks over a stable instruction arena,
//! with the mutation API redundancy elimination drives: use replacement,
//! erasure, instruction cloning, phi creation and critical-edge splitting.
//!
//! The model is deliberately small. Opcodes are a closed set with
//! capability queries ([`OpCode::is_commutative`],
//! [`OpCode::may_write_memory`]) rather than an open instruction zoo, and
//! host-specific knowledge arrives through two interfaces:
//!
//! * [`ProfileInfo`] carries block execution counts and edge frequencies
//!   collected by the host profiler.
//! * [`MemDepOracle`] answers where a memory read takes its value from,
//!   so congruent loads can be merged without an aliasing model of our
//!   own. [`BlockLocalMemDep`] is a conservative block-local
//!   implementation; [`NoMemDep`] disables memory reasoning entirely.
//!
//! [`FunctionBuilder`] constructs functions block by block, and
//! [`Function::verify`] checks SSA well-formedness after construction or
//! transformation.

mod block;
mod builder;
mod display;
mod function;
mod inst;
mod memdep;
mod op;
mod profile;
mod terminator;
mod types;
mod value;
mod verify;

pub use block::*;
pub use builder::*;
pub use function::*;
pub use inst::*;
pub use memdep::*;
pub use op::*;
pub use profile::*;
pub use terminator::*;
pub use types::*;
pub use value::*;
pub use verify::*;

pub use petgraph::graph::NodeIndex;
