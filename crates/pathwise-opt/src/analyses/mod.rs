mod base;
mod dominance;

pub use base::*;
pub use dominance::*;
