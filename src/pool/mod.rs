/*!
## Rust Pool Module

Fixed-size arenas shared by the logic programs: the source text pool
and the input register slice that exported variables are published to.

*/

/// Logic program slots.
pub const MAX_PROGRAMS: usize = 4;

mod ir;
mod source;

pub use ir::{IrAllocation, IrPool, IR_POOL_BASE, IR_POOL_SIZE};
pub use source::{PoolStats, Region, SourcePool, SOURCE_POOL_SIZE};
