/*!
## Rust Machine Module

This Rust module is a compiler and virtual machine for ST-light.
It also carries the per-program debugger and the bytecode listing.

*/

pub type Address = usize;
pub type Symbol = isize;

/// Longest program accepted by the compiler, `HALT` included.
pub const MAX_INSTRUCTIONS: usize = 1024;
/// Most variables a program may declare.
pub const MAX_VARIABLES: usize = 32;

mod codegen;
mod compile;
mod debug;
mod function;
mod link;
mod listing;
mod opcode;
mod operation;
mod program;
mod stack;
mod val;
mod vm;

pub use compile::compile;
pub use compile::MAX_LOOP_DEPTH;
pub use debug::transition;
pub use debug::{DebugCommand, DebugMode, Debugger, PauseReason, RunOutcome, Snapshot};
pub use debug::{MAX_BREAKPOINTS, SNAPSHOT_MESSAGE_LEN};
pub use function::{Builtin, Function};
pub use link::Link;
pub use listing::Listing;
pub use opcode::Opcode;
pub use operation::Operation;
pub use program::{BytecodeProgram, Variable};
pub use stack::Stack;
pub use val::{DataType, Val};
pub use vm::{Frame, Step, Vm, DEFAULT_MAX_STEPS, STACK_DEPTH};

#[cfg(test)]
mod tests;
