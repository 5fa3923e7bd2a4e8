//! # ST Logic console
//!
//! Runs the logic engine against an in-memory register space and reads
//! management commands between ticks.
//!

mod term;

fn main() {
    term::main();
}
