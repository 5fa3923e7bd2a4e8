//! # ST Logic
//!
//! A Structured Text logic engine of the kind found in small Modbus
//! controllers. Up to four ST programs are compiled to bytecode and run
//! at a fixed rate on a stack machine, each under its own debugger,
//! reading and writing a shared register space.
//!
//! ```
//! use stlogic::engine::{Engine, EngineConfig, ManualClock, RegisterBank, Registers};
//!
//! let clock = ManualClock::new();
//! let mut engine = Engine::with_clock(EngineConfig::default(), clock.clone());
//! let mut registers = Registers::new();
//! engine.upload(0, b"VAR n : INT EXPORT; END_VAR n := n + 1;").unwrap();
//! engine.compile(0).unwrap();
//! engine.set_enabled(0, true).unwrap();
//! clock.advance_ms(10);
//! engine.tick(&mut registers).unwrap();
//! assert_eq!(registers.input_register(220), 1);
//! ```

#[path = "doc/language.rs"]
#[allow(non_snake_case)]
pub mod _Language;

#[path = "doc/console.rs"]
#[allow(non_snake_case)]
pub mod __Console;

pub mod lang;
pub mod mach;
pub mod pool;
pub mod engine;
