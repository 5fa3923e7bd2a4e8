use crate::engine::{CycleReport, Engine, EngineConfig, ManualClock, Registers};

mod console_test;
mod manage_test;

const COUNTER: &str = "VAR x : INT; y : INT; END_VAR x := x + 1; y := x * 2; x := y - 1;";

fn engine() -> (Engine, ManualClock) {
    let clock = ManualClock::new();
    let engine = Engine::with_clock(EngineConfig::default(), clock.clone());
    (engine, clock)
}

fn load(engine: &mut Engine, id: usize, source: &str) {
    if let Err(error) = engine.upload(id, source.as_bytes()) {
        panic!("{}", error);
    }
    if let Err(error) = engine.compile(id) {
        panic!("{}", error);
    }
    engine.set_enabled(id, true).unwrap();
}

/// Advances one interval and runs the tick that fires.
fn fire(engine: &mut Engine, clock: &ManualClock, registers: &mut Registers) -> CycleReport {
    clock.advance_ms(engine.interval().as_ms() as u64);
    match engine.tick(registers) {
        Some(report) => report,
        None => panic!("tick did not fire"),
    }
}
