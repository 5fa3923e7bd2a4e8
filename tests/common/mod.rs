#![allow(dead_code)]
use stlogic::engine::{CycleReport, Engine, EngineConfig, ManualClock, Registers};

pub const COUNTER: &str = "VAR x : INT; y : INT; END_VAR x := x + 1; y := x * 2; x := y - 1;";

/// An engine on a manual clock with its own register space.
pub struct Rig {
    pub engine: Engine,
    pub clock: ManualClock,
    pub registers: Registers,
}

impl Rig {
    pub fn new() -> Rig {
        Rig::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Rig {
        let clock = ManualClock::new();
        Rig {
            engine: Engine::with_clock(config, clock.clone()),
            clock,
            registers: Registers::new(),
        }
    }

    /// Upload, compile and enable; panics with the compiler's message.
    pub fn load(&mut self, id: usize, source: &str) {
        if let Err(error) = self.engine.upload(id, source.as_bytes()) {
            panic!("{}", error);
        }
        if let Err(error) = self.engine.compile(id) {
            panic!("{}", error);
        }
        self.engine.set_enabled(id, true).unwrap();
    }

    pub fn tick_after(&mut self, ms: u64) -> Option<CycleReport> {
        self.clock.advance_ms(ms);
        self.engine.tick(&mut self.registers)
    }

    /// Advances one interval; the tick must fire.
    pub fn fire(&mut self) -> CycleReport {
        let ms = self.engine.interval().as_ms() as u64;
        match self.tick_after(ms) {
            Some(report) => report,
            None => panic!("tick did not fire"),
        }
    }
}
