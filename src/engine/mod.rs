/*!
## Rust Engine Module

The scheduler that runs up to four compiled ST programs at a fixed rate
against a register space. It owns the source and export pools, one
debugger per program, the variable bindings, and the management surface
used by the console.

*/

mod binding;
mod clock;
mod config;
mod console;
mod persist;
mod program;
mod registers;
mod status;

pub use binding::{Binding, Bindings, Direction, Target};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{EngineConfig, ExecInterval};
pub use console::{Command, Inspect, ProgramSet};
pub use persist::{decode_op, encode_op, CONFIG_MAGIC, CONFIG_SCHEMA};
pub use program::{ExecStats, LogicProgram, SharedVars, LAST_ERROR_LEN};
pub use registers::{RegisterBank, Registers, REGISTER_COUNT};
pub use status::*;

use crate::error;
use crate::lang::Error;
use crate::mach::{compile, Debugger, RunOutcome, Vm};
use crate::pool::{IrPool, SourcePool, MAX_PROGRAMS};
use std::convert::TryFrom;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub min_us: u32,
    pub max_us: u32,
    pub total_us: u64,
    pub overrun_count: u32,
    pub total_cycles: u32,
}

impl CycleStats {
    fn record(&mut self, elapsed_us: u32, interval_ms: u32) -> bool {
        self.total_cycles = self.total_cycles.wrapping_add(1);
        if self.total_cycles == 1 || elapsed_us < self.min_us {
            self.min_us = elapsed_us;
        }
        self.max_us = self.max_us.max(elapsed_us);
        self.total_us += elapsed_us as u64;
        let overrun = elapsed_us / 1000 > interval_ms;
        if overrun {
            self.overrun_count += 1;
        }
        overrun
    }
}

/// What one program did during a firing tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramRun {
    Completed { elapsed_us: u32 },
    Faulted(Error),
    /// The debugger stopped the run part way, or it was already paused.
    Paused,
}

/// Summary of a firing tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleReport {
    pub runs: Vec<(usize, ProgramRun)>,
    pub elapsed_us: u32,
    pub overrun: bool,
}

impl CycleReport {
    pub fn ran(&self, program_id: usize) -> bool {
        self.runs.iter().any(|(id, _)| *id == program_id)
    }

    pub fn faults(&self) -> impl Iterator<Item = (usize, &Error)> {
        self.runs.iter().filter_map(|(id, run)| match run {
            ProgramRun::Faulted(error) => Some((*id, error)),
            _ => None,
        })
    }
}

/// ## Logic engine
///
/// Everything the scheduler touches lives here; there is no global state.
/// Management calls and `tick` are expected to come from one thread.

pub struct Engine {
    config: EngineConfig,
    programs: Vec<LogicProgram>,
    debuggers: Vec<Debugger>,
    sources: SourcePool,
    ir_pool: IrPool,
    bindings: Bindings,
    cycle: CycleStats,
    last_run_us: u64,
    request_quota: Arc<AtomicU32>,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("cycle", &self.cycle)
            .field("last_run_us", &self.last_run_us)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Engine {
        Engine::with_clock(config, MonotonicClock::new())
    }

    pub fn with_clock<C: Clock + 'static>(config: EngineConfig, clock: C) -> Engine {
        Engine {
            config,
            programs: (0..MAX_PROGRAMS).map(LogicProgram::new).collect(),
            debuggers: (0..MAX_PROGRAMS).map(|_| Debugger::new()).collect(),
            sources: SourcePool::new(),
            ir_pool: IrPool::new(),
            bindings: Bindings::new(),
            cycle: CycleStats::default(),
            last_run_us: 0,
            request_quota: Arc::new(AtomicU32::new(0)),
            clock: Box::new(clock),
        }
    }

    fn check_id(program_id: usize) -> Result<()> {
        if program_id >= MAX_PROGRAMS {
            let msg = format!("{}; USE 1 TO {}", program_id + 1, MAX_PROGRAMS);
            return Err(error!(InvalidProgramId; &msg));
        }
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn set_engine_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        info!(enabled, "engine enable changed");
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    pub fn interval(&self) -> ExecInterval {
        self.config.interval
    }

    pub fn set_interval(&mut self, ms: u32) -> Result<()> {
        self.config.interval = ExecInterval::try_from(ms)?;
        info!(interval = %self.config.interval, "execution interval changed");
        Ok(())
    }

    pub fn programs(&self) -> &[LogicProgram] {
        &self.programs
    }

    pub fn program(&self, program_id: usize) -> Result<&LogicProgram> {
        Engine::check_id(program_id)?;
        Ok(&self.programs[program_id])
    }

    pub fn program_mut(&mut self, program_id: usize) -> Result<&mut LogicProgram> {
        Engine::check_id(program_id)?;
        Ok(&mut self.programs[program_id])
    }

    pub fn debugger(&self, program_id: usize) -> Result<&Debugger> {
        Engine::check_id(program_id)?;
        Ok(&self.debuggers[program_id])
    }

    pub fn debugger_mut(&mut self, program_id: usize) -> Result<&mut Debugger> {
        Engine::check_id(program_id)?;
        Ok(&mut self.debuggers[program_id])
    }

    pub fn is_paused(&self, program_id: usize) -> bool {
        self.debuggers
            .get(program_id)
            .map(Debugger::is_paused)
            .unwrap_or(false)
    }

    pub fn sources(&self) -> &SourcePool {
        &self.sources
    }

    pub fn ir_pool(&self) -> &IrPool {
        &self.ir_pool
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn cycle_stats(&self) -> &CycleStats {
        &self.cycle
    }

    /// Modbus-master requests allowed this cycle; zeroed on every firing tick.
    pub fn request_quota(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.request_quota)
    }

    // *** Management

    /// Stores source text. The running bytecode is untouched until `compile`.
    pub fn upload(&mut self, program_id: usize, source: &[u8]) -> Result<()> {
        Engine::check_id(program_id)?;
        self.sources.upload(program_id, source)
    }

    /// Compiles the uploaded source. Success replaces the bytecode, seeds the
    /// variables and allocates the export slice. A full export pool only
    /// costs the program its exports; it runs with `last_error` set.
    /// Compile errors leave the program uncompiled with `last_error` set.
    pub fn compile(&mut self, program_id: usize) -> Result<()> {
        Engine::check_id(program_id)?;
        let result = match self.sources.source_str(program_id) {
            Some(source) => compile(source),
            None => Err(error!(NotCompiled; "NO SOURCE UPLOADED")),
        };
        self.debuggers[program_id].stop();
        self.ir_pool.free(program_id);
        let program = &mut self.programs[program_id];
        match result {
            Ok(bytecode) => {
                let exports = self
                    .ir_pool
                    .allocate(program_id, IrPool::calculate_size(&bytecode));
                info!(
                    program_id,
                    instructions = bytecode.instruction_count(),
                    vars = bytecode.var_count(),
                    "program compiled"
                );
                program.install(bytecode);
                program.stats.reset();
                program.clear_error();
                if let Err(error) = exports {
                    warn!(program_id, %error, "compiled without exports");
                    program.set_last_error(&error.to_string());
                }
                self.bindings.refresh(program);
                program.binding_count = self.bindings.count_for(program_id);
                Ok(())
            }
            Err(error) => {
                warn!(program_id, %error, "compile failed");
                program.uninstall();
                program.set_last_error(&error.to_string());
                Err(error)
            }
        }
    }

    /// Enabling an uncompiled program is allowed; it runs once compiled.
    pub fn set_enabled(&mut self, program_id: usize, enabled: bool) -> Result<()> {
        self.program_mut(program_id)?.enabled = enabled;
        info!(program_id, enabled, "program enable changed");
        Ok(())
    }

    /// Returns the slot to its initial state and releases everything it held.
    pub fn delete(&mut self, program_id: usize) -> Result<()> {
        Engine::check_id(program_id)?;
        self.sources.free(program_id);
        self.ir_pool.free(program_id);
        self.bindings.clear_program(program_id);
        let debugger = &mut self.debuggers[program_id];
        debugger.stop();
        debugger.clear_breakpoints();
        self.programs[program_id] = LogicProgram::new(program_id);
        info!(program_id, "program deleted");
        Ok(())
    }

    pub fn bind(&mut self, program_id: usize, var_name: &str, target: Target) -> Result<()> {
        Engine::check_id(program_id)?;
        self.bindings
            .bind(&self.programs[program_id], var_name, target)?;
        self.programs[program_id].binding_count = self.bindings.count_for(program_id);
        Ok(())
    }

    pub fn unbind(&mut self, program_id: usize, var_name: &str) -> Result<bool> {
        Engine::check_id(program_id)?;
        let removed = self.bindings.unbind(program_id, var_name);
        self.programs[program_id].binding_count = self.bindings.count_for(program_id);
        Ok(removed)
    }

    pub fn reset_stats(&mut self, program_id: usize) -> Result<()> {
        self.program_mut(program_id)?.stats.reset();
        Ok(())
    }

    pub fn reset_all_stats(&mut self) {
        for program in self.programs.iter_mut() {
            program.stats.reset();
        }
        self.cycle = CycleStats::default();
    }

    /// Compacts the export pool and rewrites nothing else; exports move on
    /// the next flush.
    pub fn compact_ir_pool(&mut self) {
        self.ir_pool.compact();
    }

    pub fn compact_sources(&mut self) {
        self.sources.compact();
    }

    // *** Scheduling

    /// Runs one cycle when the interval has elapsed. Returns `None` when the
    /// tick did not fire.
    pub fn tick(&mut self, registers: &mut dyn RegisterBank) -> Option<CycleReport> {
        let now = self.clock.now_us();
        if !self.config.enabled {
            return None;
        }
        if now.saturating_sub(self.last_run_us) < self.config.interval.as_us() {
            return None;
        }
        self.last_run_us = now;
        self.request_quota.store(0, Ordering::SeqCst);
        self.bindings.sync_inputs(&self.programs, registers);

        let mut report = CycleReport::default();
        for program_id in 0..MAX_PROGRAMS {
            if let Some(run) = self.run_program(program_id, registers) {
                report.runs.push((program_id, run));
            }
        }

        self.bindings.sync_outputs(&self.programs, registers);
        self.publish_status(registers);
        let elapsed = self.clock.now_us().saturating_sub(now) as u32;
        report.elapsed_us = elapsed;
        report.overrun = self.cycle.record(elapsed, self.config.interval.as_ms());
        if report.overrun {
            warn!(elapsed_us = elapsed, interval = %self.config.interval, "cycle overrun");
        }
        Some(report)
    }

    fn run_program(
        &mut self,
        program_id: usize,
        registers: &mut dyn RegisterBank,
    ) -> Option<ProgramRun> {
        let max_steps = self.config.max_steps;
        let interval_ms = self.config.interval.as_ms();
        let program = &mut self.programs[program_id];
        if !program.enabled || !program.is_compiled() {
            return None;
        }
        let debugger = &mut self.debuggers[program_id];
        if debugger.is_paused() {
            return Some(ProgramRun::Paused);
        }

        let start = self.clock.now_us();
        let (outcome, values, steps) = {
            let bytecode = program.bytecode()?;
            let mut vm = match debugger.take_suspended() {
                Some(frame) => Vm::resume(bytecode, frame),
                None => Vm::new(bytecode, &program.values()),
            };
            let outcome = debugger.run(&mut vm, max_steps);
            let steps = vm.step_count();
            match outcome {
                RunOutcome::Completed => (outcome, Some(vm.into_vars()), steps),
                _ => (outcome, None, steps),
            }
        };
        let elapsed_us = self.clock.now_us().saturating_sub(start) as u32;

        match outcome {
            RunOutcome::Completed => {
                if program.stats.record(elapsed_us, interval_ms) {
                    warn!(program_id, elapsed_us, "program overran the interval");
                }
                if let Some(values) = values {
                    program.set_values(values);
                }
                if let Some(bytecode) = program.bytecode() {
                    self.ir_pool
                        .write_exports(program_id, bytecode, &program.values(), registers);
                }
                if self.config.debug {
                    debug!(program_id, elapsed_us, steps, "program executed");
                }
                Some(ProgramRun::Completed { elapsed_us })
            }
            RunOutcome::Faulted(error) => {
                program.stats.error_count = program.stats.error_count.wrapping_add(1);
                program.set_last_error(&error.to_string());
                tracing::error!(program_id, %error, "program faulted");
                Some(ProgramRun::Faulted(error))
            }
            RunOutcome::Paused => {
                debug!(program_id, pc = ?debugger.snapshot().map(|s| s.pc), "program paused");
                Some(ProgramRun::Paused)
            }
        }
    }

    // *** Debugger

    /// Pauses every program; used by the console's interrupt handler.
    pub fn pause_all(&mut self) {
        for debugger in self.debuggers.iter_mut() {
            debugger.pause();
        }
    }

    /// Sets a breakpoint. The pc must address an instruction of the
    /// compiled program.
    pub fn add_breakpoint(&mut self, program_id: usize, pc: usize) -> Result<()> {
        let count = match self.program(program_id)?.bytecode() {
            Some(bytecode) => bytecode.instruction_count(),
            None => return Err(error!(NotCompiled; &self.programs[program_id].name)),
        };
        if pc >= count {
            let msg = format!("PC {} NOT IN 0..{}", pc, count);
            return Err(error!(InvalidBreakpoint; &msg));
        }
        if !self.debuggers[program_id].add_breakpoint(pc) {
            return Err(error!(InvalidBreakpoint; "ALL SLOTS IN USE"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
