use super::{Address, BytecodeProgram, Frame, Step, Val, Vm, STACK_DEPTH};
use crate::lang::Error;
use std::fmt::Write;

/// Breakpoint slots per program.
pub const MAX_BREAKPOINTS: usize = 8;
/// Longest error message kept in a snapshot.
pub const SNAPSHOT_MESSAGE_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugMode {
    Off,
    Paused,
    Step,
    Run,
}

impl std::fmt::Display for DebugMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            DebugMode::Off => "OFF",
            DebugMode::Paused => "PAUSED",
            DebugMode::Step => "STEP",
            DebugMode::Run => "RUN",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    None,
    PauseCmd,
    Step,
    Breakpoint,
    Halt,
    Error,
}

impl std::fmt::Display for PauseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            PauseReason::None => "none",
            PauseReason::PauseCmd => "pause command",
            PauseReason::Step => "single-step",
            PauseReason::Breakpoint => "breakpoint",
            PauseReason::Halt => "program halt",
            PauseReason::Error => "runtime error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    Pause,
    Continue,
    Step,
    Stop,
}

/// Mode after applying a command.
pub fn transition(mode: DebugMode, cmd: DebugCommand) -> DebugMode {
    use DebugCommand as C;
    use DebugMode as M;
    match (mode, cmd) {
        (M::Paused, C::Pause) => M::Paused,
        (M::Off, C::Pause) | (M::Run, C::Pause) | (M::Step, C::Pause) => M::Step,
        (_, C::Continue) => M::Run,
        (_, C::Step) => M::Step,
        (_, C::Stop) => M::Off,
    }
}

/// VM state captured when a program pauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub pc: Address,
    pub sp: usize,
    pub halted: bool,
    pub error: bool,
    pub step_count: u32,
    pub vars: Vec<Val>,
    pub stack: Vec<Val>,
    pub error_message: String,
}

impl Snapshot {
    pub fn capture(vm: &Vm) -> Snapshot {
        let error_message = match vm.error() {
            Some(error) => error.to_string().chars().take(SNAPSHOT_MESSAGE_LEN).collect(),
            None => String::new(),
        };
        Snapshot {
            pc: vm.pc(),
            sp: vm.stack().len(),
            halted: vm.is_halted(),
            error: vm.error().is_some(),
            step_count: vm.step_count(),
            vars: vm.vars().to_vec(),
            stack: vm.stack().iter().copied().collect(),
            error_message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The program halted. Variables may be kept.
    Completed,
    Faulted(Error),
    /// Stopped early; the frame is held by the debugger.
    Paused,
}

/// ## Per-program debugger
///
/// Gates a VM run instruction by instruction while the mode is not `Off`.
/// A run that pauses leaves its frame here so the next tick continues
/// from the same instruction.

#[derive(Debug, Clone)]
pub struct Debugger {
    mode: DebugMode,
    breakpoints: [Option<Address>; MAX_BREAKPOINTS],
    snapshot: Option<Snapshot>,
    pause_reason: PauseReason,
    hit_breakpoint_pc: Option<Address>,
    total_steps_debugged: u32,
    breakpoint_hits: u32,
    suspended: Option<Frame>,
    skip_breakpoint_at: Option<Address>,
}

impl Default for Debugger {
    fn default() -> Self {
        Debugger {
            mode: DebugMode::Off,
            breakpoints: [None; MAX_BREAKPOINTS],
            snapshot: None,
            pause_reason: PauseReason::None,
            hit_breakpoint_pc: None,
            total_steps_debugged: 0,
            breakpoint_hits: 0,
            suspended: None,
            skip_breakpoint_at: None,
        }
    }
}

impl Debugger {
    pub fn new() -> Debugger {
        Debugger::default()
    }

    pub fn mode(&self) -> DebugMode {
        self.mode
    }

    pub fn is_paused(&self) -> bool {
        self.mode == DebugMode::Paused
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn pause_reason(&self) -> PauseReason {
        self.pause_reason
    }

    pub fn hit_breakpoint_pc(&self) -> Option<Address> {
        self.hit_breakpoint_pc
    }

    pub fn total_steps_debugged(&self) -> u32 {
        self.total_steps_debugged
    }

    pub fn breakpoint_hits(&self) -> u32 {
        self.breakpoint_hits
    }

    pub fn has_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    pub fn command(&mut self, cmd: DebugCommand) {
        match cmd {
            DebugCommand::Pause => self.pause(),
            DebugCommand::Continue => self.resume(),
            DebugCommand::Step => self.step(),
            DebugCommand::Stop => self.stop(),
        }
    }

    /// Pauses after the instruction in flight.
    pub fn pause(&mut self) {
        self.mode = transition(self.mode, DebugCommand::Pause);
        self.pause_reason = PauseReason::PauseCmd;
    }

    pub fn resume(&mut self) {
        self.mode = transition(self.mode, DebugCommand::Continue);
        self.snapshot = None;
        self.pause_reason = PauseReason::None;
    }

    pub fn step(&mut self) {
        self.mode = transition(self.mode, DebugCommand::Step);
        self.snapshot = None;
        self.pause_reason = PauseReason::None;
    }

    /// Detaches the debugger. A suspended run is abandoned.
    pub fn stop(&mut self) {
        self.mode = transition(self.mode, DebugCommand::Stop);
        self.snapshot = None;
        self.pause_reason = PauseReason::None;
        self.suspended = None;
        self.skip_breakpoint_at = None;
    }

    /// Adds a breakpoint. Adding an existing one succeeds; `false` when
    /// every slot is taken.
    pub fn add_breakpoint(&mut self, pc: Address) -> bool {
        if self.has_breakpoint(pc) {
            return true;
        }
        match self.breakpoints.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(pc);
                true
            }
            None => false,
        }
    }

    pub fn remove_breakpoint(&mut self, pc: Address) -> bool {
        match self.breakpoints.iter_mut().find(|slot| **slot == Some(pc)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints = [None; MAX_BREAKPOINTS];
    }

    pub fn has_breakpoint(&self, pc: Address) -> bool {
        self.breakpoints.contains(&Some(pc))
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = (usize, Address)> + '_ {
        self.breakpoints
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|pc| (i, pc)))
    }

    pub fn breakpoint_count(&self) -> usize {
        self.breakpoints.iter().filter(|slot| slot.is_some()).count()
    }

    /// Frame left by a paused run, if any.
    pub fn take_suspended(&mut self) -> Option<Frame> {
        self.suspended.take()
    }

    fn enter_pause(&mut self, vm: &Vm, reason: PauseReason) {
        self.snapshot = Some(Snapshot::capture(vm));
        self.pause_reason = reason;
        self.mode = DebugMode::Paused;
    }

    /// Runs `vm` under debugger control. With the debugger off this is
    /// a plain `Vm::run`.
    pub fn run(&mut self, vm: &mut Vm, max_steps: u32) -> RunOutcome {
        if self.mode == DebugMode::Off {
            return match vm.run(max_steps) {
                Ok(()) => RunOutcome::Completed,
                Err(error) => RunOutcome::Faulted(error),
            };
        }
        loop {
            let pc = vm.pc();
            let resumed_here = self.skip_breakpoint_at.take() == Some(pc);
            if !resumed_here && self.has_breakpoint(pc) {
                self.hit_breakpoint_pc = Some(pc);
                self.breakpoint_hits += 1;
                self.skip_breakpoint_at = Some(pc);
                self.enter_pause(vm, PauseReason::Breakpoint);
                self.suspended = Some(vm.frame());
                return RunOutcome::Paused;
            }
            if let Err(error) = vm.check_step_limit(max_steps) {
                self.enter_pause(vm, PauseReason::Error);
                return RunOutcome::Faulted(error);
            }
            match vm.step() {
                Step::Continue => {
                    self.total_steps_debugged += 1;
                    if self.mode == DebugMode::Step {
                        let reason = match self.pause_reason {
                            PauseReason::PauseCmd => PauseReason::PauseCmd,
                            _ => PauseReason::Step,
                        };
                        self.enter_pause(vm, reason);
                        self.suspended = Some(vm.frame());
                        return RunOutcome::Paused;
                    }
                }
                Step::Halted => {
                    self.total_steps_debugged += 1;
                    if self.mode == DebugMode::Step {
                        self.enter_pause(vm, PauseReason::Halt);
                    }
                    return RunOutcome::Completed;
                }
                Step::Error => {
                    self.total_steps_debugged += 1;
                    self.enter_pause(vm, PauseReason::Error);
                    return match vm.error() {
                        Some(error) => RunOutcome::Faulted(error.clone()),
                        None => RunOutcome::Faulted(crate::error!(InternalError)),
                    };
                }
            }
        }
    }

    pub fn state_text(&self, program: Option<&BytecodeProgram>) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "=== Debug State ===");
        let _ = writeln!(s, "Mode: {}", self.mode);
        match &self.snapshot {
            Some(snap) => {
                match program {
                    Some(p) => {
                        let _ = writeln!(s, "PC: {} / {}", snap.pc, p.instruction_count());
                    }
                    None => {
                        let _ = writeln!(s, "PC: {}", snap.pc);
                    }
                }
                let _ = writeln!(s, "Stack Depth: {} / {}", snap.sp, STACK_DEPTH);
                let _ = writeln!(s, "Steps Executed: {}", snap.step_count);
                let _ = writeln!(s, "Pause Reason: {}", self.pause_reason);
                if self.pause_reason == PauseReason::Breakpoint {
                    if let Some(pc) = self.hit_breakpoint_pc {
                        let _ = writeln!(s, "Hit Breakpoint PC: {}", pc);
                    }
                }
                if snap.error {
                    let _ = writeln!(s, "Error: {}", snap.error_message);
                }
            }
            None => {
                let _ = writeln!(s, "(no snapshot - program not paused)");
            }
        }
        let _ = writeln!(s, "Breakpoints: {}", self.breakpoint_count());
        let _ = writeln!(s, "Total Steps Debugged: {}", self.total_steps_debugged);
        let _ = writeln!(s, "Breakpoints Hit: {}", self.breakpoint_hits);
        s
    }

    pub fn vars_text(&self, program: &BytecodeProgram) -> Option<String> {
        let snap = self.snapshot.as_ref()?;
        let mut s = String::from("=== Variables ===\n");
        for (i, val) in snap.vars.iter().enumerate() {
            let name = match program.var(i) {
                Some(var) => var.name.clone(),
                None => format!("VAR{}", i),
            };
            let _ = match val {
                Val::Bool(_) => writeln!(s, "  {} = {}", name, val),
                Val::Dword(n) => writeln!(s, "  {} = 0x{:08X} (DWORD)", name, n),
                _ => writeln!(s, "  {} = {} ({})", name, val, val.data_type()),
            };
        }
        Some(s)
    }

    pub fn stack_text(&self) -> Option<String> {
        let snap = self.snapshot.as_ref()?;
        let mut s = format!("=== Stack (depth {}) ===\n", snap.sp);
        if snap.stack.is_empty() {
            s.push_str("  (empty)\n");
        }
        for (i, val) in snap.stack.iter().enumerate().rev() {
            let _ = writeln!(s, "  [{}] {} ({})", i, val, val.data_type());
        }
        Some(s)
    }

    pub fn breakpoints_text(&self) -> String {
        let mut s = format!("=== Breakpoints ({}) ===\n", self.breakpoint_count());
        if self.breakpoint_count() == 0 {
            s.push_str("  (none)\n");
        }
        for (slot, pc) in self.breakpoints() {
            let _ = writeln!(s, "  [{}] PC={}", slot, pc);
        }
        s
    }

    pub fn instruction_text(&self, program: &BytecodeProgram) -> Option<String> {
        let snap = self.snapshot.as_ref()?;
        Some(match program.op(snap.pc) {
            Some(op) => format!("[PC={}] {}", snap.pc, op),
            None => "PC out of bounds (program halted)".to_string(),
        })
    }
}
