use crate::mach::{BytecodeProgram, Val};
use std::sync::{Arc, Mutex};

/// Persisted variable values, shared with the binding synchroniser.
pub type SharedVars = Arc<Mutex<Vec<Val>>>;

/// Longest `last_error` text kept for a program.
pub const LAST_ERROR_LEN: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecStats {
    pub execution_count: u32,
    pub error_count: u32,
    pub last_us: u32,
    pub min_us: u32,
    pub max_us: u32,
    pub total_us: u64,
    pub overrun_count: u32,
}

impl ExecStats {
    /// Accounts one completed run. Returns true when it overran `interval_ms`.
    pub fn record(&mut self, elapsed_us: u32, interval_ms: u32) -> bool {
        self.execution_count = self.execution_count.wrapping_add(1);
        self.last_us = elapsed_us;
        if self.execution_count == 1 || elapsed_us < self.min_us {
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

    pub fn average_us(&self) -> u32 {
        match self.execution_count {
            0 => 0,
            n => (self.total_us / n as u64) as u32,
        }
    }

    pub fn reset(&mut self) {
        *self = ExecStats::default();
    }
}

/// ## One logic slot
///
/// `compiled` is exactly "has bytecode". Variable values survive across
/// ticks and are replaced when the program is recompiled.

#[derive(Debug, Clone)]
pub struct LogicProgram {
    id: usize,
    pub name: String,
    pub enabled: bool,
    bytecode: Option<BytecodeProgram>,
    vars: SharedVars,
    pub stats: ExecStats,
    last_error: Option<String>,
    pub binding_count: u16,
}

impl LogicProgram {
    pub fn new(id: usize) -> LogicProgram {
        LogicProgram {
            id,
            name: format!("Logic{}", id + 1),
            enabled: false,
            bytecode: None,
            vars: Arc::new(Mutex::new(vec![])),
            stats: ExecStats::default(),
            last_error: None,
            binding_count: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_compiled(&self) -> bool {
        self.bytecode.is_some()
    }

    pub fn bytecode(&self) -> Option<&BytecodeProgram> {
        self.bytecode.as_ref()
    }

    /// Installs new bytecode and seeds the variables from its initializers.
    pub fn install(&mut self, program: BytecodeProgram) {
        self.set_values(program.initial_values());
        self.bytecode = Some(program);
    }

    pub fn uninstall(&mut self) {
        self.bytecode = None;
        self.set_values(vec![]);
    }

    pub fn shared_vars(&self) -> SharedVars {
        Arc::clone(&self.vars)
    }

    pub fn values(&self) -> Vec<Val> {
        match self.vars.lock() {
            Ok(vars) => vars.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_values(&self, values: Vec<Val>) {
        match self.vars.lock() {
            Ok(mut vars) => *vars = values,
            Err(poisoned) => *poisoned.into_inner() = values,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_last_error(&mut self, text: &str) {
        self.last_error = Some(text.chars().take(LAST_ERROR_LEN).collect());
    }

    pub fn clear_error(&mut self) {
        self.stats.error_count = 0;
        self.last_error = None;
    }
}
