use super::{Address, BytecodeProgram, Debugger, Opcode};

/// ## Bytecode listing
///
/// One line per instruction: `[pc] MNEMONIC           argument`.
/// Variable operands are shown by name. A `*` marks a breakpoint and
/// a `>` marks the instruction a paused program stopped at.

pub struct Listing<'a> {
    program: &'a BytecodeProgram,
}

impl<'a> Listing<'a> {
    pub fn new(program: &'a BytecodeProgram) -> Listing<'a> {
        Listing { program }
    }

    fn argument(&self, op: &Opcode) -> String {
        match op {
            Opcode::Load(idx) | Opcode::Store(idx) => match self.program.var(*idx) {
                Some(var) => var.name.clone(),
                None => format!("#{}", idx),
            },
            _ => op.argument().unwrap_or_default(),
        }
    }

    pub fn line(&self, addr: Address, breakpoint: bool, current: bool) -> Option<String> {
        let op = self.program.op(addr)?;
        let line = format!("[{:3}] {:<18} {}", addr, op.mnemonic(), self.argument(op));
        Some(format!(
            "{}{}{}",
            if breakpoint { '*' } else { ' ' },
            if current { '>' } else { ' ' },
            line.trim_end()
        ))
    }

    pub fn lines(&self, debugger: Option<&Debugger>) -> Vec<String> {
        let current = debugger
            .filter(|d| d.is_paused())
            .and_then(|d| d.snapshot())
            .map(|snap| snap.pc);
        (0..self.program.instruction_count())
            .filter_map(|addr| {
                let breakpoint = debugger.map_or(false, |d| d.has_breakpoint(addr));
                self.line(addr, breakpoint, current == Some(addr))
            })
            .collect()
    }

    /// Variable table, one line per variable.
    pub fn variables(&self) -> Vec<String> {
        self.program
            .vars()
            .iter()
            .enumerate()
            .map(|(idx, var)| {
                format!(
                    "[{:2}] {:<16} {:<6} {:?}{} := {}",
                    idx,
                    var.name,
                    var.data_type.to_string(),
                    var.class,
                    if var.export { " EXPORT" } else { "" },
                    var.initial
                )
            })
            .collect()
    }
}
