use super::{Engine, Target};
use crate::error;
use crate::lang::Error;
use crate::mach::{DebugCommand, Listing};
use crate::pool::{IR_POOL_SIZE, MAX_PROGRAMS, SOURCE_POOL_SIZE};
use std::fmt::Write;

type Result<T> = std::result::Result<T, Error>;

/// What `show` prints for a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inspect {
    State,
    Vars,
    Stack,
    Breaks,
    Pc,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramSet {
    One(usize),
    All,
}

/// ## Management commands
///
/// Program ids are typed 1 to 4 and held 0-based.

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Upload(usize, String),
    Compile(usize),
    Enable(usize),
    Disable(usize),
    Delete(usize),
    Bind(usize, String, Target),
    Unbind(usize, String),
    Debug(bool),
    Interval(u32),
    Reset(ProgramSet),
    Debugger(usize, DebugCommand),
    Break(usize, usize),
    Clear(usize, Option<usize>),
    Show(usize, Inspect),
    Status,
    Pool,
    Compact,
    Save(String),
    Load(String),
    Help,
}

pub const HELP: &str = "\
upload <id> <file>      store and compile a source file
compile <id>            compile the stored source
enable|disable <id>     switch a program on or off
delete <id>             free the program slot
bind <id> <var> <hr|ir|coil|di> <addr>
unbind <id> <var>
debug on|off            log every program execution
interval <ms>           10, 20, 25, 50, 75 or 100
reset <id|all>          clear statistics
pause|continue|step|stop <id>
break <id> <pc>         clear <id> [pc]
show <id> state|vars|stack|breaks|pc|code
compact                 close gaps in both pools
status  pool  save <file>  load <file>  quit";

fn syntax(msg: &str) -> Error {
    error!(SyntaxError; msg)
}

fn program_id(word: Option<&&str>) -> Result<usize> {
    let word = match word {
        Some(word) => *word,
        None => return Err(syntax("EXPECTED PROGRAM ID")),
    };
    match word.parse::<usize>() {
        Ok(n) if n >= 1 && n <= MAX_PROGRAMS => Ok(n - 1),
        _ => {
            let msg = format!("{}; USE 1 TO {}", word, MAX_PROGRAMS);
            Err(error!(InvalidProgramId; &msg))
        }
    }
}

fn word<'a>(words: &[&'a str], idx: usize, what: &str) -> Result<&'a str> {
    match words.get(idx) {
        Some(word) => Ok(*word),
        None => Err(syntax(&format!("EXPECTED {}", what))),
    }
}

fn pc(word: &str) -> Result<usize> {
    match word.parse() {
        Ok(pc) => Ok(pc),
        Err(_) => Err(error!(InvalidBreakpoint; &format!("BAD PC {}", word))),
    }
}

impl Command {
    /// Parses one console line. Keywords are case-insensitive.
    pub fn parse(line: &str) -> Result<Command> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let verb = match words.first() {
            Some(verb) => verb.to_ascii_lowercase(),
            None => return Err(syntax("EMPTY COMMAND")),
        };
        let id = || program_id(words.get(1));
        Ok(match verb.as_str() {
            "upload" => Command::Upload(id()?, word(&words, 2, "FILE NAME")?.to_string()),
            "compile" => Command::Compile(id()?),
            "enable" => Command::Enable(id()?),
            "disable" => Command::Disable(id()?),
            "delete" => Command::Delete(id()?),
            "bind" => {
                let id = id()?;
                let var = word(&words, 2, "VARIABLE")?.to_string();
                let target = Target::parse(
                    word(&words, 3, "hr, ir, coil OR di")?,
                    word(&words, 4, "ADDRESS")?,
                )?;
                Command::Bind(id, var, target)
            }
            "unbind" => Command::Unbind(id()?, word(&words, 2, "VARIABLE")?.to_string()),
            "debug" => match word(&words, 1, "on OR off")?.to_ascii_lowercase().as_str() {
                "on" => Command::Debug(true),
                "off" => Command::Debug(false),
                other => return Err(syntax(&format!("EXPECTED on OR off, GOT {}", other))),
            },
            "interval" => {
                let ms = word(&words, 1, "MILLISECONDS")?;
                match ms.parse() {
                    Ok(ms) => Command::Interval(ms),
                    Err(_) => return Err(error!(InvalidInterval; ms)),
                }
            }
            "reset" => match words.get(1) {
                Some(w) if w.eq_ignore_ascii_case("all") => Command::Reset(ProgramSet::All),
                _ => Command::Reset(ProgramSet::One(id()?)),
            },
            "pause" => Command::Debugger(id()?, DebugCommand::Pause),
            "continue" => Command::Debugger(id()?, DebugCommand::Continue),
            "step" => Command::Debugger(id()?, DebugCommand::Step),
            "stop" => Command::Debugger(id()?, DebugCommand::Stop),
            "break" => Command::Break(id()?, pc(word(&words, 2, "PC")?)?),
            "clear" => {
                let id = id()?;
                match words.get(2) {
                    Some(w) => Command::Clear(id, Some(pc(w)?)),
                    None => Command::Clear(id, None),
                }
            }
            "show" => {
                let id = id()?;
                let what = word(&words, 2, "state, vars, stack, breaks, pc OR code")?;
                let inspect = match what.to_ascii_lowercase().as_str() {
                    "state" => Inspect::State,
                    "vars" => Inspect::Vars,
                    "stack" => Inspect::Stack,
                    "breaks" => Inspect::Breaks,
                    "pc" => Inspect::Pc,
                    "code" => Inspect::Code,
                    other => return Err(syntax(&format!("CANNOT SHOW {}", other))),
                };
                Command::Show(id, inspect)
            }
            "status" => Command::Status,
            "pool" => Command::Pool,
            "compact" => Command::Compact,
            "save" => Command::Save(word(&words, 1, "FILE NAME")?.to_string()),
            "load" => Command::Load(word(&words, 1, "FILE NAME")?.to_string()),
            "help" | "?" => Command::Help,
            other => return Err(syntax(&format!("UNKNOWN COMMAND {}", other))),
        })
    }
}

fn read_file(path: &str) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) => Err(error!(FileNotFound; &format!("{}: {}", path, e))),
    }
}

impl Engine {
    /// Applies a command and returns the text to print.
    pub fn execute(&mut self, command: Command) -> Result<String> {
        use Command::*;
        Ok(match command {
            Upload(id, path) => {
                let source = read_file(&path)?;
                self.upload(id, &source)?;
                self.compile(id)?;
                self.compiled_text(id)
            }
            Compile(id) => {
                self.compile(id)?;
                self.compiled_text(id)
            }
            Enable(id) => {
                self.set_enabled(id, true)?;
                format!("{} enabled", self.programs[id].name)
            }
            Disable(id) => {
                self.set_enabled(id, false)?;
                format!("{} disabled", self.programs[id].name)
            }
            Delete(id) => {
                self.delete(id)?;
                format!("{} deleted", self.programs[id].name)
            }
            Bind(id, var, target) => {
                self.bind(id, &var, target)?;
                format!("{}.{} bound to {}", self.programs[id].name, var.to_ascii_uppercase(), target)
            }
            Unbind(id, var) => {
                if self.unbind(id, &var)? {
                    format!("{}.{} unbound", self.programs[id].name, var.to_ascii_uppercase())
                } else {
                    format!("{}.{} was not bound", self.programs[id].name, var.to_ascii_uppercase())
                }
            }
            Debug(on) => {
                self.set_debug(on);
                format!("debug {}", if on { "on" } else { "off" })
            }
            Interval(ms) => {
                self.set_interval(ms)?;
                format!("interval {}", self.interval())
            }
            Reset(ProgramSet::All) => {
                self.reset_all_stats();
                "statistics reset".to_string()
            }
            Reset(ProgramSet::One(id)) => {
                self.reset_stats(id)?;
                format!("{} statistics reset", self.programs[id].name)
            }
            Debugger(id, cmd) => {
                let debugger = self.debugger_mut(id)?;
                debugger.command(cmd);
                format!("{} debug mode {}", self.programs[id].name, self.debuggers[id].mode())
            }
            Break(id, pc) => {
                self.add_breakpoint(id, pc)?;
                format!("breakpoint at PC {}", pc)
            }
            Clear(id, Some(pc)) => {
                if self.debugger_mut(id)?.remove_breakpoint(pc) {
                    format!("breakpoint at PC {} cleared", pc)
                } else {
                    return Err(error!(InvalidBreakpoint; &format!("NONE AT PC {}", pc)));
                }
            }
            Clear(id, None) => {
                self.debugger_mut(id)?.clear_breakpoints();
                "breakpoints cleared".to_string()
            }
            Show(id, inspect) => self.show(id, inspect)?,
            Status => self.status_text(),
            Pool => self.pool_text(),
            Compact => {
                self.compact_sources();
                self.compact_ir_pool();
                self.pool_text()
            }
            Save(path) => {
                let blob = self.save_to_config();
                if let Err(e) = std::fs::write(&path, &blob) {
                    return Err(error!(FileNotFound; &format!("{}: {}", path, e)));
                }
                format!("saved {} bytes to {}", blob.len(), path)
            }
            Load(path) => {
                let blob = read_file(&path)?;
                self.load_from_config(&blob)?;
                format!("loaded {}", path)
            }
            Help => HELP.to_string(),
        })
    }

    fn compiled_text(&self, id: usize) -> String {
        let program = &self.programs[id];
        match program.bytecode() {
            Some(bytecode) => {
                let mut text = format!(
                    "{} compiled: {} instructions, {} variables",
                    program.name,
                    bytecode.instruction_count(),
                    bytecode.var_count()
                );
                if let Some(error) = program.last_error() {
                    let _ = write!(text, "; {}", error);
                }
                text
            }
            None => format!("{} not compiled", program.name),
        }
    }

    pub fn show(&self, id: usize, inspect: Inspect) -> Result<String> {
        let program = self.program(id)?;
        let debugger = &self.debuggers[id];
        let bytecode = match program.bytecode() {
            Some(bytecode) => bytecode,
            None if inspect == Inspect::State || inspect == Inspect::Breaks => {
                return Ok(match inspect {
                    Inspect::State => debugger.state_text(None),
                    _ => debugger.breakpoints_text(),
                })
            }
            None => return Err(error!(NotCompiled; &program.name)),
        };
        let not_paused = || format!("{} is not paused", program.name);
        Ok(match inspect {
            Inspect::State => debugger.state_text(Some(bytecode)),
            Inspect::Breaks => debugger.breakpoints_text(),
            Inspect::Stack => debugger.stack_text().unwrap_or_else(not_paused),
            Inspect::Pc => debugger.instruction_text(bytecode).unwrap_or_else(not_paused),
            Inspect::Code => Listing::new(bytecode).lines(Some(debugger)).join("\n"),
            Inspect::Vars => match debugger.vars_text(bytecode) {
                Some(text) => text,
                None => {
                    let mut s = String::from("=== Variables ===\n");
                    for (var, val) in bytecode.vars().iter().zip(program.values()) {
                        let _ = writeln!(s, "  {} = {} ({})", var.name, val, var.data_type);
                    }
                    s
                }
            },
        })
    }

    pub fn status_text(&self) -> String {
        let mut s = String::new();
        let cycle = &self.cycle;
        let _ = writeln!(
            s,
            "Engine: {}, interval {}, debug {}",
            if self.config.enabled { "enabled" } else { "disabled" },
            self.config.interval,
            if self.config.debug { "on" } else { "off" }
        );
        let avg = match cycle.total_cycles {
            0 => 0,
            n => cycle.total_us / n as u64,
        };
        let _ = writeln!(
            s,
            "Cycles: {} (min {}us, max {}us, avg {}us, {} overruns)",
            cycle.total_cycles, cycle.min_us, cycle.max_us, avg, cycle.overrun_count
        );
        for (id, program) in self.programs.iter().enumerate() {
            let stats = &program.stats;
            let _ = writeln!(
                s,
                "{:<8} {:<8} {:<12} {:<6} runs {} errors {} last {}us min {}us max {}us avg {}us overruns {} bindings {}",
                program.name,
                if program.enabled { "enabled" } else { "disabled" },
                if program.is_compiled() { "compiled" } else { "not compiled" },
                self.debuggers[id].mode().to_string(),
                stats.execution_count,
                stats.error_count,
                stats.last_us,
                stats.min_us,
                stats.max_us,
                stats.average_us(),
                stats.overrun_count,
                program.binding_count,
            );
            if let Some(error) = program.last_error() {
                let _ = writeln!(s, "         last error: {}", error);
            }
        }
        s
    }

    pub fn pool_text(&self) -> String {
        let mut s = String::new();
        let stats = self.sources.stats();
        let _ = writeln!(
            s,
            "Source pool: {} / {} bytes used, {} free, largest block {}",
            stats.used, SOURCE_POOL_SIZE, stats.free, stats.largest_contiguous
        );
        for id in 0..MAX_PROGRAMS {
            if let Some(region) = self.sources.region(id) {
                let _ = writeln!(s, "  {} @{} +{}", self.programs[id].name, region.offset, region.size);
            }
        }
        let _ = writeln!(
            s,
            "IR pool: {} / {} registers used",
            self.ir_pool.used(),
            IR_POOL_SIZE
        );
        for id in 0..MAX_PROGRAMS {
            if let Some(allocation) = self.ir_pool.allocation(id) {
                let _ = writeln!(
                    s,
                    "  {} IR {}..{}",
                    self.programs[id].name,
                    allocation.base(),
                    allocation.base() + allocation.size as u16 - 1
                );
            }
        }
        s
    }
}
