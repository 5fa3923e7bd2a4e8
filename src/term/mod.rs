extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use ansi_term::{Colour, Style};
use linefeed::{Completer, Completion, Interface, Prompter, ReadResult, Terminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stlogic::engine::{Command, Engine, EngineConfig, ProgramRun, Registers};
use stlogic::mach::PauseReason;
use stlogic::pool::MAX_PROGRAMS;
use tracing_subscriber::EnvFilter;

const VERBS: &[&str] = &[
    "upload", "compile", "enable", "disable", "delete", "bind", "unbind", "debug", "interval",
    "reset", "pause", "continue", "step", "stop", "break", "clear", "show", "status", "pool", "compact",
    "save", "load", "help", "quit",
];

pub fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,stlogic=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    if let Err(error) = main_loop(interrupted) {
        eprintln!("{}", error);
    }
}

fn main_loop(interrupted: Arc<AtomicBool>) -> std::io::Result<()> {
    let mut engine = Engine::new(EngineConfig::default());
    let mut registers = Registers::new();
    let interface = Interface::new("stlogic")?;
    interface.set_prompt("st> ")?;
    interface.set_completer(Arc::new(VerbCompleter));

    if let Some(path) = std::env::args().nth(1) {
        print_result(&interface, engine.execute(Command::Load(path)))?;
    }
    interface.write_fmt(format_args!("ST LOGIC READY. TYPE help FOR COMMANDS.\n"))?;

    let mut faulted = [false; MAX_PROGRAMS];
    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            engine.pause_all();
            interface.write_fmt(format_args!("pausing all programs\n"))?;
        }
        let was_paused: Vec<bool> = (0..MAX_PROGRAMS).map(|id| engine.is_paused(id)).collect();
        if let Some(report) = engine.tick(&mut registers) {
            for (id, run) in &report.runs {
                let name = &engine.programs()[*id].name;
                match run {
                    ProgramRun::Faulted(error) => {
                        if !faulted[*id] {
                            let text = format!("{}: {}", name, error);
                            interface
                                .write_fmt(format_args!("{}\n", Style::new().bold().paint(text)))?;
                        }
                        faulted[*id] = true;
                    }
                    ProgramRun::Completed { .. } => faulted[*id] = false,
                    ProgramRun::Paused if !was_paused[*id] => {
                        interface.write_fmt(format_args!("{}\n", pause_text(&engine, *id)))?;
                    }
                    ProgramRun::Paused => {}
                }
            }
        }

        let timeout = Duration::from_millis(engine.interval().as_ms() as u64);
        let line = match interface.read_line_step(Some(timeout))? {
            None => continue,
            Some(ReadResult::Input(line)) => line,
            Some(ReadResult::Signal(_)) | Some(ReadResult::Eof) => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        interface.add_history_unique(line.clone());
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }
        let result = Command::parse(trimmed).and_then(|command| {
            let show_code = matches!(command, Command::Show(_, stlogic::engine::Inspect::Code));
            engine
                .execute(command)
                .map(|text| if show_code { decorate_listing(&text) } else { text })
        });
        print_result(&interface, result)?;
    }
    Ok(())
}

fn print_result<T: Terminal>(
    interface: &Interface<T>,
    result: Result<String, stlogic::lang::Error>,
) -> std::io::Result<()> {
    match result {
        Ok(text) => interface.write_fmt(format_args!("{}\n", text.trim_end())),
        Err(error) => interface.write_fmt(format_args!(
            "{}\n",
            Style::new().bold().paint(error.to_string())
        )),
    }
}

/// Breakpoint lines in red, the paused instruction in bold.
fn decorate_listing(text: &str) -> String {
    text.lines()
        .map(|line| {
            let mut chars = line.chars();
            let breakpoint = chars.next() == Some('*');
            let current = chars.next() == Some('>');
            match (breakpoint, current) {
                (_, true) => Style::new().bold().paint(line).to_string(),
                (true, false) => Colour::Red.paint(line).to_string(),
                (false, false) => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct VerbCompleter;

impl<Term: Terminal> Completer<Term> for VerbCompleter {
    fn complete(
        &self,
        word: &str,
        prompter: &Prompter<Term>,
        start: usize,
        _end: usize,
    ) -> Option<Vec<Completion>> {
        if prompter.buffer()[..start].trim().is_empty() {
            let word = word.to_ascii_lowercase();
            let list: Vec<Completion> = VERBS
                .iter()
                .filter(|verb| verb.starts_with(&word))
                .map(|verb| Completion::simple(verb.to_string()))
                .collect();
            return Some(list);
        }
        None
    }
}

/// One line describing where a program just paused.
fn pause_text(engine: &Engine, id: usize) -> String {
    let name = &engine.programs()[id].name;
    let debugger = match engine.debugger(id) {
        Ok(debugger) => debugger,
        Err(error) => return error.to_string(),
    };
    let snapshot = debugger.snapshot();
    let pc = snapshot.map(|snap| snap.pc).unwrap_or(0);
    match debugger.pause_reason() {
        PauseReason::Error => format!(
            "{} paused on error at PC {}: {}",
            name,
            pc,
            snapshot.map(|snap| snap.error_message.as_str()).unwrap_or("")
        ),
        reason => format!("{} paused at PC {} ({})", name, pc, reason),
    }
}
