use super::*;
use crate::engine::{Command, Inspect, ProgramSet, Target};
use crate::lang::ErrorCode;
use crate::mach::DebugCommand;

fn parse_error(line: &str) -> ErrorCode {
    let error = Command::parse(line).unwrap_err();
    for code in &[
        ErrorCode::SyntaxError,
        ErrorCode::InvalidProgramId,
        ErrorCode::InvalidBreakpoint,
        ErrorCode::InvalidTarget,
        ErrorCode::InvalidInterval,
    ] {
        if error.is(*code) {
            return *code;
        }
    }
    panic!("{}", error)
}

fn temp_file(name: &str, contents: &[u8]) -> String {
    let path = std::env::temp_dir().join(format!("stlogic-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_parse() {
    assert_eq!(Command::parse("compile 1").unwrap(), Command::Compile(0));
    assert_eq!(Command::parse("ENABLE 4").unwrap(), Command::Enable(3));
    assert_eq!(
        Command::parse("bind 2 level hr 100").unwrap(),
        Command::Bind(1, "level".to_string(), Target::HoldingRegister(100))
    );
    assert_eq!(Command::parse("debug ON").unwrap(), Command::Debug(true));
    assert_eq!(Command::parse("interval 25").unwrap(), Command::Interval(25));
    assert_eq!(Command::parse("reset all").unwrap(), Command::Reset(ProgramSet::All));
    assert_eq!(Command::parse("reset 3").unwrap(), Command::Reset(ProgramSet::One(2)));
    assert_eq!(
        Command::parse("continue 1").unwrap(),
        Command::Debugger(0, DebugCommand::Continue)
    );
    assert_eq!(Command::parse("break 1 12").unwrap(), Command::Break(0, 12));
    assert_eq!(Command::parse("clear 1").unwrap(), Command::Clear(0, None));
    assert_eq!(Command::parse("clear 1 3").unwrap(), Command::Clear(0, Some(3)));
    assert_eq!(Command::parse("show 2 code").unwrap(), Command::Show(1, Inspect::Code));
    assert_eq!(Command::parse("  status ").unwrap(), Command::Status);
}

#[test]
fn test_parse_errors() {
    assert_eq!(parse_error("compile 0"), ErrorCode::InvalidProgramId);
    assert_eq!(parse_error("compile 5"), ErrorCode::InvalidProgramId);
    assert_eq!(parse_error("bind 9 x hr 1"), ErrorCode::InvalidProgramId);
    assert_eq!(parse_error("compile"), ErrorCode::SyntaxError);
    assert_eq!(parse_error("frobnicate"), ErrorCode::SyntaxError);
    assert_eq!(parse_error("break 1 ten"), ErrorCode::InvalidBreakpoint);
    assert_eq!(parse_error("bind 1 x gpio 4"), ErrorCode::InvalidTarget);
    assert_eq!(parse_error("interval fast"), ErrorCode::InvalidInterval);
    assert_eq!(parse_error("show 1 everything"), ErrorCode::SyntaxError);
    assert_eq!(parse_error(""), ErrorCode::SyntaxError);
}

#[test]
fn test_upload_and_inspect() {
    let (mut engine, clock) = engine();
    let mut registers = Registers::new();
    let path = temp_file("counter.st", COUNTER.as_bytes());
    let text = engine.execute(Command::parse(&format!("upload 1 {}", path)).unwrap()).unwrap();
    assert_eq!(text, "Logic1 compiled: 13 instructions, 2 variables");
    engine.execute(Command::Enable(0)).unwrap();
    engine.execute(Command::Break(0, 4)).unwrap();
    let error = engine.execute(Command::Break(0, 13)).unwrap_err();
    assert!(error.is(ErrorCode::InvalidBreakpoint));
    engine
        .execute(Command::Debugger(0, DebugCommand::Continue))
        .unwrap();
    fire(&mut engine, &clock, &mut registers);

    let code = engine.execute(Command::Show(0, Inspect::Code)).unwrap();
    assert!(code.lines().nth(4).unwrap().starts_with("*>[  4] LOAD_VAR"));
    let pc = engine.execute(Command::Show(0, Inspect::Pc)).unwrap();
    assert_eq!(pc, "[PC=4] LOAD_VAR 0");
    let vars = engine.execute(Command::Show(0, Inspect::Vars)).unwrap();
    assert!(vars.contains("  X = 1 (INT)"));
    let status = engine.execute(Command::Status).unwrap();
    assert!(status.contains("Logic1"));
    assert!(status.contains("PAUSED"));

    let error = engine.execute(Command::Clear(0, Some(9))).unwrap_err();
    assert!(error.is(ErrorCode::InvalidBreakpoint));
    engine.execute(Command::Clear(0, None)).unwrap();
    engine
        .execute(Command::Debugger(0, DebugCommand::Stop))
        .unwrap();
    let stack = engine.execute(Command::Show(0, Inspect::Stack)).unwrap();
    assert_eq!(stack, "Logic1 is not paused");
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_save_and_load_files() {
    let (mut engine, _) = engine();
    load(&mut engine, 0, COUNTER);
    let path = temp_file("config.bin", b"");
    engine.execute(Command::Save(path.clone())).unwrap();
    engine.execute(Command::Delete(0)).unwrap();
    assert!(!engine.program(0).unwrap().is_compiled());
    engine.execute(Command::Load(path.clone())).unwrap();
    assert!(engine.program(0).unwrap().is_compiled());
    let error = engine
        .execute(Command::Load("/nonexistent/stlogic.bin".to_string()))
        .unwrap_err();
    assert!(error.is(ErrorCode::FileNotFound));
    let pool = engine.execute(Command::Pool).unwrap();
    assert!(pool.contains(&format!("{} / 8000 bytes used", COUNTER.len())));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_compact_command() {
    let (mut engine, _) = engine();
    load(&mut engine, 0, "VAR a, b : REAL EXPORT; END_VAR");
    load(&mut engine, 1, "VAR c : INT EXPORT; END_VAR");
    engine.delete(0).unwrap();
    assert_eq!(engine.sources().region(1).unwrap().offset as usize, 31);
    assert_eq!(engine.ir_pool().allocation(1).unwrap().offset, 4);

    assert_eq!(Command::parse("compact").unwrap(), Command::Compact);
    let text = engine.execute(Command::Compact).unwrap();
    assert_eq!(engine.sources().region(1).unwrap().offset, 0);
    assert_eq!(engine.ir_pool().allocation(1).unwrap().offset, 0);
    assert!(text.contains("IR 220..220"));
}
