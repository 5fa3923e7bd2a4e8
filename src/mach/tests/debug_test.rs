use super::*;
use crate::mach::{
    transition, DebugCommand, DebugMode, Debugger, PauseReason, RunOutcome, MAX_BREAKPOINTS,
};

const COUNTER: &str = "VAR x : INT; y : INT; END_VAR x := x + 1; y := x * 2; x := y - 1;";

/// Runs one tick the way the engine does: resume a held frame or start fresh.
fn tick(debugger: &mut Debugger, program: &BytecodeProgram, vars: &mut Vec<Val>) -> RunOutcome {
    let mut vm = match debugger.take_suspended() {
        Some(frame) => Vm::resume(program, frame),
        None => Vm::new(program, vars),
    };
    let outcome = debugger.run(&mut vm, DEFAULT_MAX_STEPS);
    if outcome == RunOutcome::Completed {
        *vars = vm.into_vars();
    }
    outcome
}

#[test]
fn test_transition_table() {
    use DebugCommand as C;
    use DebugMode as M;
    assert_eq!(transition(M::Off, C::Pause), M::Step);
    assert_eq!(transition(M::Run, C::Pause), M::Step);
    assert_eq!(transition(M::Paused, C::Pause), M::Paused);
    assert_eq!(transition(M::Paused, C::Continue), M::Run);
    assert_eq!(transition(M::Off, C::Step), M::Step);
    assert_eq!(transition(M::Run, C::Stop), M::Off);
}

#[test]
fn test_breakpoint_slots() {
    let mut debugger = Debugger::new();
    assert!(debugger.add_breakpoint(3));
    assert!(debugger.add_breakpoint(3));
    assert_eq!(debugger.breakpoint_count(), 1);
    for pc in 10..10 + MAX_BREAKPOINTS - 1 {
        assert!(debugger.add_breakpoint(pc));
    }
    assert!(!debugger.add_breakpoint(99));
    assert!(debugger.remove_breakpoint(3));
    assert!(!debugger.remove_breakpoint(3));
    assert!(debugger.add_breakpoint(99));
    debugger.clear_breakpoints();
    assert_eq!(debugger.breakpoint_count(), 0);
    assert!(!debugger.has_breakpoint(99));
}

#[test]
fn test_continue_stops_before_breakpoint() {
    let program = program(COUNTER);
    let mut vars = program.initial_values();
    let mut debugger = Debugger::new();
    debugger.add_breakpoint(5);
    debugger.resume();
    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Paused);
    let snap = debugger.snapshot().unwrap();
    assert_eq!(snap.pc, 5);
    assert_eq!(snap.step_count, 5);
    assert_eq!(debugger.mode(), DebugMode::Paused);
    assert_eq!(debugger.pause_reason(), PauseReason::Breakpoint);
    assert_eq!(debugger.hit_breakpoint_pc(), Some(5));
    assert_eq!(debugger.breakpoint_hits(), 1);
    assert_eq!(vars, program.initial_values());

    debugger.resume();
    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Completed);
    assert_eq!(vars, vec![Val::Int(1), Val::Int(2)]);
    assert_eq!(debugger.breakpoint_hits(), 1);
    assert!(debugger.snapshot().is_none());

    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Paused);
    assert_eq!(debugger.breakpoint_hits(), 2);
}

#[test]
fn test_single_step() {
    let program = program(COUNTER);
    let mut vars = program.initial_values();
    let mut debugger = Debugger::new();
    debugger.step();
    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Paused);
    assert_eq!(debugger.snapshot().unwrap().pc, 1);
    assert_eq!(debugger.pause_reason(), PauseReason::Step);
    debugger.step();
    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Paused);
    assert_eq!(debugger.snapshot().unwrap().pc, 2);
    assert_eq!(debugger.snapshot().unwrap().stack, vec![Val::Int(0), Val::Int(1)]);
    assert_eq!(debugger.total_steps_debugged(), 2);
}

#[test]
fn test_pause_command() {
    let program = program(COUNTER);
    let mut vars = program.initial_values();
    let mut debugger = Debugger::new();
    debugger.pause();
    assert_eq!(debugger.mode(), DebugMode::Step);
    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Paused);
    assert_eq!(debugger.pause_reason(), PauseReason::PauseCmd);
    debugger.pause();
    assert_eq!(debugger.mode(), DebugMode::Paused);
    assert!(debugger.snapshot().is_some());
}

#[test]
fn test_step_onto_halt_pauses() {
    let program = program("VAR x : INT; END_VAR x := 1;");
    let mut vars = program.initial_values();
    let mut debugger = Debugger::new();
    debugger.add_breakpoint(2);
    debugger.resume();
    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Paused);
    debugger.step();
    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Completed);
    assert_eq!(debugger.pause_reason(), PauseReason::Halt);
    assert_eq!(debugger.mode(), DebugMode::Paused);
    assert_eq!(vars, vec![Val::Int(1)]);
}

#[test]
fn test_error_pauses_with_snapshot() {
    let program = program("VAR x : INT; END_VAR x := 10 / x;");
    let mut vars = program.initial_values();
    let mut debugger = Debugger::new();
    debugger.resume();
    match tick(&mut debugger, &program, &mut vars) {
        RunOutcome::Faulted(error) => assert!(error.to_string().starts_with("DIVISION BY ZERO")),
        outcome => panic!("{:?}", outcome),
    }
    assert_eq!(debugger.mode(), DebugMode::Paused);
    assert_eq!(debugger.pause_reason(), PauseReason::Error);
    let snap = debugger.snapshot().unwrap();
    assert!(snap.error);
    assert_eq!(snap.pc, 2);
    assert!(!snap.error_message.is_empty());
}

#[test]
fn test_stop_abandons_suspended_run() {
    let program = program(COUNTER);
    let mut vars = program.initial_values();
    let mut debugger = Debugger::new();
    debugger.add_breakpoint(3);
    debugger.resume();
    tick(&mut debugger, &program, &mut vars);
    assert!(debugger.has_suspended());
    debugger.stop();
    assert!(!debugger.has_suspended());
    assert!(debugger.snapshot().is_none());
    assert_eq!(debugger.pause_reason(), PauseReason::None);
    assert_eq!(tick(&mut debugger, &program, &mut vars), RunOutcome::Completed);
    assert_eq!(vars, vec![Val::Int(1), Val::Int(2)]);
}

#[test]
fn test_inspection_text() {
    let program = program(COUNTER);
    let mut vars = program.initial_values();
    let mut debugger = Debugger::new();
    debugger.add_breakpoint(4);
    debugger.resume();
    tick(&mut debugger, &program, &mut vars);
    let state = debugger.state_text(Some(&program));
    assert!(state.contains("Mode: PAUSED"));
    assert!(state.contains("PC: 4 / 13"));
    assert!(state.contains("Pause Reason: breakpoint"));
    let vars_text = debugger.vars_text(&program).unwrap();
    assert!(vars_text.contains("  X = 1 (INT)"));
    assert!(debugger.breakpoints_text().contains("[0] PC=4"));
    assert_eq!(debugger.instruction_text(&program).unwrap(), "[PC=4] LOAD_VAR 0");
}
