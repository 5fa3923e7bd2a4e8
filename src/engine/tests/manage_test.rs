use super::*;
use crate::engine::{ProgramRun, Target};
use crate::lang::ErrorCode;
use crate::mach::{DebugMode, Val};
use crate::pool::IrAllocation;

#[test]
fn test_invalid_program_id() {
    let (mut engine, _) = engine();
    assert!(engine.upload(4, b"x").unwrap_err().is(ErrorCode::InvalidProgramId));
    assert!(engine.compile(7).unwrap_err().is(ErrorCode::InvalidProgramId));
    assert!(engine.set_enabled(4, true).unwrap_err().is(ErrorCode::InvalidProgramId));
    assert!(engine.delete(4).unwrap_err().is(ErrorCode::InvalidProgramId));
    assert!(engine.program(4).is_err());
}

#[test]
fn test_compile_without_source() {
    let (mut engine, _) = engine();
    let error = engine.compile(0).unwrap_err();
    assert!(error.is(ErrorCode::NotCompiled));
    assert!(engine.program(0).unwrap().last_error().is_some());
}

#[test]
fn test_failed_compile_leaves_nothing_runnable() {
    let (mut engine, _) = engine();
    load(&mut engine, 0, "VAR a : INT EXPORT; END_VAR a := 1;");
    assert!(engine.ir_pool().allocation(0).is_some());

    engine.upload(0, b"VAR a : INT; END_VAR a := ;").unwrap();
    let error = engine.compile(0).unwrap_err();
    assert!(error.is(ErrorCode::SyntaxError));
    let program = engine.program(0).unwrap();
    assert!(!program.is_compiled());
    assert!(program.last_error().unwrap().starts_with("SYNTAX ERROR"));
    assert!(engine.ir_pool().allocation(0).is_none());
}

#[test]
fn test_upload_keeps_running_bytecode() {
    let (mut engine, _) = engine();
    load(&mut engine, 0, COUNTER);
    engine.upload(0, b"VAR z : REAL; END_VAR z := 1.0;").unwrap();
    assert_eq!(engine.program(0).unwrap().bytecode().unwrap().var_count(), 2);
    engine.compile(0).unwrap();
    assert_eq!(engine.program(0).unwrap().values(), vec![Val::Real(0.0)]);
}

#[test]
fn test_exhausted_ir_pool_only_costs_exports() {
    let (mut engine, clock) = engine();
    let mut registers = Registers::new();
    let wide = "VAR a, b, c, d, e, f, g, h : REAL EXPORT; END_VAR";
    load(&mut engine, 0, wide);
    load(&mut engine, 1, wide);
    load(&mut engine, 2, "VAR q : BOOL EXPORT; END_VAR q := TRUE;");
    let program = engine.program(2).unwrap();
    assert!(program.is_compiled());
    assert!(program.last_error().unwrap().starts_with("IR POOL EXHAUSTED"));
    assert_eq!(engine.ir_pool().allocation(2), None);
    assert_eq!(
        engine.ir_pool().allocation(1),
        Some(IrAllocation { offset: 16, size: 16 })
    );
    let report = fire(&mut engine, &clock, &mut registers);
    assert!(matches!(report.runs[2].1, ProgramRun::Completed { .. }));
    assert_eq!(engine.program(2).unwrap().values(), vec![Val::Bool(true)]);
}

#[test]
fn test_recompile_keeps_running_program_when_exports_do_not_fit() {
    let (mut engine, clock) = engine();
    let mut registers = Registers::new();
    let ten = "VAR r0, r1, r2, r3, r4, r5, r6, r7, r8, r9 : REAL EXPORT; END_VAR r0 := r0 + 1.0;";
    load(&mut engine, 1, ten);
    load(&mut engine, 0, "VAR s0, s1, s2, s3, s4 : REAL EXPORT; END_VAR");
    assert_eq!(
        engine.ir_pool().allocation(0),
        Some(IrAllocation { offset: 20, size: 10 })
    );

    engine.compile(1).unwrap();
    let program = engine.program(1).unwrap();
    assert!(program.is_compiled());
    assert!(program.last_error().is_some());
    assert_eq!(engine.ir_pool().allocation(1), None);
    assert!(fire(&mut engine, &clock, &mut registers).ran(1));
    assert_eq!(engine.program(1).unwrap().stats.execution_count, 1);

    engine.compact_ir_pool();
    engine.compile(1).unwrap();
    assert!(engine.program(1).unwrap().last_error().is_none());
    assert_eq!(
        engine.ir_pool().allocation(1),
        Some(IrAllocation { offset: 10, size: 20 })
    );
}

#[test]
fn test_recompile_resets_debugger_and_rebinds() {
    let (mut engine, _) = engine();
    load(
        &mut engine,
        0,
        "VAR_INPUT a : INT; b : INT; END_VAR VAR_OUTPUT q : INT; END_VAR q := a + b;",
    );
    engine.bind(0, "b", Target::HoldingRegister(5)).unwrap();
    engine.bind(0, "q", Target::HoldingRegister(6)).unwrap();
    assert_eq!(engine.program(0).unwrap().binding_count, 2);
    engine.debugger_mut(0).unwrap().step();

    engine
        .upload(0, b"VAR_INPUT b : INT; END_VAR VAR q : INT; END_VAR q := b;")
        .unwrap();
    engine.compile(0).unwrap();
    assert_eq!(engine.debugger(0).unwrap().mode(), DebugMode::Off);
    let bindings: Vec<_> = engine.bindings().iter().collect();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].var_index, 0);
    assert_eq!(engine.program(0).unwrap().binding_count, 1);
}

#[test]
fn test_delete_releases_everything() {
    let (mut engine, _) = engine();
    load(&mut engine, 1, "VAR_OUTPUT q : BOOL EXPORT; END_VAR q := TRUE;");
    engine.bind(1, "q", Target::Coil(3)).unwrap();
    engine.add_breakpoint(1, 0).unwrap();
    engine.program_mut(1).unwrap().name = "Pump".to_string();

    engine.delete(1).unwrap();
    let program = engine.program(1).unwrap();
    assert_eq!(program.name, "Logic2");
    assert!(!program.enabled);
    assert!(!program.is_compiled());
    assert!(engine.sources().region(1).is_none());
    assert!(engine.ir_pool().allocation(1).is_none());
    assert!(engine.bindings().is_empty());
    assert_eq!(engine.debugger(1).unwrap().breakpoint_count(), 0);
}

#[test]
fn test_breakpoint_validation() {
    let (mut engine, _) = engine();
    assert!(engine.add_breakpoint(0, 0).unwrap_err().is(ErrorCode::NotCompiled));
    load(&mut engine, 0, COUNTER);
    assert!(engine.add_breakpoint(0, 13).unwrap_err().is(ErrorCode::InvalidBreakpoint));
    for pc in 0..8 {
        engine.add_breakpoint(0, pc).unwrap();
    }
    assert!(engine.add_breakpoint(0, 9).unwrap_err().is(ErrorCode::InvalidBreakpoint));
}

#[test]
fn test_interval() {
    let (mut engine, _) = engine();
    engine.set_interval(50).unwrap();
    assert_eq!(engine.interval().as_ms(), 50);
    assert!(engine.set_interval(30).unwrap_err().is(ErrorCode::InvalidInterval));
    assert_eq!(engine.interval().as_ms(), 50);
}
