mod common;
use common::*;
use stlogic::engine::RegisterBank;
use stlogic::lang::ErrorCode;
use stlogic::mach::{DebugCommand, DebugMode, PauseReason, Val};
use stlogic::pool::{IrAllocation, Region};

#[test]
fn test_one_execution_per_interval() {
    let mut rig = Rig::new();
    rig.load(0, COUNTER);
    assert!(rig.engine.tick(&mut rig.registers).is_none());
    let before = rig.engine.program(0).unwrap().stats.execution_count;
    assert!(rig.tick_after(5).is_none());
    let report = rig.tick_after(10).unwrap();
    assert!(report.ran(0));
    let after = rig.engine.program(0).unwrap().stats.execution_count;
    assert_eq!(after, before + 1);
}

#[test]
fn test_division_by_zero_keeps_old_value() {
    let mut rig = Rig::new();
    rig.load(0, "VAR x : INT := 3; END_VAR x := 10 / 0;");
    rig.fire();
    let program = rig.engine.program(0).unwrap();
    assert_eq!(program.stats.error_count, 1);
    assert!(!program.last_error().unwrap_or("").is_empty());
    assert_eq!(program.values(), vec![Val::Int(3)]);
    assert_ne!(rig.registers.input_register(200) & 1 << 3, 0);
}

#[test]
fn test_continue_stops_at_breakpoint() {
    let mut rig = Rig::new();
    rig.load(0, COUNTER);
    assert!(rig.engine.program(0).unwrap().bytecode().unwrap().instruction_count() > 5);
    rig.engine.add_breakpoint(0, 5).unwrap();
    let debugger = rig.engine.debugger_mut(0).unwrap();
    assert_eq!(debugger.mode(), DebugMode::Off);
    debugger.command(DebugCommand::Continue);
    assert_eq!(debugger.mode(), DebugMode::Run);
    rig.fire();

    let debugger = rig.engine.debugger(0).unwrap();
    assert_eq!(debugger.mode(), DebugMode::Paused);
    assert_eq!(debugger.pause_reason(), PauseReason::Breakpoint);
    assert_eq!(debugger.snapshot().unwrap().pc, 5);
}

#[test]
fn test_bool_and_real_exports() {
    let mut rig = Rig::new();
    rig.load(
        0,
        "VAR on : BOOL EXPORT; level : REAL EXPORT; END_VAR on := TRUE; level := 12.5;",
    );
    assert_eq!(
        rig.engine.ir_pool().allocation(0),
        Some(IrAllocation { offset: 0, size: 3 })
    );
    rig.fire();
    let bits = 12.5f32.to_bits();
    assert_eq!(rig.registers.input_register(220), 1);
    assert_eq!(rig.registers.input_register(221), bits as u16);
    assert_eq!(rig.registers.input_register(222), (bits >> 16) as u16);
}

#[test]
fn test_pool_full_keeps_region() {
    let mut rig = Rig::new();
    rig.engine.upload(0, &[b' '; 100]).unwrap();
    rig.engine.upload(1, &[b' '; 7000]).unwrap();
    let before: Option<Region> = rig.engine.sources().region(0);
    let error = rig.engine.upload(0, &[b' '; 1200]).unwrap_err();
    assert!(error.is(ErrorCode::PoolFull));
    assert_eq!(rig.engine.sources().region(0), before);
    assert_eq!(rig.engine.sources().get_source(0).unwrap().len(), 100);
}
