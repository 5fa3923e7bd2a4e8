mod common;
use common::*;
use stlogic::engine::{RegisterBank, Target, BINDING_COUNT_REG_BASE};
use stlogic::lang::ErrorCode;

const TANK: &str = "VAR_INPUT level : REAL; limit : INT; END_VAR
VAR_OUTPUT pump : BOOL; demand : DINT; END_VAR
pump := level < INT_TO_REAL(limit);
IF pump THEN demand := demand + 1; END_IF;";

fn tank() -> Rig {
    let mut rig = Rig::new();
    rig.load(0, TANK);
    rig.engine.bind(0, "level", Target::HoldingRegister(10)).unwrap();
    rig.engine.bind(0, "limit", Target::HoldingRegister(12)).unwrap();
    rig.engine.bind(0, "pump", Target::Coil(4)).unwrap();
    rig.engine.bind(0, "demand", Target::HoldingRegister(20)).unwrap();
    rig
}

fn set_level(rig: &mut Rig, level: f32) {
    let bits = level.to_bits();
    rig.registers.set_holding_register(10, bits as u16);
    rig.registers.set_holding_register(11, (bits >> 16) as u16);
}

#[test]
fn test_inputs_in_outputs_out() {
    let mut rig = tank();
    set_level(&mut rig, 12.5);
    rig.registers.set_holding_register(12, 40);
    rig.fire();
    assert!(rig.registers.coil(4));
    assert_eq!(rig.registers.holding_register(20), 1);
    assert_eq!(rig.registers.holding_register(21), 0);

    set_level(&mut rig, 55.0);
    rig.fire();
    assert!(!rig.registers.coil(4));
    assert_eq!(rig.registers.holding_register(20), 1);
    assert_eq!(rig.registers.input_register(BINDING_COUNT_REG_BASE), 4);
}

#[test]
fn test_negative_int_input() {
    let mut rig = tank();
    set_level(&mut rig, -20.0);
    rig.registers.set_holding_register(12, (-10i16) as u16);
    rig.fire();
    assert!(rig.registers.coil(4));
}

#[test]
fn test_rejected_bindings_change_nothing() {
    let mut rig = tank();
    let checks = [
        ("level", Target::Coil(1), ErrorCode::InvalidTarget),
        ("demand", Target::InputRegister(210), ErrorCode::InvalidTarget),
        ("demand", Target::HoldingRegister(255), ErrorCode::InvalidTarget),
        ("missing", Target::HoldingRegister(1), ErrorCode::UndefinedVariable),
    ];
    for (var, target, code) in checks.iter() {
        let error = rig.engine.bind(0, var, *target).unwrap_err();
        assert!(error.is(*code), "{} {}", var, error);
    }
    let error = rig.engine.bind(5, "level", Target::Coil(1)).unwrap_err();
    assert!(error.is(ErrorCode::InvalidProgramId));
    let error = rig.engine.bind(1, "level", Target::Coil(1)).unwrap_err();
    assert!(error.is(ErrorCode::NotCompiled));
    assert_eq!(rig.engine.bindings().len(), 4);
    assert_eq!(rig.engine.program(0).unwrap().binding_count, 4);

    assert!(rig.engine.unbind(0, "pump").unwrap());
    assert!(!rig.engine.unbind(0, "pump").unwrap());
    assert_eq!(rig.engine.program(0).unwrap().binding_count, 3);
}
