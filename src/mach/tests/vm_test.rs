use super::*;
use crate::lang::ErrorCode;
use crate::mach::{Frame, Opcode, Step, STACK_DEPTH};

fn fault(source: &str) -> (usize, crate::lang::Error) {
    let program = program(source);
    let mut vm = Vm::new(&program, &program.initial_values());
    let error = vm.run(DEFAULT_MAX_STEPS).unwrap_err();
    (vm.pc(), error)
}

#[test]
fn test_integer_arithmetic() {
    assert_eq!(var("VAR x : INT; END_VAR x := 7 / 2;", "x"), Val::Int(3));
    assert_eq!(var("VAR x : INT; END_VAR x := -7 MOD 3;", "x"), Val::Int(-1));
    assert_eq!(var("VAR x : INT; END_VAR x := 2 + 3 * 4 - 1;", "x"), Val::Int(13));
    assert_eq!(var("VAR x : INT; END_VAR x := 1 SHL 4;", "x"), Val::Int(16));
}

#[test]
fn test_real_and_dword_are_exact() {
    assert_eq!(var("VAR r : REAL; END_VAR r := 1.5 * 4;", "r"), Val::Real(6.0));
    assert_eq!(var("VAR r : REAL; END_VAR r := 1 / 4.0;", "r"), Val::Real(0.25));
    let source = "VAR d : DWORD; END_VAR d := 16#FFFFFFFF; d := d / 2;";
    assert_eq!(var(source, "d"), Val::Dword(0x7FFF_FFFF));
    let source = "VAR b : BOOL; END_VAR b := 16#80000000 > 1;";
    assert_eq!(var(source, "b"), Val::Bool(true));
}

#[test]
fn test_persisted_values_seed_the_run() {
    let program = program("VAR x : INT; END_VAR x := x + 1;");
    let mut vm = Vm::new(&program, &[Val::Int(41)]);
    vm.run(DEFAULT_MAX_STEPS).unwrap();
    assert_eq!(vm.vars(), &[Val::Int(42)]);
}

#[test]
fn test_for_loop() {
    let source = "VAR i, sum : INT; END_VAR FOR i := 1 TO 10 DO sum := sum + i; END_FOR;";
    assert_eq!(var(source, "sum"), Val::Int(55));
    let source = "VAR i, n : INT; END_VAR FOR i := 10 TO 1 BY -3 DO n := n + 1; END_FOR;";
    assert_eq!(var(source, "n"), Val::Int(4));
    let source = "VAR i, n, s : INT; END_VAR s := -2; FOR i := 9 TO 0 BY s DO n := n + 1; END_FOR;";
    assert_eq!(var(source, "n"), Val::Int(5));
}

#[test]
fn test_exit_leaves_stack_clean() {
    let program = program(
        "VAR i, j, n : INT; END_VAR
         FOR i := 1 TO 5 DO
             FOR j := 1 TO 5 DO
                 IF j > i THEN EXIT; END_IF;
                 n := n + 1;
             END_FOR;
         END_FOR;",
    );
    let mut vm = Vm::new(&program, &program.initial_values());
    vm.run(DEFAULT_MAX_STEPS).unwrap();
    assert!(vm.stack().is_empty());
    assert_eq!(vm.vars()[2], Val::Int(15));
}

#[test]
fn test_while_and_repeat() {
    let source = "VAR n : DINT; END_VAR WHILE n < 100000 DO n := n + 25000; END_WHILE;";
    assert_eq!(var(source, "n"), Val::Dint(100000));
    let source = "VAR n : INT; END_VAR REPEAT n := n + 1; UNTIL n >= 3 END_REPEAT;";
    assert_eq!(var(source, "n"), Val::Int(3));
}

#[test]
fn test_case() {
    let source = |sel: i32| {
        format!(
            "VAR s : INT := {}; r : INT; END_VAR
             CASE s OF 1, 2: r := 10; 5..7: r := 20; ELSE r := -1; END_CASE;",
            sel
        )
    };
    assert_eq!(var(&source(2), "r"), Val::Int(10));
    assert_eq!(var(&source(6), "r"), Val::Int(20));
    assert_eq!(var(&source(4), "r"), Val::Int(-1));
}

#[test]
fn test_builtins() {
    assert_eq!(var("VAR x : INT; END_VAR x := LIMIT(0, 50, 10);", "x"), Val::Int(10));
    assert_eq!(var("VAR r : REAL; END_VAR r := MAX(2, 2.5);", "r"), Val::Real(2.5));
    assert_eq!(var("VAR x : INT; END_VAR x := SEL(TRUE, 1, 2);", "x"), Val::Int(2));
    assert_eq!(var("VAR x : INT; END_VAR x := ROUND(2.6);", "x"), Val::Int(3));
    assert_eq!(var("VAR b : BOOL; END_VAR b := INT_TO_BOOL(3);", "b"), Val::Bool(true));
}

#[test]
fn test_return_halts() {
    let source = "VAR x : INT; END_VAR x := 1; RETURN; x := 2;";
    assert_eq!(var(source, "x"), Val::Int(1));
}

#[test]
fn test_division_by_zero_faults_in_place() {
    let (pc, error) = fault("VAR x : INT; END_VAR x := 10 / 0;");
    assert!(error.is(ErrorCode::DivisionByZero));
    assert_eq!(pc, 2);
}

#[test]
fn test_stack_overflow() {
    let depth = 70;
    let expr = format!("{}1{}", "1 + (".repeat(depth), ")".repeat(depth));
    let (_, error) = fault(&format!("VAR x : INT; END_VAR x := {};", expr));
    assert!(error.is(ErrorCode::StackOverflow));
}

#[test]
fn test_resume_with_oversized_stack_faults() {
    let program = program("VAR x : INT; END_VAR x := 1;");
    let frame = Frame {
        pc: 0,
        stack: vec![Val::Int(0); STACK_DEPTH + 1],
        vars: vec![Val::Int(5)],
        step_count: 0,
    };
    let mut vm = Vm::resume(&program, frame);
    assert_eq!(vm.step(), Step::Error);
    assert!(vm.error().unwrap().is(ErrorCode::StackOverflow));
    assert_eq!(vm.vars(), &[Val::Int(5)]);
}

#[test]
fn test_max_steps() {
    let (_, error) = fault("VAR x : INT; END_VAR WHILE TRUE DO x := x + 1; END_WHILE;");
    assert!(error.is(ErrorCode::MaxStepsExceeded));
}

#[test]
fn test_hand_built_faults() {
    let cases = vec![
        (vec![Opcode::Pop, Opcode::Halt], ErrorCode::StackUnderflow),
        (vec![Opcode::Illegal(0xEE), Opcode::Halt], ErrorCode::UnknownOpcode),
        (vec![Opcode::Load(5), Opcode::Halt], ErrorCode::VariableOutOfBounds),
        (vec![Opcode::Nop], ErrorCode::InternalError),
    ];
    for (ops, code) in cases {
        let program = BytecodeProgram::new(None, ops, vec![]);
        let mut vm = Vm::new(&program, &[]);
        assert!(vm.run(DEFAULT_MAX_STEPS).unwrap_err().is(code));
        assert_eq!(vm.step(), Step::Error);
    }
}

#[test]
fn test_step_advances_pc() {
    let program = program("VAR x : INT; END_VAR x := 1;");
    let mut vm = Vm::new(&program, &program.initial_values());
    assert_eq!(vm.step(), Step::Continue);
    assert_eq!(vm.pc(), 1);
    assert_eq!(vm.step(), Step::Continue);
    assert_eq!(vm.step(), Step::Halted);
    assert!(vm.is_halted());
}

#[test]
fn test_resume_from_frame() {
    let program = program("VAR x : INT; END_VAR x := 5; x := x * 2;");
    let mut vm = Vm::new(&program, &program.initial_values());
    vm.step();
    vm.step();
    let frame = vm.into_frame();
    let mut vm = Vm::resume(&program, frame);
    vm.run(DEFAULT_MAX_STEPS).unwrap();
    assert_eq!(vm.vars(), &[Val::Int(10)]);
}
