use super::*;
use crate::lang::ErrorCode;
use crate::mach::{DataType, Opcode};

fn compile_error(source: &str) -> crate::lang::Error {
    match compile(source) {
        Ok(program) => panic!("compiled: {:?}", program.ops()),
        Err(error) => error,
    }
}

#[test]
fn test_promotes_then_casts_on_assignment() {
    let program = program("VAR x : INT; y : REAL; END_VAR y := x + 1;");
    assert_eq!(
        program.ops(),
        &[
            Opcode::Load(0),
            Opcode::Literal(Val::Int(1)),
            Opcode::Add(DataType::Int),
            Opcode::Cast(DataType::Real),
            Opcode::Store(1),
            Opcode::Halt,
        ]
    );
}

#[test]
fn test_literal_cast_is_folded() {
    let program = program("VAR r : REAL; END_VAR r := r * 2;");
    assert_eq!(program.ops()[1], Opcode::Literal(Val::Real(2.0)));
    assert_eq!(program.ops()[2], Opcode::Mul(DataType::Real));
}

#[test]
fn test_deterministic() {
    let source = "
        VAR i : INT; total : DINT EXPORT; END_VAR
        total := 0;
        FOR i := 1 TO 10 DO
            IF i MOD 2 = 0 THEN total := total + i; END_IF;
        END_FOR;
    ";
    assert_eq!(program(source), program(source));
}

#[test]
fn test_ends_with_halt_and_jumps_in_range() {
    let program = program(
        "VAR a : INT; END_VAR
         CASE a OF 1, 2: a := 3; 4..6: a := 7; ELSE a := 0; END_CASE;
         WHILE a < 10 DO a := a + 1; IF a = 5 THEN EXIT; END_IF; END_WHILE;",
    );
    assert_eq!(program.ops().last(), Some(&Opcode::Halt));
    for op in program.ops() {
        match op {
            Opcode::Jump(a) | Opcode::JumpIfFalse(a) | Opcode::JumpIfTrue(a) => {
                assert!(*a < program.instruction_count(), "{:?}", op)
            }
            _ => {}
        }
    }
}

#[test]
fn test_variable_table() {
    let program = program(
        "VAR_INPUT sensor : REAL; END_VAR
         VAR_OUTPUT alarm : BOOL EXPORT; END_VAR
         VAR CONSTANT limit : REAL := -2.5; END_VAR
         VAR a, b : DINT := 70000; END_VAR
         alarm := sensor > limit;",
    );
    assert_eq!(program.var_count(), 5);
    assert_eq!(program.var(2).unwrap().initial, Val::Real(-2.5));
    assert_eq!(program.var(3).unwrap().initial, Val::Dint(70000));
    assert_eq!(program.var(4).unwrap().initial, Val::Dint(70000));
    assert_eq!(program.exports().count(), 1);
    assert_eq!(program.var_index("alarm"), Some(1));
}

#[test]
fn test_undefined_variable() {
    let error = compile_error("VAR x : INT; END_VAR\nx := 1;\ny := 2;");
    assert!(error.is(ErrorCode::UndefinedVariable));
    assert_eq!(error.line_number(), Some(3));
}

#[test]
fn test_type_errors() {
    let error = compile_error("VAR b : BOOL; i : INT; END_VAR i := b + 1;");
    assert!(error.is(ErrorCode::TypeMismatch));
    let error = compile_error("VAR r : REAL; END_VAR r := r MOD 2.0;");
    assert!(error.is(ErrorCode::TypeMismatch));
    let error = compile_error("VAR b : BOOL; i : INT; END_VAR b := i;");
    assert!(error.is(ErrorCode::TypeMismatch));
    let error = compile_error("VAR i : INT; END_VAR IF i THEN i := 0; END_IF;");
    assert!(error.is(ErrorCode::TypeMismatch));
}

#[test]
fn test_case_label_out_of_selector_range() {
    let error =
        compile_error("VAR x : INT; y : INT; END_VAR CASE x OF 70000: y := 1; END_CASE;");
    assert!(error.is(ErrorCode::TypeMismatch));
    let error =
        compile_error("VAR x : DWORD; y : INT; END_VAR CASE x OF -1: y := 1; END_CASE;");
    assert!(error.is(ErrorCode::TypeMismatch));
    let error =
        compile_error("VAR x : INT; y : INT; END_VAR CASE x OF 1..40000: y := 1; END_CASE;");
    assert!(error.is(ErrorCode::TypeMismatch));
    let source = "VAR x : DINT := 70000; y : INT; END_VAR
                  CASE x OF 4464: y := 1; 70000: y := 2; ELSE y := 3; END_CASE;";
    assert_eq!(var(source, "y"), Val::Int(2));
}

#[test]
fn test_constant_assignment() {
    let error = compile_error("VAR CONST k : INT := 5; END_VAR k := 6;");
    assert!(error.is(ErrorCode::ConstantAssignment));
    let error = compile_error("VAR CONSTANT k : INT; END_VAR");
    assert!(error.is(ErrorCode::SyntaxError));
}

#[test]
fn test_exit_outside_loop() {
    let error = compile_error("VAR x : INT; END_VAR\nIF x > 0 THEN\n  EXIT;\nEND_IF;");
    assert!(error.is(ErrorCode::ExitOutsideLoop));
    assert_eq!(error.line_number(), Some(3));
}

#[test]
fn test_duplicate_and_too_many_variables() {
    let error = compile_error("VAR x : INT; x : REAL; END_VAR");
    assert!(error.is(ErrorCode::DuplicateVariable));
    let names: Vec<String> = (0..33).map(|i| format!("v{}", i)).collect();
    let source = format!("VAR {} : INT; END_VAR", names.join(", "));
    let error = compile_error(&source);
    assert!(error.is(ErrorCode::TooManyVariables));
}

#[test]
fn test_functions() {
    let error = compile_error("VAR x : INT; END_VAR x := FOO(1);");
    assert!(error.is(ErrorCode::UndefinedFunction));
    let error = compile_error("VAR x : INT; END_VAR x := LIMIT(1, 2);");
    assert!(error.is(ErrorCode::WrongArgumentCount));
    let program = program("VAR x : INT; r : REAL; END_VAR x := ROUND(r); r := INT_TO_REAL(x);");
    assert!(program.ops().iter().any(|op| op.mnemonic() == "CALL_BUILTIN"));
}

#[test]
fn test_program_too_long() {
    let body = "x := 1;\n".repeat(520);
    let error = compile_error(&format!("VAR x : INT; END_VAR\n{}", body));
    assert!(error.is(ErrorCode::ProgramTooLong));
}

#[test]
fn test_loops_nested_too_deeply() {
    let mut source = String::from("VAR x : INT; END_VAR\n");
    source.push_str(&"WHILE TRUE DO\n".repeat(9));
    source.push_str(&"END_WHILE;\n".repeat(9));
    let error = compile_error(&source);
    assert!(error.is(ErrorCode::SyntaxError));
    assert_eq!(error.line_number(), Some(10));
}
