use crate::mach::{compile, BytecodeProgram, Val, Vm, DEFAULT_MAX_STEPS};

mod compile_test;
mod debug_test;
mod vm_test;

fn program(source: &str) -> BytecodeProgram {
    match compile(source) {
        Ok(program) => program,
        Err(error) => panic!("{}", error),
    }
}

fn run(source: &str) -> (BytecodeProgram, Vec<Val>) {
    let program = program(source);
    let mut vm = Vm::new(&program, &program.initial_values());
    if let Err(error) = vm.run(DEFAULT_MAX_STEPS) {
        panic!("{}", error);
    }
    let vars = vm.into_vars();
    (program, vars)
}

fn var(source: &str, name: &str) -> Val {
    let (program, vars) = run(source);
    vars[program.var_index(name).unwrap()]
}
