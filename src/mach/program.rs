use super::{Address, DataType, Opcode, Val};
use crate::lang::ast::VarClass;

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data_type: DataType,
    pub class: VarClass,
    pub export: bool,
    pub initial: Val,
}

/// ## Compiled program
///
/// Instructions plus the variable table. Built once by the compiler and
/// never patched afterward; recompiling replaces it wholesale.

#[derive(Debug, Clone, PartialEq)]
pub struct BytecodeProgram {
    name: Option<String>,
    ops: Vec<Opcode>,
    vars: Vec<Variable>,
}

impl BytecodeProgram {
    pub fn new(name: Option<String>, ops: Vec<Opcode>, vars: Vec<Variable>) -> BytecodeProgram {
        BytecodeProgram { name, ops, vars }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ops(&self) -> &[Opcode] {
        &self.ops
    }

    pub fn op(&self, addr: Address) -> Option<&Opcode> {
        self.ops.get(addr)
    }

    pub fn instruction_count(&self) -> usize {
        self.ops.len()
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn var(&self, index: usize) -> Option<&Variable> {
        self.vars.get(index)
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn var_index(&self, name: &str) -> Option<usize> {
        let name = name.to_ascii_uppercase();
        self.vars.iter().position(|v| v.name == name)
    }

    pub fn initial_values(&self) -> Vec<Val> {
        self.vars.iter().map(|v| v.initial).collect()
    }

    /// Exported variables in declaration order.
    pub fn exports(&self) -> impl Iterator<Item = (usize, &Variable)> {
        self.vars.iter().enumerate().filter(|(_, v)| v.export)
    }
}
