use super::{Address, Builtin, DataType, Val};

/// ## Virtual machine instruction set
///
/// The ST virtual machine has no registers.
/// Every operation is performed on the operand stack.
///
/// For example: `y := 3 * x;` with `x : INT` compiles to
/// `[PUSH_INT 3, LOAD_VAR 0, MUL_INT, STORE_VAR 1]`
///
/// Arithmetic, comparison and logic instructions are specialized by type.
/// The compiler inserts `CAST` instructions so both operands already have
/// that type when the instruction runs.

#[derive(Clone, Copy, PartialEq)]
pub enum Opcode {
    // *** Stack manipulation
    /// Push literal value on to the stack.
    Literal(Val),
    /// Push the value of the variable at index.
    Load(usize),
    /// Pop the stack into the variable at index.
    Store(usize),
    Dup,
    Pop,

    // *** Conversion
    /// Replace the top of stack with its value converted to the type.
    Cast(DataType),

    // *** Arithmetic
    Add(DataType),
    Sub(DataType),
    Mul(DataType),
    Div(DataType),
    Mod(DataType),
    Neg(DataType),

    // *** Logic, bitwise on integer types
    And(DataType),
    Or(DataType),
    Xor(DataType),
    Not(DataType),
    Shl(DataType),
    Shr(DataType),

    // *** Comparison, result is BOOL
    Eq(DataType),
    Ne(DataType),
    Lt(DataType),
    Gt(DataType),
    Le(DataType),
    Ge(DataType),

    // *** Branch control
    /// Unconditional branch to Address.
    Jump(Address),
    /// Pop stack and branch to Address if FALSE.
    JumpIfFalse(Address),
    /// Pop stack and branch to Address if TRUE.
    JumpIfTrue(Address),

    // *** Built-in functions
    Call(Builtin),

    Nop,
    Halt,
    /// An instruction byte that did not decode. Faults when executed.
    Illegal(u8),
}

impl Opcode {
    pub fn mnemonic(&self) -> String {
        use Opcode::*;
        match self {
            Literal(v) => format!("PUSH_{}", v.data_type()),
            Load(_) => "LOAD_VAR".to_string(),
            Store(_) => "STORE_VAR".to_string(),
            Dup => "DUP".to_string(),
            Pop => "POP".to_string(),
            Cast(t) => format!("CAST_{}", t),
            Add(t) => format!("ADD_{}", t),
            Sub(t) => format!("SUB_{}", t),
            Mul(t) => format!("MUL_{}", t),
            Div(t) => format!("DIV_{}", t),
            Mod(t) => format!("MOD_{}", t),
            Neg(t) => format!("NEG_{}", t),
            And(t) => format!("AND_{}", t),
            Or(t) => format!("OR_{}", t),
            Xor(t) => format!("XOR_{}", t),
            Not(t) => format!("NOT_{}", t),
            Shl(t) => format!("SHL_{}", t),
            Shr(t) => format!("SHR_{}", t),
            Eq(t) => format!("EQ_{}", t),
            Ne(t) => format!("NE_{}", t),
            Lt(t) => format!("LT_{}", t),
            Gt(t) => format!("GT_{}", t),
            Le(t) => format!("LE_{}", t),
            Ge(t) => format!("GE_{}", t),
            Jump(_) => "JMP".to_string(),
            JumpIfFalse(_) => "JMP_IF_FALSE".to_string(),
            JumpIfTrue(_) => "JMP_IF_TRUE".to_string(),
            Call(_) => "CALL_BUILTIN".to_string(),
            Nop => "NOP".to_string(),
            Halt => "HALT".to_string(),
            Illegal(_) => "ILLEGAL".to_string(),
        }
    }

    pub fn argument(&self) -> Option<String> {
        use Opcode::*;
        match self {
            Literal(v) => Some(v.to_string()),
            Load(i) | Store(i) => Some(i.to_string()),
            Jump(a) | JumpIfFalse(a) | JumpIfTrue(a) => Some(a.to_string()),
            Call(b) => Some(b.to_string()),
            Illegal(byte) => Some(format!("0x{:02X}", byte)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.argument() {
            Some(arg) => write!(f, "{} {}", self.mnemonic(), arg),
            None => write!(f, "{}", self.mnemonic()),
        }
    }
}
