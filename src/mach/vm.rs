use super::{Address, BytecodeProgram, DataType, Function, Opcode, Operation, Stack, Val};
use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

/// Operand stack depth.
pub const STACK_DEPTH: usize = 64;
const STACK_OVERFLOW: &str = "OPERAND STACK (MAX 64)";
/// Steps allowed for one run before it fails.
pub const DEFAULT_MAX_STEPS: u32 = 10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halted,
    Error,
}

/// Execution state carried across ticks while a debugger holds the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub pc: Address,
    pub stack: Vec<Val>,
    pub vars: Vec<Val>,
    pub step_count: u32,
}

/// ## Bytecode virtual machine
///
/// One instance per program per run. Variables are a private copy;
/// the caller decides whether to keep them once the run is over.

pub struct Vm<'a> {
    program: &'a BytecodeProgram,
    pc: Address,
    halted: bool,
    error: Option<Error>,
    stack: Stack<Val>,
    vars: Vec<Val>,
    step_count: u32,
}

impl<'a> Vm<'a> {
    pub fn new(program: &'a BytecodeProgram, values: &[Val]) -> Vm<'a> {
        let mut vars = program.initial_values();
        for (var, val) in vars.iter_mut().zip(values) {
            if var.data_type() == val.data_type() {
                *var = *val;
            }
        }
        Vm {
            program,
            pc: 0,
            halted: false,
            error: None,
            stack: Stack::new(STACK_DEPTH, STACK_OVERFLOW),
            vars,
            step_count: 0,
        }
    }

    /// Continues a suspended run. A frame whose stack is deeper than the
    /// machine allows faults on the first step.
    pub fn resume(program: &'a BytecodeProgram, frame: Frame) -> Vm<'a> {
        let (stack, error) = match Stack::from_vec(STACK_DEPTH, STACK_OVERFLOW, frame.stack) {
            Ok(stack) => (stack, None),
            Err(error) => (Stack::new(STACK_DEPTH, STACK_OVERFLOW), Some(error)),
        };
        Vm {
            program,
            pc: frame.pc,
            halted: false,
            error,
            stack,
            vars: frame.vars,
            step_count: frame.step_count,
        }
    }

    pub fn frame(&self) -> Frame {
        Frame {
            pc: self.pc,
            stack: self.stack.iter().copied().collect(),
            vars: self.vars.clone(),
            step_count: self.step_count,
        }
    }

    pub fn into_frame(self) -> Frame {
        Frame {
            pc: self.pc,
            stack: self.stack.into_vec(),
            vars: self.vars,
            step_count: self.step_count,
        }
    }

    pub fn program(&self) -> &'a BytecodeProgram {
        self.program
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn stack(&self) -> &Stack<Val> {
        &self.stack
    }

    pub fn vars(&self) -> &[Val] {
        &self.vars
    }

    pub fn into_vars(self) -> Vec<Val> {
        self.vars
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Executes the instruction at pc. A fault records the error and
    /// leaves pc on the faulting instruction.
    pub fn step(&mut self) -> Step {
        if self.halted {
            return Step::Halted;
        }
        if self.error.is_some() {
            return Step::Error;
        }
        self.step_count += 1;
        match self.execute() {
            Ok(()) if self.halted => Step::Halted,
            Ok(()) => Step::Continue,
            Err(error) => {
                self.error = Some(error);
                Step::Error
            }
        }
    }

    /// Steps until the program halts. Running more than `max_steps`
    /// instructions is a `MaxStepsExceeded` fault.
    pub fn run(&mut self, max_steps: u32) -> Result<()> {
        loop {
            if self.halted {
                return Ok(());
            }
            if let Some(error) = &self.error {
                return Err(error.clone());
            }
            self.check_step_limit(max_steps)?;
            self.step();
        }
    }

    /// Fails the run once `max_steps` instructions have executed.
    pub fn check_step_limit(&mut self, max_steps: u32) -> Result<()> {
        if self.step_count >= max_steps {
            let error = error!(MaxStepsExceeded; &format!("{} STEPS", max_steps));
            self.error = Some(error.clone());
            return Err(error);
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        let op = match self.program.op(self.pc) {
            Some(op) => *op,
            None => return Err(error!(InternalError; "PROGRAM COUNTER OUT OF RANGE")),
        };
        let mut next = self.pc + 1;
        match op {
            Opcode::Literal(val) => self.stack.push(val)?,
            Opcode::Load(idx) => match self.vars.get(idx) {
                Some(val) => self.stack.push(*val)?,
                None => return Err(error!(VariableOutOfBounds; &format!("LOAD {}", idx))),
            },
            Opcode::Store(idx) => {
                let val = self.stack.pop()?;
                match self.vars.get_mut(idx) {
                    Some(var) if var.data_type() == val.data_type() => *var = val,
                    Some(_) => return Err(error!(TypeMismatch; &format!("STORE {}", idx))),
                    None => {
                        return Err(error!(VariableOutOfBounds; &format!("STORE {}", idx)));
                    }
                }
            }
            Opcode::Dup => {
                let val = match self.stack.last() {
                    Some(val) => *val,
                    None => return Err(error!(StackUnderflow)),
                };
                self.stack.push(val)?;
            }
            Opcode::Pop => {
                self.stack.pop()?;
            }
            Opcode::Cast(data_type) => {
                let val = self.stack.pop()?;
                self.stack.push(val.cast(data_type))?;
            }
            Opcode::Add(t) => self.binary(t, Operation::sum)?,
            Opcode::Sub(t) => self.binary(t, Operation::subtract)?,
            Opcode::Mul(t) => self.binary(t, Operation::multiply)?,
            Opcode::Div(t) => self.binary(t, Operation::divide)?,
            Opcode::Mod(t) => self.binary(t, Operation::modulo)?,
            Opcode::And(t) => self.binary(t, Operation::and)?,
            Opcode::Or(t) => self.binary(t, Operation::or)?,
            Opcode::Xor(t) => self.binary(t, Operation::xor)?,
            Opcode::Shl(t) => self.binary(t, Operation::shift_left)?,
            Opcode::Shr(t) => self.binary(t, Operation::shift_right)?,
            Opcode::Neg(t) => self.unary(t, Operation::negate)?,
            Opcode::Not(t) => self.unary(t, Operation::not)?,
            Opcode::Eq(t) => self.compare(t, |o| o == Some(Ordering::Equal))?,
            Opcode::Ne(t) => self.compare(t, |o| o != Some(Ordering::Equal))?,
            Opcode::Lt(t) => self.compare(t, |o| o == Some(Ordering::Less))?,
            Opcode::Gt(t) => self.compare(t, |o| o == Some(Ordering::Greater))?,
            Opcode::Le(t) => {
                self.compare(t, |o| o == Some(Ordering::Less) || o == Some(Ordering::Equal))?
            }
            Opcode::Ge(t) => {
                self.compare(t, |o| o == Some(Ordering::Greater) || o == Some(Ordering::Equal))?
            }
            Opcode::Jump(addr) => next = addr,
            Opcode::JumpIfFalse(addr) => {
                if !self.pop_bool()? {
                    next = addr;
                }
            }
            Opcode::JumpIfTrue(addr) => {
                if self.pop_bool()? {
                    next = addr;
                }
            }
            Opcode::Call(builtin) => {
                let args = self.stack.pop_n(builtin.arity())?;
                self.stack.push(Function::call(builtin, &args)?)?;
            }
            Opcode::Nop => {}
            Opcode::Halt => self.halted = true,
            Opcode::Illegal(byte) => {
                return Err(error!(UnknownOpcode; &format!("0x{:02X}", byte)));
            }
        }
        self.pc = next;
        Ok(())
    }

    fn pop_typed(&mut self, data_type: DataType) -> Result<Val> {
        let val = self.stack.pop()?;
        if val.data_type() != data_type {
            return Err(error!(TypeMismatch; &format!("EXPECTED {}", data_type)));
        }
        Ok(val)
    }

    fn pop_bool(&mut self) -> Result<bool> {
        match self.pop_typed(DataType::Bool)? {
            Val::Bool(b) => Ok(b),
            _ => Err(error!(InternalError)),
        }
    }

    fn unary(&mut self, t: DataType, f: fn(Val) -> Result<Val>) -> Result<()> {
        let val = self.pop_typed(t)?;
        self.stack.push(f(val)?)
    }

    fn binary(&mut self, t: DataType, f: fn(Val, Val) -> Result<Val>) -> Result<()> {
        let rhs = self.stack.pop()?;
        let lhs = self.pop_typed(t)?;
        self.stack.push(f(lhs, rhs)?)
    }

    fn compare(&mut self, t: DataType, f: fn(Option<Ordering>) -> bool) -> Result<()> {
        let rhs = self.pop_typed(t)?;
        let lhs = self.pop_typed(t)?;
        let order = Operation::compare(lhs, rhs)?;
        self.stack.push(Val::Bool(f(order)))
    }
}
