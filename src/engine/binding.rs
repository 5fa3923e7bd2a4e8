use super::{LogicProgram, RegisterBank, REGISTER_COUNT};
use crate::error;
use crate::lang::ast::VarClass;
use crate::lang::Error;
use crate::mach::{DataType, Val};
use crate::pool::{IR_POOL_BASE, IR_POOL_SIZE, MAX_PROGRAMS};
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, Error>;

/// First input register written by the status publisher.
const RESERVED_IR_BASE: u16 = 200;

/// Where a bound variable lives in the register space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    HoldingRegister(u16),
    InputRegister(u16),
    Coil(u16),
    DiscreteInput(u16),
}

impl Target {
    /// Parses the console form, `hr`, `ir`, `coil` or `di` and an address.
    pub fn parse(kind: &str, addr: &str) -> Result<Target> {
        let addr: u16 = match addr.parse() {
            Ok(addr) => addr,
            Err(_) => return Err(error!(InvalidTarget; &format!("BAD ADDRESS {}", addr))),
        };
        Ok(match kind.to_ascii_lowercase().as_str() {
            "hr" => Target::HoldingRegister(addr),
            "ir" => Target::InputRegister(addr),
            "coil" => Target::Coil(addr),
            "di" => Target::DiscreteInput(addr),
            _ => return Err(error!(InvalidTarget; &format!("UNKNOWN KIND {}", kind))),
        })
    }

    pub fn addr(&self) -> u16 {
        match *self {
            Target::HoldingRegister(a)
            | Target::InputRegister(a)
            | Target::Coil(a)
            | Target::DiscreteInput(a) => a,
        }
    }

    fn is_bit(&self) -> bool {
        match self {
            Target::Coil(_) | Target::DiscreteInput(_) => true,
            Target::HoldingRegister(_) | Target::InputRegister(_) => false,
        }
    }

    fn read(&self, data_type: DataType, registers: &dyn RegisterBank) -> Val {
        match *self {
            Target::Coil(a) => Val::Bool(registers.coil(a)).cast(data_type),
            Target::DiscreteInput(a) => Val::Bool(registers.discrete_input(a)).cast(data_type),
            Target::HoldingRegister(a) => Val::from_words(
                data_type,
                registers.holding_register(a),
                a.checked_add(1).map_or(0, |h| registers.holding_register(h)),
            ),
            Target::InputRegister(a) => Val::from_words(
                data_type,
                registers.input_register(a),
                a.checked_add(1).map_or(0, |h| registers.input_register(h)),
            ),
        }
    }

    fn write(&self, val: Val, registers: &mut dyn RegisterBank) {
        let (low, high) = val.to_words();
        let high_addr = match val.data_type().register_count() {
            2 => self.addr().checked_add(1),
            _ => None,
        };
        match *self {
            Target::Coil(a) => registers.set_coil(a, val.is_true()),
            Target::DiscreteInput(a) => registers.set_discrete_input(a, val.is_true()),
            Target::HoldingRegister(a) => {
                registers.set_holding_register(a, low);
                if let Some(h) = high_addr {
                    registers.set_holding_register(h, high);
                }
            }
            Target::InputRegister(a) => {
                registers.set_input_register(a, low);
                if let Some(h) = high_addr {
                    registers.set_input_register(h, high);
                }
            }
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Target::HoldingRegister(a) => write!(f, "HR#{}", a),
            Target::InputRegister(a) => write!(f, "IR#{}", a),
            Target::Coil(a) => write!(f, "COIL#{}", a),
            Target::DiscreteInput(a) => write!(f, "DI#{}", a),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub program_id: usize,
    pub var_name: String,
    pub var_index: usize,
    pub data_type: DataType,
    pub direction: Direction,
    pub target: Target,
}

/// ## Variable binding table
///
/// Connects VAR_INPUT and VAR_OUTPUT variables to registers. Inputs are
/// copied in before a tick, outputs copied out after it. Each side takes
/// the program's variable lock once per sync.

#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Bindings {
        Bindings::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_for(&self, program_id: usize) -> u16 {
        self.entries
            .iter()
            .filter(|b| b.program_id == program_id)
            .count() as u16
    }

    /// Binds `var_name` of a compiled program. A variable has at most one
    /// binding; binding it again replaces the target. Rejections change
    /// nothing.
    pub fn bind(&mut self, program: &LogicProgram, var_name: &str, target: Target) -> Result<()> {
        let program_id = program.id();
        if program_id >= MAX_PROGRAMS {
            return Err(error!(InvalidProgramId; &format!("{}", program_id)));
        }
        let bytecode = match program.bytecode() {
            Some(bytecode) => bytecode,
            None => return Err(error!(NotCompiled; &program.name)),
        };
        let var_index = match bytecode.var_index(var_name) {
            Some(index) => index,
            None => return Err(error!(UndefinedVariable; &var_name.to_ascii_uppercase())),
        };
        let var = &bytecode.vars()[var_index];
        let direction = match var.class {
            VarClass::Input => Direction::Input,
            VarClass::Output => Direction::Output,
            VarClass::Local | VarClass::Constant => {
                let msg = format!("{} IS NOT VAR_INPUT OR VAR_OUTPUT", var.name);
                return Err(error!(InvalidTarget; &msg));
            }
        };
        Bindings::check_target(var.data_type, direction, target)?;
        self.entries
            .retain(|b| !(b.program_id == program_id && b.var_index == var_index));
        self.entries.push(Binding {
            program_id,
            var_name: var.name.clone(),
            var_index,
            data_type: var.data_type,
            direction,
            target,
        });
        debug!(program_id, var = %var.name, target = %target, "variable bound");
        Ok(())
    }

    fn check_target(data_type: DataType, direction: Direction, target: Target) -> Result<()> {
        let width = data_type.register_count() as usize;
        if target.is_bit() && width > 1 {
            let msg = format!("{} NEEDS A REGISTER", data_type);
            return Err(error!(InvalidTarget; &msg));
        }
        let span = if target.is_bit() { 1 } else { width };
        if target.addr() as usize + span > REGISTER_COUNT {
            return Err(error!(InvalidTarget; &format!("{} OUT OF RANGE", target)));
        }
        if let (Direction::Output, Target::InputRegister(a)) = (direction, target) {
            let reserved = RESERVED_IR_BASE..IR_POOL_BASE + IR_POOL_SIZE as u16;
            if reserved.contains(&a) || reserved.contains(&(a + span as u16 - 1)) {
                return Err(error!(InvalidTarget; &format!("{} IS RESERVED", target)));
            }
        }
        Ok(())
    }

    /// Returns false when the variable was not bound.
    pub fn unbind(&mut self, program_id: usize, var_name: &str) -> bool {
        let name = var_name.to_ascii_uppercase();
        let before = self.entries.len();
        self.entries
            .retain(|b| !(b.program_id == program_id && b.var_name == name));
        before != self.entries.len()
    }

    /// Re-resolves a program's bindings against freshly compiled bytecode.
    /// Bindings whose variable vanished or no longer fits are dropped.
    pub fn refresh(&mut self, program: &LogicProgram) {
        let stale: Vec<(String, Target)> = self
            .entries
            .iter()
            .filter(|b| b.program_id == program.id())
            .map(|b| (b.var_name.clone(), b.target))
            .collect();
        self.clear_program(program.id());
        for (var_name, target) in stale {
            if let Err(error) = self.bind(program, &var_name, target) {
                warn!(program_id = program.id(), var = %var_name, %error, "binding dropped");
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops every binding of a program.
    pub fn clear_program(&mut self, program_id: usize) {
        self.entries.retain(|b| b.program_id != program_id);
    }

    /// Copies bound registers into VAR_INPUT variables.
    pub fn sync_inputs(&self, programs: &[LogicProgram], registers: &dyn RegisterBank) {
        for program in programs {
            let inputs: Vec<&Binding> = self
                .entries
                .iter()
                .filter(|b| b.program_id == program.id() && b.direction == Direction::Input)
                .collect();
            if inputs.is_empty() {
                continue;
            }
            let shared = program.shared_vars();
            let mut vars = match shared.lock() {
                Ok(vars) => vars,
                Err(poisoned) => poisoned.into_inner(),
            };
            for binding in inputs {
                if let Some(var) = vars.get_mut(binding.var_index) {
                    *var = binding.target.read(binding.data_type, registers);
                }
            }
        }
    }

    /// Copies VAR_OUTPUT variables to their registers.
    pub fn sync_outputs(&self, programs: &[LogicProgram], registers: &mut dyn RegisterBank) {
        for program in programs {
            let outputs: Vec<&Binding> = self
                .entries
                .iter()
                .filter(|b| b.program_id == program.id() && b.direction == Direction::Output)
                .collect();
            if outputs.is_empty() {
                continue;
            }
            let values = program.values();
            for binding in outputs {
                if let Some(val) = values.get(binding.var_index) {
                    binding.target.write(val.cast(binding.data_type), registers);
                }
            }
        }
    }
}
