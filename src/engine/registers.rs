/// Registers, coils and inputs in each bank of `Registers`.
pub const REGISTER_COUNT: usize = 256;

/// ## Register space
///
/// The four Modbus data tables as the logic engine sees them.
/// Addresses outside a bank read as zero and ignore writes.

pub trait RegisterBank {
    fn holding_register(&self, addr: u16) -> u16;
    fn set_holding_register(&mut self, addr: u16, value: u16);
    fn input_register(&self, addr: u16) -> u16;
    fn set_input_register(&mut self, addr: u16, value: u16);
    fn coil(&self, addr: u16) -> bool;
    fn set_coil(&mut self, addr: u16, value: bool);
    fn discrete_input(&self, addr: u16) -> bool;
    fn set_discrete_input(&mut self, addr: u16, value: bool);
}

#[derive(Clone, PartialEq, Eq)]
pub struct Registers {
    holding: Vec<u16>,
    input: Vec<u16>,
    coils: Vec<u8>,
    discrete: Vec<u8>,
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Registers({})", REGISTER_COUNT)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            holding: vec![0; REGISTER_COUNT],
            input: vec![0; REGISTER_COUNT],
            coils: vec![0; REGISTER_COUNT / 8],
            discrete: vec![0; REGISTER_COUNT / 8],
        }
    }
}

impl Registers {
    pub fn new() -> Registers {
        Registers::default()
    }

    fn bit(bits: &[u8], addr: u16) -> bool {
        let addr = addr as usize;
        match bits.get(addr / 8) {
            Some(byte) => byte & (1 << (addr % 8)) != 0,
            None => false,
        }
    }

    fn set_bit(bits: &mut [u8], addr: u16, value: bool) {
        let addr = addr as usize;
        if let Some(byte) = bits.get_mut(addr / 8) {
            if value {
                *byte |= 1 << (addr % 8);
            } else {
                *byte &= !(1 << (addr % 8));
            }
        }
    }
}

impl RegisterBank for Registers {
    fn holding_register(&self, addr: u16) -> u16 {
        self.holding.get(addr as usize).copied().unwrap_or(0)
    }

    fn set_holding_register(&mut self, addr: u16, value: u16) {
        if let Some(reg) = self.holding.get_mut(addr as usize) {
            *reg = value;
        }
    }

    fn input_register(&self, addr: u16) -> u16 {
        self.input.get(addr as usize).copied().unwrap_or(0)
    }

    fn set_input_register(&mut self, addr: u16, value: u16) {
        if let Some(reg) = self.input.get_mut(addr as usize) {
            *reg = value;
        }
    }

    fn coil(&self, addr: u16) -> bool {
        Registers::bit(&self.coils, addr)
    }

    fn set_coil(&mut self, addr: u16, value: bool) {
        Registers::set_bit(&mut self.coils, addr, value)
    }

    fn discrete_input(&self, addr: u16) -> bool {
        Registers::bit(&self.discrete, addr)
    }

    fn set_discrete_input(&mut self, addr: u16, value: bool) {
        Registers::set_bit(&mut self.discrete, addr, value)
    }
}
