use super::MAX_PROGRAMS;
use crate::engine::RegisterBank;
use crate::error;
use crate::lang::Error;
use crate::mach::{BytecodeProgram, Val};
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, Error>;

/// First input register of the export pool.
pub const IR_POOL_BASE: u16 = 220;
/// Input registers in the export pool.
pub const IR_POOL_SIZE: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrAllocation {
    pub offset: u8,
    pub size: u8,
}

impl IrAllocation {
    pub fn end(&self) -> u8 {
        self.offset + self.size
    }

    /// First input register.
    pub fn base(&self) -> u16 {
        IR_POOL_BASE + self.offset as u16
    }
}

/// ## Export register pool
///
/// A bump allocator over input registers 220..252. Freed space is only
/// reused after an explicit `compact`.

#[derive(Debug, Clone, Default)]
pub struct IrPool {
    allocations: [Option<IrAllocation>; MAX_PROGRAMS],
}

impl IrPool {
    pub fn new() -> IrPool {
        IrPool::default()
    }

    /// Registers needed for the program's exported variables.
    pub fn calculate_size(program: &BytecodeProgram) -> u8 {
        program
            .exports()
            .map(|(_, var)| var.data_type.register_count())
            .sum()
    }

    pub fn allocation(&self, program_id: usize) -> Option<IrAllocation> {
        self.allocations.get(program_id).copied().flatten()
    }

    fn high_water(&self, skip: usize) -> u8 {
        self.allocations
            .iter()
            .enumerate()
            .filter(|(id, _)| *id != skip)
            .filter_map(|(_, a)| a.map(|a| a.end()))
            .max()
            .unwrap_or(0)
    }

    pub fn used(&self) -> u8 {
        self.allocations.iter().flatten().map(|a| a.size).sum()
    }

    pub fn free_space(&self) -> u8 {
        IR_POOL_SIZE - self.used()
    }

    /// Allocates `size` registers at the high-water mark, replacing any
    /// allocation the program already holds. Size 0 leaves it unallocated.
    pub fn allocate(&mut self, program_id: usize, size: u8) -> Result<u8> {
        if program_id >= MAX_PROGRAMS {
            return Err(error!(InvalidProgramId; &format!("{}", program_id)));
        }
        if size == 0 {
            self.free(program_id);
            return Ok(0);
        }
        let offset = self.high_water(program_id);
        if size > IR_POOL_SIZE || offset + size > IR_POOL_SIZE {
            warn!(program_id, size, free = IR_POOL_SIZE.saturating_sub(offset), "IR pool exhausted");
            let msg = format!("NEED {} REGISTERS, {} FREE", size, IR_POOL_SIZE - offset);
            return Err(error!(PoolExhausted; &msg));
        }
        self.allocations[program_id] = Some(IrAllocation { offset, size });
        debug!(
            program_id,
            first = IR_POOL_BASE + offset as u16,
            last = IR_POOL_BASE + (offset + size) as u16 - 1,
            "IR registers allocated"
        );
        Ok(offset)
    }

    pub fn free(&mut self, program_id: usize) {
        if let Some(slot) = self.allocations.get_mut(program_id) {
            if let Some(allocation) = slot.take() {
                debug!(program_id, offset = allocation.offset, "IR registers freed");
            }
        }
    }

    /// Reassigns live allocations contiguously from offset 0, keeping
    /// their order.
    pub fn compact(&mut self) {
        let mut live: Vec<(usize, IrAllocation)> = self
            .allocations
            .iter()
            .enumerate()
            .filter_map(|(id, a)| a.map(|a| (id, a)))
            .collect();
        live.sort_by_key(|(_, a)| a.offset);
        let mut offset = 0;
        for (id, allocation) in live {
            self.allocations[id] = Some(IrAllocation {
                offset,
                size: allocation.size,
            });
            offset += allocation.size;
        }
        debug!(used = offset, "IR pool compacted");
    }

    /// Rebuilds the layout for the compiled programs in ascending id.
    /// Returns the programs that did not fit.
    pub fn reallocate_all(
        &mut self,
        programs: &[Option<&BytecodeProgram>],
    ) -> Vec<(usize, Error)> {
        self.allocations = [None; MAX_PROGRAMS];
        let mut failures = vec![];
        for (id, program) in programs.iter().enumerate().take(MAX_PROGRAMS) {
            if let Some(program) = program {
                if let Err(error) = self.allocate(id, IrPool::calculate_size(program)) {
                    failures.push((id, error));
                }
            }
        }
        failures
    }

    /// Publishes exported variables in declaration order. Two-register
    /// values are written low word first.
    pub fn write_exports(
        &self,
        program_id: usize,
        program: &BytecodeProgram,
        values: &[Val],
        registers: &mut dyn RegisterBank,
    ) {
        let allocation = match self.allocation(program_id) {
            Some(allocation) => allocation,
            None => return,
        };
        let mut slot = 0u16;
        for (idx, var) in program.exports() {
            let count = var.data_type.register_count() as u16;
            if slot + count > allocation.size as u16 {
                break;
            }
            let val = match values.get(idx) {
                Some(val) => val.cast(var.data_type),
                None => break,
            };
            let (low, high) = val.to_words();
            let addr = allocation.base() + slot;
            registers.set_input_register(addr, low);
            if count == 2 {
                registers.set_input_register(addr + 1, high);
            }
            slot += count;
        }
    }
}
