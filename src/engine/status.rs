use super::{Engine, RegisterBank};
use crate::pool::MAX_PROGRAMS;
use tracing::info;

pub const STATUS_REG_BASE: u16 = 200;
pub const EXEC_COUNT_REG_BASE: u16 = 204;
pub const ERROR_COUNT_REG_BASE: u16 = 208;
pub const BINDING_COUNT_REG_BASE: u16 = 212;
pub const LAST_TIME_REG_BASE: u16 = 216;

pub const STATUS_ENABLED: u16 = 1 << 0;
pub const STATUS_COMPILED: u16 = 1 << 1;
pub const STATUS_RUNNING: u16 = 1 << 2;
pub const STATUS_ERROR: u16 = 1 << 3;

pub const CONTROL_ENABLE: u16 = 1 << 0;
pub const CONTROL_RESET_ERROR: u16 = 1 << 2;

impl Engine {
    /// Status word of one program.
    pub fn status_bits(&self, program_id: usize) -> u16 {
        let program = match self.programs().get(program_id) {
            Some(program) => program,
            None => return 0,
        };
        let mut bits = 0;
        if program.enabled {
            bits |= STATUS_ENABLED;
        }
        if program.is_compiled() {
            bits |= STATUS_COMPILED;
        }
        if self.enabled() && program.enabled && program.is_compiled() && !self.is_paused(program_id) {
            bits |= STATUS_RUNNING;
        }
        if program.stats.error_count > 0 {
            bits |= STATUS_ERROR;
        }
        bits
    }

    /// Writes the per-program status block to input registers 200..220.
    pub fn publish_status(&self, registers: &mut dyn RegisterBank) {
        for (id, program) in self.programs().iter().enumerate().take(MAX_PROGRAMS) {
            let id = id as u16;
            registers.set_input_register(STATUS_REG_BASE + id, self.status_bits(id as usize));
            registers.set_input_register(
                EXEC_COUNT_REG_BASE + id,
                program.stats.execution_count as u16,
            );
            registers.set_input_register(ERROR_COUNT_REG_BASE + id, program.stats.error_count as u16);
            registers.set_input_register(BINDING_COUNT_REG_BASE + id, program.binding_count);
            registers.set_input_register(LAST_TIME_REG_BASE + id, program.stats.last_us as u16);
        }
    }

    /// Applies a control word written by a Modbus client. Bit 0 is the
    /// enable state, bit 2 clears the error.
    pub fn control_write(&mut self, program_id: usize, value: u16) {
        let enable = value & CONTROL_ENABLE != 0;
        let enabled = match self.programs().get(program_id) {
            Some(program) => program.enabled,
            None => return,
        };
        if enable != enabled && self.set_enabled(program_id, enable).is_ok() {
            info!(program_id, enable, "program enable changed by control register");
        }
        if value & CONTROL_RESET_ERROR != 0 {
            if let Ok(program) = self.program_mut(program_id) {
                if program.stats.error_count > 0 {
                    program.clear_error();
                    info!(program_id, "program error cleared by control register");
                }
            }
        }
    }
}
