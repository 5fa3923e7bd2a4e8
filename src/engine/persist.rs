use super::{Engine, ExecInterval, LogicProgram};
use crate::error;
use crate::lang::ast::VarClass;
use crate::lang::Error;
use crate::mach::{
    Builtin, BytecodeProgram, DataType, Opcode, Val, Variable, MAX_INSTRUCTIONS, MAX_VARIABLES,
};
use crate::pool::{IrPool, SourcePool, MAX_PROGRAMS};
use std::convert::TryFrom;
use tracing::{debug, info, warn};

type Result<T> = std::result::Result<T, Error>;

pub const CONFIG_MAGIC: &[u8; 4] = b"STLG";
pub const CONFIG_SCHEMA: u16 = 1;

const FLAG_ENABLED: u8 = 1 << 0;
const FLAG_DEBUG: u8 = 1 << 1;

/// Bytes per encoded instruction: tag, type, 32-bit argument.
const OP_WIDTH: usize = 6;

// *** Value and type encoding

fn type_byte(data_type: DataType) -> u8 {
    match data_type {
        DataType::Bool => 0,
        DataType::Int => 1,
        DataType::Dint => 2,
        DataType::Dword => 3,
        DataType::Real => 4,
    }
}

fn byte_type(byte: u8) -> Option<DataType> {
    Some(match byte {
        0 => DataType::Bool,
        1 => DataType::Int,
        2 => DataType::Dint,
        3 => DataType::Dword,
        4 => DataType::Real,
        _ => return None,
    })
}

fn class_byte(class: VarClass) -> u8 {
    match class {
        VarClass::Local => 0,
        VarClass::Input => 1,
        VarClass::Output => 2,
        VarClass::Constant => 3,
    }
}

fn byte_class(byte: u8) -> Option<VarClass> {
    Some(match byte {
        0 => VarClass::Local,
        1 => VarClass::Input,
        2 => VarClass::Output,
        3 => VarClass::Constant,
        _ => return None,
    })
}

fn val_bits(val: Val) -> u32 {
    let (low, high) = val.to_words();
    low as u32 | (high as u32) << 16
}

fn bits_val(data_type: DataType, bits: u32) -> Val {
    Val::from_words(data_type, bits as u16, (bits >> 16) as u16)
}

// *** Instruction encoding

fn builtin_byte(builtin: Builtin) -> u8 {
    use Builtin::*;
    match builtin {
        Abs(_) => 0,
        Min(_) => 1,
        Max(_) => 2,
        Limit(_) => 3,
        Sel(_) => 4,
        Sqrt => 5,
        Sin => 6,
        Cos => 7,
        Tan => 8,
        Round => 9,
        Trunc => 10,
        Floor => 11,
        Ceil => 12,
    }
}

fn byte_builtin(byte: u8, data_type: DataType) -> Option<Builtin> {
    use Builtin::*;
    Some(match byte {
        0 => Abs(data_type),
        1 => Min(data_type),
        2 => Max(data_type),
        3 => Limit(data_type),
        4 => Sel(data_type),
        5 => Sqrt,
        6 => Sin,
        7 => Cos,
        8 => Tan,
        9 => Round,
        10 => Trunc,
        11 => Floor,
        12 => Ceil,
        _ => return None,
    })
}

/// Fixed-width image of one instruction.
pub fn encode_op(op: &Opcode) -> [u8; OP_WIDTH] {
    use Opcode::*;
    let (tag, t, arg): (u8, u8, u32) = match *op {
        Literal(v) => (0x01, type_byte(v.data_type()), val_bits(v)),
        Load(i) => (0x02, 0, i as u32),
        Store(i) => (0x03, 0, i as u32),
        Dup => (0x04, 0, 0),
        Pop => (0x05, 0, 0),
        Cast(t) => (0x10, type_byte(t), 0),
        Add(t) => (0x20, type_byte(t), 0),
        Sub(t) => (0x21, type_byte(t), 0),
        Mul(t) => (0x22, type_byte(t), 0),
        Div(t) => (0x23, type_byte(t), 0),
        Mod(t) => (0x24, type_byte(t), 0),
        Neg(t) => (0x25, type_byte(t), 0),
        And(t) => (0x30, type_byte(t), 0),
        Or(t) => (0x31, type_byte(t), 0),
        Xor(t) => (0x32, type_byte(t), 0),
        Not(t) => (0x33, type_byte(t), 0),
        Shl(t) => (0x34, type_byte(t), 0),
        Shr(t) => (0x35, type_byte(t), 0),
        Eq(t) => (0x40, type_byte(t), 0),
        Ne(t) => (0x41, type_byte(t), 0),
        Lt(t) => (0x42, type_byte(t), 0),
        Gt(t) => (0x43, type_byte(t), 0),
        Le(t) => (0x44, type_byte(t), 0),
        Ge(t) => (0x45, type_byte(t), 0),
        Jump(a) => (0x50, 0, a as u32),
        JumpIfFalse(a) => (0x51, 0, a as u32),
        JumpIfTrue(a) => (0x52, 0, a as u32),
        Call(b) => (
            0x60,
            b.data_type().map(type_byte).unwrap_or(0),
            builtin_byte(b) as u32,
        ),
        Nop => (0x00, 0, 0),
        Halt => (0xFF, 0, 0),
        Illegal(byte) => (byte, 0xFF, 0),
    };
    let a = arg.to_le_bytes();
    [tag, t, a[0], a[1], a[2], a[3]]
}

/// Inverse of `encode_op`. Anything unrecognized becomes `Illegal` so the
/// fault surfaces when that program runs.
pub fn decode_op(bytes: &[u8; OP_WIDTH]) -> Opcode {
    use Opcode::*;
    let tag = bytes[0];
    let arg = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
    let t = match byte_type(bytes[1]) {
        Some(t) => t,
        None => return Illegal(tag),
    };
    match tag {
        0x00 => Nop,
        0x01 => Literal(bits_val(t, arg)),
        0x02 => Load(arg as usize),
        0x03 => Store(arg as usize),
        0x04 => Dup,
        0x05 => Pop,
        0x10 => Cast(t),
        0x20 => Add(t),
        0x21 => Sub(t),
        0x22 => Mul(t),
        0x23 => Div(t),
        0x24 => Mod(t),
        0x25 => Neg(t),
        0x30 => And(t),
        0x31 => Or(t),
        0x32 => Xor(t),
        0x33 => Not(t),
        0x34 => Shl(t),
        0x35 => Shr(t),
        0x40 => Eq(t),
        0x41 => Ne(t),
        0x42 => Lt(t),
        0x43 => Gt(t),
        0x44 => Le(t),
        0x45 => Ge(t),
        0x50 => Jump(arg as usize),
        0x51 => JumpIfFalse(arg as usize),
        0x52 => JumpIfTrue(arg as usize),
        0x60 => match byte_builtin(arg as u8, t) {
            Some(builtin) if arg <= 0xFF => Call(builtin),
            _ => Illegal(tag),
        },
        0xFF => Halt,
        _ => Illegal(tag),
    }
}

// *** Blob writer and reader

#[derive(Default)]
struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, n: u8) {
        self.bytes.push(n);
    }

    fn u16(&mut self, n: u16) {
        self.bytes.extend_from_slice(&n.to_le_bytes());
    }

    fn u32(&mut self, n: u32) {
        self.bytes.extend_from_slice(&n.to_le_bytes());
    }

    fn short_str(&mut self, s: &str) {
        let s = &s.as_bytes()[..s.len().min(255)];
        self.u8(s.len() as u8);
        self.bytes.extend_from_slice(s);
    }

    fn long_bytes(&mut self, b: &[u8]) {
        self.u16(b.len() as u16);
        self.bytes.extend_from_slice(b);
    }

    fn val(&mut self, val: Val) {
        self.u8(type_byte(val.data_type()));
        self.u32(val_bits(val));
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(error!(ConfigCorrupt; "TRUNCATED"));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn flag(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(error!(ConfigCorrupt; "BAD FLAG")),
        }
    }

    fn short_str(&mut self) -> Result<String> {
        let len = self.u8()? as usize;
        self.utf8(len)
    }

    fn utf8(&mut self, len: usize) -> Result<String> {
        match std::str::from_utf8(self.take(len)?) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => Err(error!(ConfigCorrupt; "BAD TEXT")),
        }
    }

    fn data_type(&mut self) -> Result<DataType> {
        match byte_type(self.u8()?) {
            Some(t) => Ok(t),
            None => Err(error!(ConfigCorrupt; "BAD TYPE")),
        }
    }

    fn val(&mut self) -> Result<Val> {
        let t = self.data_type()?;
        Ok(bits_val(t, self.u32()?))
    }
}

/// A program as read back from a blob, before it touches the engine.
struct Record {
    name: String,
    enabled: bool,
    source: Vec<u8>,
    compiled: Option<(BytecodeProgram, Vec<Val>)>,
}

fn write_record(w: &mut Writer, program: &LogicProgram, source: &[u8]) {
    w.short_str(&program.name);
    w.u8(program.enabled as u8);
    w.long_bytes(source);
    match program.bytecode() {
        None => w.u8(0),
        Some(bytecode) => {
            w.u8(1);
            match bytecode.name() {
                Some(name) => {
                    w.u8(1);
                    w.short_str(name);
                }
                None => w.u8(0),
            }
            w.u16(bytecode.instruction_count() as u16);
            for op in bytecode.ops() {
                w.bytes.extend_from_slice(&encode_op(op));
            }
            let values = program.values();
            w.u8(bytecode.var_count() as u8);
            for (idx, var) in bytecode.vars().iter().enumerate() {
                w.short_str(&var.name);
                w.u8(type_byte(var.data_type));
                w.u8(class_byte(var.class));
                w.u8(var.export as u8);
                w.val(var.initial);
                w.val(values.get(idx).copied().unwrap_or(var.initial));
            }
        }
    }
}

fn read_record(r: &mut Reader) -> Result<Record> {
    let name = r.short_str()?;
    let enabled = r.flag()?;
    let len = r.u16()? as usize;
    let source = r.take(len)?.to_vec();
    if !r.flag()? {
        return Ok(Record {
            name,
            enabled,
            source,
            compiled: None,
        });
    }
    let program_name = if r.flag()? { Some(r.short_str()?) } else { None };
    let count = r.u16()? as usize;
    if count == 0 || count > MAX_INSTRUCTIONS {
        return Err(error!(ConfigCorrupt; "BAD INSTRUCTION COUNT"));
    }
    let mut ops = Vec::with_capacity(count);
    for _ in 0..count {
        let mut image = [0u8; OP_WIDTH];
        image.copy_from_slice(r.take(OP_WIDTH)?);
        ops.push(decode_op(&image));
    }
    let var_count = r.u8()? as usize;
    if var_count > MAX_VARIABLES {
        return Err(error!(ConfigCorrupt; "BAD VARIABLE COUNT"));
    }
    let mut vars = Vec::with_capacity(var_count);
    let mut values = Vec::with_capacity(var_count);
    for _ in 0..var_count {
        let name = r.short_str()?;
        let data_type = r.data_type()?;
        let class = match byte_class(r.u8()?) {
            Some(class) => class,
            None => return Err(error!(ConfigCorrupt; "BAD VARIABLE CLASS")),
        };
        let export = r.flag()?;
        let initial = r.val()?.cast(data_type);
        let value = r.val()?.cast(data_type);
        vars.push(Variable {
            name,
            data_type,
            class,
            export,
            initial,
        });
        values.push(value);
    }
    Ok(Record {
        name,
        enabled,
        source,
        compiled: Some((BytecodeProgram::new(program_name, ops, vars), values)),
    })
}

impl Engine {
    /// Serializes engine settings and every program slot:
    /// `"STLG" | schema | interval | flags | 4 records | crc32`.
    pub fn save_to_config(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.bytes.extend_from_slice(CONFIG_MAGIC);
        w.u16(CONFIG_SCHEMA);
        w.u16(self.config.interval.as_ms() as u16);
        let mut flags = 0;
        if self.config.enabled {
            flags |= FLAG_ENABLED;
        }
        if self.config.debug {
            flags |= FLAG_DEBUG;
        }
        w.u8(flags);
        for program in &self.programs {
            let source = self.sources.get_source(program.id()).unwrap_or(&[]);
            write_record(&mut w, program, source);
        }
        let crc = crc::crc32::checksum_ieee(&w.bytes);
        w.u32(crc);
        debug!(size = w.bytes.len(), crc, "config saved");
        w.bytes
    }

    /// Replaces all programs with the blob's contents. A blob that fails
    /// any check leaves the engine untouched. Bindings and debugger state
    /// are dropped and the IR pool is rebuilt.
    pub fn load_from_config(&mut self, blob: &[u8]) -> Result<()> {
        if blob.len() < CONFIG_MAGIC.len() + 2 + 2 + 1 + 4 || &blob[..4] != CONFIG_MAGIC {
            return Err(error!(ConfigCorrupt; "BAD MAGIC"));
        }
        let (body, tail) = blob.split_at(blob.len() - 4);
        let mut r = Reader {
            bytes: body,
            pos: CONFIG_MAGIC.len(),
        };
        let schema = r.u16()?;
        if schema != CONFIG_SCHEMA {
            return Err(error!(UnsupportedVersion; &format!("SCHEMA {}", schema)));
        }
        let stored = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        let crc = crc::crc32::checksum_ieee(body);
        if crc != stored {
            warn!(stored, computed = crc, "config CRC mismatch");
            return Err(error!(ConfigCorrupt; "CRC MISMATCH"));
        }
        let interval = ExecInterval::try_from(r.u16()? as u32)
            .map_err(|_| error!(ConfigCorrupt; "BAD INTERVAL"))?;
        let flags = r.u8()?;
        let mut records = Vec::with_capacity(MAX_PROGRAMS);
        for _ in 0..MAX_PROGRAMS {
            records.push(read_record(&mut r)?);
        }
        if r.pos != body.len() {
            return Err(error!(ConfigCorrupt; "TRAILING BYTES"));
        }

        let mut sources = SourcePool::new();
        for (id, record) in records.iter().enumerate() {
            sources
                .upload(id, &record.source)
                .map_err(|e| error!(ConfigCorrupt; &e.to_string()))?;
        }

        self.config.interval = interval;
        self.config.enabled = flags & FLAG_ENABLED != 0;
        self.config.debug = flags & FLAG_DEBUG != 0;
        self.sources = sources;
        self.bindings.clear();
        for debugger in self.debuggers.iter_mut() {
            debugger.stop();
            debugger.clear_breakpoints();
        }
        for (id, record) in records.into_iter().enumerate() {
            let mut program = LogicProgram::new(id);
            program.name = record.name;
            program.enabled = record.enabled;
            if let Some((bytecode, values)) = record.compiled {
                program.install(bytecode);
                program.set_values(values);
            }
            self.programs[id] = program;
        }
        self.ir_pool = IrPool::new();
        let compiled: Vec<Option<&BytecodeProgram>> =
            self.programs.iter().map(|p| p.bytecode()).collect();
        let failures = self.ir_pool.reallocate_all(&compiled);
        for (id, error) in failures {
            warn!(program_id = id, %error, "exports not allocated after load");
            self.programs[id].set_last_error(&error.to_string());
        }
        info!(interval = %interval, "config loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_images_are_stable() {
        assert_eq!(encode_op(&Opcode::Halt), [0xFF, 0, 0, 0, 0, 0]);
        assert_eq!(encode_op(&Opcode::Jump(0x0102)), [0x50, 0, 2, 1, 0, 0]);
        assert_eq!(
            encode_op(&Opcode::Literal(Val::Int(-1))),
            [0x01, 1, 0xFF, 0xFF, 0, 0]
        );
    }

    #[test]
    fn test_decode_every_kind() {
        let ops = vec![
            Opcode::Literal(Val::Real(1.5)),
            Opcode::Store(3),
            Opcode::Cast(DataType::Dword),
            Opcode::Shr(DataType::Dint),
            Opcode::Ge(DataType::Real),
            Opcode::JumpIfTrue(9),
            Opcode::Call(Builtin::Limit(DataType::Int)),
            Opcode::Call(Builtin::Sqrt),
            Opcode::Nop,
        ];
        for op in ops {
            assert_eq!(decode_op(&encode_op(&op)), op);
        }
    }

    #[test]
    fn test_unknown_bytes_decode_illegal() {
        assert_eq!(decode_op(&[0xEE, 0, 0, 0, 0, 0]), Opcode::Illegal(0xEE));
        assert_eq!(decode_op(&[0x20, 9, 0, 0, 0, 0]), Opcode::Illegal(0x20));
        assert_eq!(decode_op(&[0x60, 0, 77, 0, 0, 0]), Opcode::Illegal(0x60));
        let illegal = Opcode::Illegal(0x20);
        assert_eq!(decode_op(&encode_op(&illegal)), illegal);
    }
}
