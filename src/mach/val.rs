pub use crate::lang::ast::DataType;

/// ## Tagged runtime value
///
/// Every stack slot and variable carries its type so that typed
/// instructions can verify their operands.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Val {
    Bool(bool),
    Int(i16),
    Dint(i32),
    Dword(u32),
    Real(f32),
}

impl Default for Val {
    fn default() -> Self {
        Val::Int(0)
    }
}

impl Val {
    pub fn zero(data_type: DataType) -> Val {
        match data_type {
            DataType::Bool => Val::Bool(false),
            DataType::Int => Val::Int(0),
            DataType::Dint => Val::Dint(0),
            DataType::Dword => Val::Dword(0),
            DataType::Real => Val::Real(0.0),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Val::Bool(_) => DataType::Bool,
            Val::Int(_) => DataType::Int,
            Val::Dint(_) => DataType::Dint,
            Val::Dword(_) => DataType::Dword,
            Val::Real(_) => DataType::Real,
        }
    }

    /// Integer view used by casts and case selectors. REAL truncates.
    pub fn as_i64(&self) -> i64 {
        match *self {
            Val::Bool(b) => b as i64,
            Val::Int(n) => n as i64,
            Val::Dint(n) => n as i64,
            Val::Dword(n) => n as i64,
            Val::Real(n) => n as i64,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            Val::Bool(b) => b as i32 as f32,
            Val::Int(n) => n as f32,
            Val::Dint(n) => n as f32,
            Val::Dword(n) => n as f32,
            Val::Real(n) => n,
        }
    }

    pub fn is_true(&self) -> bool {
        match *self {
            Val::Bool(b) => b,
            Val::Real(n) => n != 0.0,
            _ => self.as_i64() != 0,
        }
    }

    /// Converts to another type. Integers wrap at the target width,
    /// REAL to integer truncates toward zero and saturates.
    pub fn cast(&self, data_type: DataType) -> Val {
        if self.data_type() == data_type {
            return *self;
        }
        match data_type {
            DataType::Bool => Val::Bool(self.is_true()),
            DataType::Real => Val::Real(self.as_f32()),
            DataType::Int => match *self {
                Val::Real(n) => Val::Int(n as i16),
                _ => Val::Int(self.as_i64() as i16),
            },
            DataType::Dint => match *self {
                Val::Real(n) => Val::Dint(n as i32),
                _ => Val::Dint(self.as_i64() as i32),
            },
            DataType::Dword => match *self {
                Val::Real(n) => Val::Dword(n as u32),
                _ => Val::Dword(self.as_i64() as u32),
            },
        }
    }

    /// Register image, low word first. Single-register types leave the
    /// high word at zero.
    pub fn to_words(&self) -> (u16, u16) {
        let bits: u32 = match *self {
            Val::Bool(b) => b as u32,
            Val::Int(n) => n as u16 as u32,
            Val::Dint(n) => n as u32,
            Val::Dword(n) => n,
            Val::Real(n) => n.to_bits(),
        };
        (bits as u16, (bits >> 16) as u16)
    }

    pub fn from_words(data_type: DataType, low: u16, high: u16) -> Val {
        let bits = (low as u32) | ((high as u32) << 16);
        match data_type {
            DataType::Bool => Val::Bool(low != 0),
            DataType::Int => Val::Int(low as i16),
            DataType::Dint => Val::Dint(bits as i32),
            DataType::Dword => Val::Dword(bits),
            DataType::Real => Val::Real(f32::from_bits(bits)),
        }
    }
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Val::Bool(true) => write!(f, "TRUE"),
            Val::Bool(false) => write!(f, "FALSE"),
            Val::Int(n) => write!(f, "{}", n),
            Val::Dint(n) => write!(f, "{}", n),
            Val::Dword(n) => write!(f, "{}", n),
            Val::Real(n) => write!(f, "{:?}", n),
        }
    }
}
