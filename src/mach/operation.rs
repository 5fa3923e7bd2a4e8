use super::Val;
use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

/// Typed arithmetic on operand pairs. Both operands already have the
/// instruction's type; a mixed pair is a `TypeMismatch` fault.
/// Integer arithmetic wraps at the width of the type.
pub struct Operation {}

impl Operation {
    pub fn negate(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Int(n) => Ok(Int(n.wrapping_neg())),
            Dint(n) => Ok(Dint(n.wrapping_neg())),
            Dword(n) => Ok(Dword(n.wrapping_neg())),
            Real(n) => Ok(Real(-n)),
            Bool(_) => Err(error!(TypeMismatch; "NEG ON BOOL")),
        }
    }

    pub fn sum(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Int(l), Int(r)) => Ok(Int(l.wrapping_add(r))),
            (Dint(l), Dint(r)) => Ok(Dint(l.wrapping_add(r))),
            (Dword(l), Dword(r)) => Ok(Dword(l.wrapping_add(r))),
            (Real(l), Real(r)) => Ok(Real(l + r)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn subtract(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Int(l), Int(r)) => Ok(Int(l.wrapping_sub(r))),
            (Dint(l), Dint(r)) => Ok(Dint(l.wrapping_sub(r))),
            (Dword(l), Dword(r)) => Ok(Dword(l.wrapping_sub(r))),
            (Real(l), Real(r)) => Ok(Real(l - r)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn multiply(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Int(l), Int(r)) => Ok(Int(l.wrapping_mul(r))),
            (Dint(l), Dint(r)) => Ok(Dint(l.wrapping_mul(r))),
            (Dword(l), Dword(r)) => Ok(Dword(l.wrapping_mul(r))),
            (Real(l), Real(r)) => Ok(Real(l * r)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn divide(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Int(_), Int(0)) | (Dint(_), Dint(0)) | (Dword(_), Dword(0)) => {
                Err(error!(DivisionByZero))
            }
            (Int(l), Int(r)) => Ok(Int(l.wrapping_div(r))),
            (Dint(l), Dint(r)) => Ok(Dint(l.wrapping_div(r))),
            (Dword(l), Dword(r)) => Ok(Dword(l / r)),
            (Real(l), Real(r)) => Ok(Real(l / r)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn modulo(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Int(_), Int(0)) | (Dint(_), Dint(0)) | (Dword(_), Dword(0)) => {
                Err(error!(DivisionByZero; "MOD BY ZERO"))
            }
            (Int(l), Int(r)) => Ok(Int(l.wrapping_rem(r))),
            (Dint(l), Dint(r)) => Ok(Dint(l.wrapping_rem(r))),
            (Dword(l), Dword(r)) => Ok(Dword(l % r)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn and(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Bool(l), Bool(r)) => Ok(Bool(l && r)),
            (Int(l), Int(r)) => Ok(Int(l & r)),
            (Dint(l), Dint(r)) => Ok(Dint(l & r)),
            (Dword(l), Dword(r)) => Ok(Dword(l & r)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn or(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Bool(l), Bool(r)) => Ok(Bool(l || r)),
            (Int(l), Int(r)) => Ok(Int(l | r)),
            (Dint(l), Dint(r)) => Ok(Dint(l | r)),
            (Dword(l), Dword(r)) => Ok(Dword(l | r)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn xor(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Bool(l), Bool(r)) => Ok(Bool(l ^ r)),
            (Int(l), Int(r)) => Ok(Int(l ^ r)),
            (Dint(l), Dint(r)) => Ok(Dint(l ^ r)),
            (Dword(l), Dword(r)) => Ok(Dword(l ^ r)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn not(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Bool(b) => Ok(Bool(!b)),
            Int(n) => Ok(Int(!n)),
            Dint(n) => Ok(Dint(!n)),
            Dword(n) => Ok(Dword(!n)),
            Real(_) => Err(error!(TypeMismatch; "NOT ON REAL")),
        }
    }

    fn shift_count(rhs: Val) -> Result<u32> {
        match rhs.as_i64() {
            n if (0..=31).contains(&n) => Ok(n as u32),
            _ => Err(error!(IllegalFunctionCall; "SHIFT COUNT OUT OF RANGE")),
        }
    }

    /// Logical shift on the bit pattern; bits past the width are lost.
    pub fn shift_left(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        let count = Operation::shift_count(rhs)?;
        match lhs {
            Int(n) => Ok(Int(((n as u16 as u32) << count) as u16 as i16)),
            Dint(n) => Ok(Dint(((n as u32 as u64) << count) as u32 as i32)),
            Dword(n) => Ok(Dword(((n as u64) << count) as u32)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn shift_right(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        let count = Operation::shift_count(rhs)?;
        match lhs {
            Int(n) => Ok(Int(((n as u16 as u32) >> count) as u16 as i16)),
            Dint(n) => Ok(Dint(((n as u32) >> count) as i32)),
            Dword(n) => Ok(Dword(n >> count)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    /// `None` when either REAL operand is NaN.
    pub fn compare(lhs: Val, rhs: Val) -> Result<Option<Ordering>> {
        use Val::*;
        match (lhs, rhs) {
            (Bool(l), Bool(r)) => Ok(Some(l.cmp(&r))),
            (Int(l), Int(r)) => Ok(Some(l.cmp(&r))),
            (Dint(l), Dint(r)) => Ok(Some(l.cmp(&r))),
            (Dword(l), Dword(r)) => Ok(Some(l.cmp(&r))),
            (Real(l), Real(r)) => Ok(l.partial_cmp(&r)),
            _ => Err(error!(TypeMismatch)),
        }
    }
}
