use super::{DataType, Operation, Val};
use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

/// Builtin functions callable from ST. The generic ones are specialized
/// to the common type of their arguments at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Abs(DataType),
    Min(DataType),
    Max(DataType),
    Limit(DataType),
    Sel(DataType),
    Sqrt,
    Sin,
    Cos,
    Tan,
    Round,
    Trunc,
    Floor,
    Ceil,
}

impl Builtin {
    pub fn arity(&self) -> usize {
        use Builtin::*;
        match self {
            Min(_) | Max(_) => 2,
            Limit(_) | Sel(_) => 3,
            _ => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        use Builtin::*;
        match self {
            Abs(_) => "ABS",
            Min(_) => "MIN",
            Max(_) => "MAX",
            Limit(_) => "LIMIT",
            Sel(_) => "SEL",
            Sqrt => "SQRT",
            Sin => "SIN",
            Cos => "COS",
            Tan => "TAN",
            Round => "ROUND",
            Trunc => "TRUNC",
            Floor => "FLOOR",
            Ceil => "CEIL",
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        use Builtin::*;
        match self {
            Abs(t) | Min(t) | Max(t) | Limit(t) | Sel(t) => Some(*t),
            _ => None,
        }
    }
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.data_type() {
            Some(t) => write!(f, "{}({})", self.name(), t),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// How the compiler types a call by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// Numeric arguments promoted to a common type, result of that type.
    Generic(fn(DataType) -> Builtin, usize),
    /// `SEL(g, in0, in1)`: BOOL selector and two values of a common type.
    Select,
    /// One REAL argument, REAL result.
    Real(Builtin),
    /// One REAL argument, INT result.
    RealToInt(Builtin),
    /// One argument converted to the type.
    Convert(DataType),
}

pub struct Function {}

impl Function {
    pub fn signature(name: &str) -> Option<Signature> {
        use Signature::*;
        Some(match name {
            "ABS" => Generic(Builtin::Abs, 1),
            "MIN" => Generic(Builtin::Min, 2),
            "MAX" => Generic(Builtin::Max, 2),
            "LIMIT" => Generic(Builtin::Limit, 3),
            "SEL" => Select,
            "SQRT" => Real(Builtin::Sqrt),
            "SIN" => Real(Builtin::Sin),
            "COS" => Real(Builtin::Cos),
            "TAN" => Real(Builtin::Tan),
            "ROUND" => RealToInt(Builtin::Round),
            "TRUNC" => RealToInt(Builtin::Trunc),
            "FLOOR" => RealToInt(Builtin::Floor),
            "CEIL" => RealToInt(Builtin::Ceil),
            "INT_TO_REAL" | "DINT_TO_REAL" | "DWORD_TO_REAL" => Convert(DataType::Real),
            "REAL_TO_INT" | "DINT_TO_INT" | "DWORD_TO_INT" | "BOOL_TO_INT" => {
                Convert(DataType::Int)
            }
            "INT_TO_DINT" | "REAL_TO_DINT" | "DWORD_TO_DINT" | "BOOL_TO_DINT" => {
                Convert(DataType::Dint)
            }
            "INT_TO_DWORD" | "DINT_TO_DWORD" | "REAL_TO_DWORD" | "BOOL_TO_DWORD" => {
                Convert(DataType::Dword)
            }
            "INT_TO_BOOL" | "DINT_TO_BOOL" | "DWORD_TO_BOOL" => Convert(DataType::Bool),
            _ => return None,
        })
    }

    pub fn arity(signature: Signature) -> usize {
        match signature {
            Signature::Generic(_, n) => n,
            Signature::Select => 3,
            Signature::Real(_) | Signature::RealToInt(_) | Signature::Convert(_) => 1,
        }
    }

    /// Arguments in call order.
    pub fn call(builtin: Builtin, args: &[Val]) -> Result<Val> {
        if args.len() != builtin.arity() {
            return Err(error!(InternalError; "BUILTIN ARITY"));
        }
        if let Some(t) = builtin.data_type() {
            let values = match builtin {
                Builtin::Sel(_) => &args[1..],
                _ => args,
            };
            if values.iter().any(|v| v.data_type() != t) {
                return Err(error!(TypeMismatch; builtin.name()));
            }
        }
        use Builtin::*;
        match builtin {
            Abs(_) => match args[0] {
                Val::Real(n) => Ok(Val::Real(n.abs())),
                Val::Bool(_) => Err(error!(TypeMismatch; "ABS")),
                v => {
                    if Function::less(v, Val::zero(v.data_type()))? {
                        Operation::negate(v)
                    } else {
                        Ok(v)
                    }
                }
            },
            Min(_) => Ok(if Function::less(args[1], args[0])? {
                args[1]
            } else {
                args[0]
            }),
            Max(_) => Ok(if Function::less(args[0], args[1])? {
                args[1]
            } else {
                args[0]
            }),
            Limit(_) => {
                let (mn, val, mx) = (args[0], args[1], args[2]);
                if Function::less(val, mn)? {
                    Ok(mn)
                } else if Function::less(mx, val)? {
                    Ok(mx)
                } else {
                    Ok(val)
                }
            }
            Sel(_) => match args[0] {
                Val::Bool(g) => Ok(if g { args[2] } else { args[1] }),
                _ => Err(error!(TypeMismatch; "SEL")),
            },
            Sqrt => {
                let n = Function::real(args[0])?;
                if n < 0.0 {
                    Err(error!(IllegalFunctionCall; "SQRT OF NEGATIVE"))
                } else {
                    Ok(Val::Real(n.sqrt()))
                }
            }
            Sin => Ok(Val::Real(Function::real(args[0])?.sin())),
            Cos => Ok(Val::Real(Function::real(args[0])?.cos())),
            Tan => Ok(Val::Real(Function::real(args[0])?.tan())),
            Round => Ok(Function::clamp_int(Function::real(args[0])?.round())),
            Trunc => Ok(Function::clamp_int(Function::real(args[0])?.trunc())),
            Floor => Ok(Function::clamp_int(Function::real(args[0])?.floor())),
            Ceil => Ok(Function::clamp_int(Function::real(args[0])?.ceil())),
        }
    }

    fn less(lhs: Val, rhs: Val) -> Result<bool> {
        Ok(Operation::compare(lhs, rhs)? == Some(Ordering::Less))
    }

    fn real(val: Val) -> Result<f32> {
        match val {
            Val::Real(n) => Ok(n),
            _ => Err(error!(TypeMismatch; "EXPECTED REAL")),
        }
    }

    fn clamp_int(n: f32) -> Val {
        Val::Int(n.max(i16::min_value() as f32).min(i16::max_value() as f32) as i16)
    }
}
