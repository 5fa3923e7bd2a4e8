use super::function::Signature;
use super::{Builtin, DataType, Function, Opcode, Val, Variable};
use crate::error;
use crate::lang::ast::{BinaryOp, Expression};
use crate::lang::{Column, Error};

type Result<T> = std::result::Result<T, Error>;

/// Maximum arguments accepted by a function call.
pub const MAX_ARGUMENTS: usize = 4;

/// A compiled expression and the type it leaves on the stack.
/// Expressions never branch so a fragment needs no linking.
#[derive(Debug)]
pub struct Fragment {
    pub ops: Vec<Opcode>,
    pub data_type: DataType,
}

impl Fragment {
    fn new(op: Opcode, data_type: DataType) -> Fragment {
        Fragment {
            ops: vec![op],
            data_type,
        }
    }

    /// Converts the value to `data_type`. Literals are converted in place.
    pub fn cast(&mut self, data_type: DataType) {
        if self.data_type == data_type {
            return;
        }
        match self.ops.as_mut_slice() {
            [Opcode::Literal(val)] => *val = val.cast(data_type),
            _ => self.ops.push(Opcode::Cast(data_type)),
        }
        self.data_type = data_type;
    }

    fn append(&mut self, mut other: Fragment) {
        self.ops.append(&mut other.ops);
    }
}

/// Literal type of an integer constant: the narrowest of INT, DINT, DWORD.
pub fn integer_literal(n: i64, col: &Column) -> Result<Val> {
    if n >= i16::min_value() as i64 && n <= i16::max_value() as i64 {
        Ok(Val::Int(n as i16))
    } else if n >= i32::min_value() as i64 && n <= i32::max_value() as i64 {
        Ok(Val::Dint(n as i32))
    } else if n >= 0 && n <= u32::max_value() as i64 {
        Ok(Val::Dword(n as u32))
    } else {
        Err(error!(SyntaxError, ..col; "INTEGER OUT OF RANGE"))
    }
}

/// Value of a literal initializer, allowing a leading minus.
pub fn constant(expr: &Expression) -> Result<Val> {
    match expr {
        Expression::Integer(col, n) => integer_literal(*n, col),
        Expression::Real(_, n) => Ok(Val::Real(*n as f32)),
        Expression::Bool(_, b) => Ok(Val::Bool(*b)),
        Expression::Negation(col, inner) => match inner.as_ref() {
            Expression::Integer(_, n) => integer_literal(-n, col),
            Expression::Real(_, n) => Ok(Val::Real(-*n as f32)),
            _ => Err(error!(SyntaxError, ..col; "INITIALIZER MUST BE A LITERAL")),
        },
        _ => Err(error!(SyntaxError, ..&expr.column(); "INITIALIZER MUST BE A LITERAL")),
    }
}

/// ## Expression code generation
///
/// Operands are promoted to their common type (INT < DINT < DWORD < REAL)
/// and the type-specialized opcode is emitted for that type.

pub struct Codegen<'a> {
    vars: &'a [Variable],
}

impl<'a> Codegen<'a> {
    pub fn new(vars: &'a [Variable]) -> Codegen<'a> {
        Codegen { vars }
    }

    pub fn lookup(&self, name: &str, col: &Column) -> Result<(usize, &'a Variable)> {
        match self.vars.iter().position(|v| v.name == name) {
            Some(idx) => Ok((idx, &self.vars[idx])),
            None => Err(error!(UndefinedVariable, ..col; name)),
        }
    }

    pub fn expression(&self, expr: &Expression) -> Result<Fragment> {
        match expr {
            Expression::Integer(col, n) => {
                let val = integer_literal(*n, col)?;
                Ok(Fragment::new(Opcode::Literal(val), val.data_type()))
            }
            Expression::Real(_, n) => Ok(Fragment::new(
                Opcode::Literal(Val::Real(*n as f32)),
                DataType::Real,
            )),
            Expression::Bool(_, b) => Ok(Fragment::new(
                Opcode::Literal(Val::Bool(*b)),
                DataType::Bool,
            )),
            Expression::Var(col, name) => {
                let (idx, var) = self.lookup(name, col)?;
                Ok(Fragment::new(Opcode::Load(idx), var.data_type))
            }
            Expression::Negation(col, inner) => self.negation(col, inner),
            Expression::Not(col, inner) => {
                let mut frag = self.expression(inner)?;
                if frag.data_type == DataType::Real {
                    return Err(error!(TypeMismatch, ..col; "NOT ON REAL"));
                }
                frag.ops.push(Opcode::Not(frag.data_type));
                Ok(frag)
            }
            Expression::Binary(col, op, lhs, rhs) => self.binary(col, *op, lhs, rhs),
            Expression::Function(col, name, args) => self.function(col, name, args),
        }
    }

    fn negation(&self, col: &Column, inner: &Expression) -> Result<Fragment> {
        match inner {
            Expression::Integer(_, n) => {
                let val = integer_literal(-n, col)?;
                Ok(Fragment::new(Opcode::Literal(val), val.data_type()))
            }
            Expression::Real(_, n) => Ok(Fragment::new(
                Opcode::Literal(Val::Real(-*n as f32)),
                DataType::Real,
            )),
            _ => {
                let mut frag = self.expression(inner)?;
                if frag.data_type == DataType::Bool {
                    return Err(error!(TypeMismatch, ..col; "NEGATION OF BOOL"));
                }
                frag.ops.push(Opcode::Neg(frag.data_type));
                Ok(frag)
            }
        }
    }

    fn binary(
        &self,
        col: &Column,
        op: BinaryOp,
        lhs: &Expression,
        rhs: &Expression,
    ) -> Result<Fragment> {
        let mut lhs = self.expression(lhs)?;
        let mut rhs = self.expression(rhs)?;
        let (l, r) = (lhs.data_type, rhs.data_type);
        if (l == DataType::Bool) != (r == DataType::Bool) {
            return Err(error!(TypeMismatch, ..col; "BOOL MIXED WITH NUMBER"));
        }
        let data_type = match op {
            BinaryOp::Shl | BinaryOp::Shr => l,
            _ => l.promote(r),
        };
        use BinaryOp::*;
        match op {
            Add | Subtract | Multiply | Divide if data_type == DataType::Bool => {
                return Err(error!(TypeMismatch, ..col; "ARITHMETIC ON BOOL"));
            }
            Modulo | Shl | Shr if !data_type.is_integer() => {
                return Err(error!(TypeMismatch, ..col; "INTEGER OPERANDS REQUIRED"));
            }
            And | Or | Xor if data_type == DataType::Real => {
                return Err(error!(TypeMismatch, ..col; "LOGIC ON REAL"));
            }
            _ => {}
        }
        lhs.cast(data_type);
        rhs.cast(data_type);
        let opcode = match op {
            Add => Opcode::Add(data_type),
            Subtract => Opcode::Sub(data_type),
            Multiply => Opcode::Mul(data_type),
            Divide => Opcode::Div(data_type),
            Modulo => Opcode::Mod(data_type),
            Shl => Opcode::Shl(data_type),
            Shr => Opcode::Shr(data_type),
            Equal => Opcode::Eq(data_type),
            NotEqual => Opcode::Ne(data_type),
            Less => Opcode::Lt(data_type),
            LessEqual => Opcode::Le(data_type),
            Greater => Opcode::Gt(data_type),
            GreaterEqual => Opcode::Ge(data_type),
            And => Opcode::And(data_type),
            Or => Opcode::Or(data_type),
            Xor => Opcode::Xor(data_type),
        };
        lhs.append(rhs);
        lhs.ops.push(opcode);
        if op.is_comparison() {
            lhs.data_type = DataType::Bool;
        }
        Ok(lhs)
    }

    fn function(&self, col: &Column, name: &str, args: &[Expression]) -> Result<Fragment> {
        let signature = match Function::signature(name) {
            Some(signature) => signature,
            None => return Err(error!(UndefinedFunction, ..col; name)),
        };
        if args.len() > MAX_ARGUMENTS || args.len() != Function::arity(signature) {
            let msg = format!("{} TAKES {} ARGUMENTS", name, Function::arity(signature));
            return Err(error!(WrongArgumentCount, ..col; &msg));
        }
        let mut frags = args
            .iter()
            .map(|arg| self.expression(arg))
            .collect::<Result<Vec<_>>>()?;
        let (builtin, result_type) = match signature {
            Signature::Generic(ctor, _) => {
                if frags.iter().any(|f| f.data_type == DataType::Bool) {
                    return Err(error!(TypeMismatch, ..col; "NUMERIC ARGUMENTS REQUIRED"));
                }
                let data_type = Codegen::common_type(&frags);
                frags.iter_mut().for_each(|f| f.cast(data_type));
                (ctor(data_type), data_type)
            }
            Signature::Select => {
                if frags[0].data_type != DataType::Bool {
                    return Err(error!(TypeMismatch, ..col; "SEL SELECTOR MUST BE BOOL"));
                }
                let (a, b) = (frags[1].data_type, frags[2].data_type);
                if (a == DataType::Bool) != (b == DataType::Bool) {
                    return Err(error!(TypeMismatch, ..col; "BOOL MIXED WITH NUMBER"));
                }
                let data_type = a.promote(b);
                frags[1].cast(data_type);
                frags[2].cast(data_type);
                (Builtin::Sel(data_type), data_type)
            }
            Signature::Real(builtin) | Signature::RealToInt(builtin) => {
                if frags[0].data_type == DataType::Bool {
                    return Err(error!(TypeMismatch, ..col; "NUMERIC ARGUMENT REQUIRED"));
                }
                frags[0].cast(DataType::Real);
                let result_type = match signature {
                    Signature::Real(_) => DataType::Real,
                    _ => DataType::Int,
                };
                (builtin, result_type)
            }
            Signature::Convert(data_type) => {
                let mut frag = frags.remove(0);
                frag.cast(data_type);
                return Ok(frag);
            }
        };
        let mut frag = Fragment {
            ops: vec![],
            data_type: result_type,
        };
        for arg in frags {
            frag.append(arg);
        }
        frag.ops.push(Opcode::Call(builtin));
        Ok(frag)
    }

    fn common_type(frags: &[Fragment]) -> DataType {
        frags
            .iter()
            .map(|f| f.data_type)
            .fold(DataType::Int, DataType::promote)
    }
}
