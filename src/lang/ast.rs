use super::Column;

/// Elementary types of ST-light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Bool,
    Int,
    Dint,
    Dword,
    Real,
}

impl DataType {
    /// Input registers an exported variable of this type occupies.
    pub fn register_count(self) -> u8 {
        match self {
            DataType::Bool | DataType::Int => 1,
            DataType::Dint | DataType::Dword | DataType::Real => 2,
        }
    }

    pub fn is_integer(self) -> bool {
        match self {
            DataType::Int | DataType::Dint | DataType::Dword => true,
            DataType::Bool | DataType::Real => false,
        }
    }

    /// Common type of a binary numeric operation. INT < DINT < DWORD < REAL.
    pub fn promote(self, other: DataType) -> DataType {
        std::cmp::max(self, other)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            DataType::Bool => "BOOL",
            DataType::Int => "INT",
            DataType::Dint => "DINT",
            DataType::Dword => "DWORD",
            DataType::Real => "REAL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarClass {
    Local,
    Input,
    Output,
    Constant,
}

#[derive(Debug, PartialEq)]
pub struct Program {
    pub name: Option<String>,
    pub vars: Vec<VarDecl>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq)]
pub struct VarDecl {
    pub line: u16,
    pub column: Column,
    pub name: String,
    pub data_type: DataType,
    pub class: VarClass,
    pub export: bool,
    pub init: Option<Expression>,
}

#[derive(Debug, PartialEq)]
pub enum Statement {
    Assign(u16, Column, String, Expression),
    If(u16, Vec<(Expression, Vec<Statement>)>, Vec<Statement>),
    Case(u16, Expression, Vec<CaseArm>, Vec<Statement>),
    For(u16, For),
    While(u16, Expression, Vec<Statement>),
    Repeat(u16, Vec<Statement>, Expression),
    Exit(u16, Column),
    Return(u16),
}

#[derive(Debug, PartialEq)]
pub struct For {
    pub column: Column,
    pub var: String,
    pub from: Expression,
    pub to: Expression,
    pub by: Option<Expression>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq)]
pub struct CaseArm {
    pub labels: Vec<CaseLabel>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CaseLabel {
    Value(i64),
    Range(i64, i64),
}

impl CaseLabel {
    pub fn contains(&self, n: i64) -> bool {
        match *self {
            CaseLabel::Value(v) => v == n,
            CaseLabel::Range(lo, hi) => lo <= n && n <= hi,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Integer(Column, i64),
    Real(Column, f64),
    Bool(Column, bool),
    Var(Column, String),
    Function(Column, String, Vec<Expression>),
    Negation(Column, Box<Expression>),
    Not(Column, Box<Expression>),
    Binary(Column, BinaryOp, Box<Expression>, Box<Expression>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Shl,
    Shr,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        use BinaryOp::*;
        match self {
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => true,
            _ => false,
        }
    }
}

impl Expression {
    pub fn column(&self) -> Column {
        use Expression::*;
        match self {
            Integer(c, ..)
            | Real(c, ..)
            | Bool(c, ..)
            | Var(c, ..)
            | Function(c, ..)
            | Negation(c, ..)
            | Not(c, ..)
            | Binary(c, ..) => c.clone(),
        }
    }

    /// Value of an integer literal, allowing a leading minus.
    pub fn integer_constant(&self) -> Option<i64> {
        match self {
            Expression::Integer(_, n) => Some(*n),
            Expression::Negation(_, expr) => expr.integer_constant().map(|n| -n),
            _ => None,
        }
    }
}
