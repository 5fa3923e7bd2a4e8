use super::Column;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Unknown(String),
    Literal(Literal),
    Word(Word),
    Operator(Operator),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
    Assign,
    Range,
}

/// A token with the position it was lexed from.
#[derive(Debug, PartialEq, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u16,
    pub column: Column,
}

impl Token {
    pub fn from_string(s: &str) -> Option<Token> {
        use Word::*;
        let word = match s {
            "PROGRAM" => Program,
            "END_PROGRAM" => EndProgram,
            "BEGIN" => Begin,
            "VAR" => Var,
            "VAR_INPUT" => VarInput,
            "VAR_OUTPUT" => VarOutput,
            "CONSTANT" | "CONST" => Constant,
            "END_VAR" => EndVar,
            "EXPORT" => Export,
            "IF" => If,
            "THEN" => Then,
            "ELSIF" => Elsif,
            "ELSE" => Else,
            "END_IF" => EndIf,
            "CASE" => Case,
            "OF" => Of,
            "END_CASE" => EndCase,
            "FOR" => For,
            "TO" => To,
            "BY" => By,
            "DO" => Do,
            "END_FOR" => EndFor,
            "WHILE" => While,
            "END_WHILE" => EndWhile,
            "REPEAT" => Repeat,
            "UNTIL" => Until,
            "END_REPEAT" => EndRepeat,
            "EXIT" => Exit,
            "RETURN" => Return,
            "BOOL" => Bool,
            "INT" => Int,
            "DINT" => Dint,
            "DWORD" => Dword,
            "REAL" => Real,
            "TRUE" => return Some(Token::Literal(Literal::Bool(true))),
            "FALSE" => return Some(Token::Literal(Literal::Bool(false))),
            "MOD" => return Some(Token::Operator(Operator::Modulo)),
            "SHL" => return Some(Token::Operator(Operator::Shl)),
            "SHR" => return Some(Token::Operator(Operator::Shr)),
            "AND" => return Some(Token::Operator(Operator::And)),
            "OR" => return Some(Token::Operator(Operator::Or)),
            "XOR" => return Some(Token::Operator(Operator::Xor)),
            "NOT" => return Some(Token::Operator(Operator::Not)),
            _ => return None,
        };
        Some(Token::Word(word))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Unknown(s) => write!(f, "{}", s),
            Literal(s) => write!(f, "{}", s),
            Word(s) => write!(f, "{}", s),
            Operator(s) => write!(f, "{}", s),
            Ident(s) => write!(f, "{}", s),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            Comma => write!(f, ","),
            Colon => write!(f, ":"),
            Semicolon => write!(f, ";"),
            Assign => write!(f, ":="),
            Range => write!(f, ".."),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Literal::*;
        match self {
            Integer(n) => write!(f, "{}", n),
            Real(n) => write!(f, "{:?}", n),
            Bool(true) => write!(f, "TRUE"),
            Bool(false) => write!(f, "FALSE"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Word {
    Program,
    EndProgram,
    Begin,
    Var,
    VarInput,
    VarOutput,
    Constant,
    EndVar,
    Export,
    If,
    Then,
    Elsif,
    Else,
    EndIf,
    Case,
    Of,
    EndCase,
    For,
    To,
    By,
    Do,
    EndFor,
    While,
    EndWhile,
    Repeat,
    Until,
    EndRepeat,
    Exit,
    Return,
    Bool,
    Int,
    Dint,
    Dword,
    Real,
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Word::*;
        let s = match self {
            Program => "PROGRAM",
            EndProgram => "END_PROGRAM",
            Begin => "BEGIN",
            Var => "VAR",
            VarInput => "VAR_INPUT",
            VarOutput => "VAR_OUTPUT",
            Constant => "CONSTANT",
            EndVar => "END_VAR",
            Export => "EXPORT",
            If => "IF",
            Then => "THEN",
            Elsif => "ELSIF",
            Else => "ELSE",
            EndIf => "END_IF",
            Case => "CASE",
            Of => "OF",
            EndCase => "END_CASE",
            For => "FOR",
            To => "TO",
            By => "BY",
            Do => "DO",
            EndFor => "END_FOR",
            While => "WHILE",
            EndWhile => "END_WHILE",
            Repeat => "REPEAT",
            Until => "UNTIL",
            EndRepeat => "END_REPEAT",
            Exit => "EXIT",
            Return => "RETURN",
            Bool => "BOOL",
            Int => "INT",
            Dint => "DINT",
            Dword => "DWORD",
            Real => "REAL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    Plus,
    Minus,
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
    Not,
    And,
    Or,
    Xor,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Operator::*;
        let s = match self {
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "MOD",
            Shl => "SHL",
            Shr => "SHR",
            Equal => "=",
            NotEqual => "<>",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Not => "NOT",
            And => "AND",
            Or => "OR",
            Xor => "XOR",
        };
        write!(f, "{}", s)
    }
}
