use super::{Column, LineNumber};

#[derive(Clone, PartialEq)]
pub struct Error {
    code: u16,
    line_number: LineNumber,
    column: Column,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_column($col)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_column($col)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line_number: None,
            column: 0..0,
            message: String::new(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code as u16
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn text(&self) -> &str {
        &self.message
    }

    /// Sets the line unless one is already known. The parser tags errors
    /// deep in an expression and the statement level must not overwrite it.
    pub fn in_line_number(&self, line: LineNumber) -> Error {
        Error {
            code: self.code,
            line_number: self.line_number.or(line),
            column: self.column.clone(),
            message: self.message.clone(),
        }
    }

    pub fn in_column(&self, column: &Column) -> Error {
        if self.column != (0..0) {
            return self.clone();
        }
        Error {
            code: self.code,
            line_number: self.line_number,
            column: column.clone(),
            message: self.message.clone(),
        }
    }

    pub fn message(&self, message: &str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            code: self.code,
            line_number: self.line_number,
            column: self.column.clone(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // *** Compile
    SyntaxError = 2,
    UndefinedVariable = 3,
    DuplicateVariable = 4,
    TypeMismatch = 5,
    ConstantAssignment = 6,
    ExitOutsideLoop = 7,
    UndefinedFunction = 8,
    WrongArgumentCount = 9,
    TooManyVariables = 10,
    ProgramTooLong = 11,

    // *** Runtime
    StackOverflow = 20,
    StackUnderflow = 21,
    DivisionByZero = 22,
    UnknownOpcode = 23,
    VariableOutOfBounds = 24,
    IllegalFunctionCall = 25,
    MaxStepsExceeded = 26,

    // *** Management
    PoolFull = 40,
    PoolExhausted = 41,
    InvalidProgramId = 42,
    InvalidBreakpoint = 43,
    InvalidTarget = 44,
    InvalidInterval = 45,
    NotCompiled = 46,

    // *** Persistence
    ConfigCorrupt = 60,
    UnsupportedVersion = 61,
    FileNotFound = 62,

    InternalError = 99,
}

impl std::error::Error for Error {}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            2 => "SYNTAX ERROR",
            3 => "UNDEFINED VARIABLE",
            4 => "DUPLICATE VARIABLE",
            5 => "TYPE MISMATCH",
            6 => "ASSIGNMENT TO CONSTANT",
            7 => "EXIT OUTSIDE LOOP",
            8 => "UNDEFINED FUNCTION",
            9 => "WRONG NUMBER OF ARGUMENTS",
            10 => "TOO MANY VARIABLES",
            11 => "PROGRAM TOO LONG",
            20 => "STACK OVERFLOW",
            21 => "STACK UNDERFLOW",
            22 => "DIVISION BY ZERO",
            23 => "UNKNOWN OPCODE",
            24 => "VARIABLE INDEX OUT OF BOUNDS",
            25 => "ILLEGAL FUNCTION CALL",
            26 => "MAX STEPS EXCEEDED",
            40 => "SOURCE POOL FULL",
            41 => "IR POOL EXHAUSTED",
            42 => "INVALID PROGRAM ID",
            43 => "INVALID BREAKPOINT",
            44 => "INVALID TARGET",
            45 => "INVALID INTERVAL",
            46 => "PROGRAM NOT COMPILED",
            60 => "CONFIG CORRUPT",
            61 => "UNSUPPORTED CONFIG VERSION",
            62 => "FILE NOT FOUND",
            99 => "INTERNAL ERROR",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" LINE {}", line_number));
        }
        if (0..0) != self.column {
            suffix.push_str(&format!(" ({}..{})", self.column.start, self.column.end));
        }
        let in_part = if suffix.is_empty() {
            String::new()
        } else {
            format!(" IN{}", suffix)
        };
        let msg_part = if self.message.is_empty() {
            String::new()
        } else {
            format!("; {}", self.message)
        };
        if code_str.is_empty() {
            write!(f, "PROGRAM ERROR {}{}{}", self.code, in_part, msg_part)
        } else {
            write!(f, "{}{}{}", code_str, in_part, msg_part)
        }
    }
}
