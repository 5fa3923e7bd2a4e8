use super::{ast::*, token::*, Column, Error};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

pub fn parse(tokens: &[Spanned]) -> Result<Program> {
    Parser::parse(tokens)
}

struct Parser<'a> {
    token_stream: std::slice::Iter<'a, Spanned>,
    peeked: Option<&'a Spanned>,
    line: u16,
    col: Column,
}

impl<'a> Parser<'a> {
    fn parse(tokens: &'a [Spanned]) -> Result<Program> {
        let mut parse = Parser {
            token_stream: tokens.iter(),
            peeked: None,
            line: 1,
            col: 0..0,
        };
        parse.program()
    }

    fn column(&self) -> Column {
        self.col.clone()
    }

    fn fail(&self, msg: &str) -> Error {
        error!(SyntaxError, Some(self.line), ..&self.col; msg)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let spanned = match self.peeked.take() {
            Some(s) => s,
            None => self.token_stream.next()?,
        };
        self.line = spanned.line;
        self.col = spanned.column.clone();
        Some(&spanned.token)
    }

    fn peek(&mut self) -> Option<&'a Token> {
        if self.peeked.is_none() {
            self.peeked = self.token_stream.next();
        }
        self.peeked.map(|s| &s.token)
    }

    fn peek_is(&mut self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn peek_word(&mut self, word: Word) -> bool {
        self.peek_is(&Token::Word(word))
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        match self.next() {
            Some(t) if *t == token => Ok(()),
            Some(t) => {
                let msg = format!("EXPECTED {} BUT FOUND {}", token, t);
                Err(self.fail(&msg))
            }
            None => Err(self.fail(&format!("EXPECTED {}", token))),
        }
    }

    fn expect_word(&mut self, word: Word) -> Result<()> {
        self.expect(Token::Word(word))
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Ident(s)) => Ok(s.clone()),
            _ => Err(self.fail("EXPECTED IDENTIFIER")),
        }
    }

    fn optional_semicolon(&mut self) {
        if self.peek_is(&Token::Semicolon) {
            self.next();
        }
    }

    fn program(&mut self) -> Result<Program> {
        let mut name = None;
        let wrapped = self.peek_word(Word::Program);
        if wrapped {
            self.next();
            name = Some(self.expect_ident()?);
        }
        let vars = self.var_blocks()?;
        if self.peek_word(Word::Begin) {
            self.next();
        }
        let body = self.block()?;
        if wrapped {
            self.expect_word(Word::EndProgram)?;
            self.optional_semicolon();
        }
        match self.next() {
            None => Ok(Program { name, vars, body }),
            Some(t) => {
                let msg = format!("UNEXPECTED {}", t);
                Err(self.fail(&msg))
            }
        }
    }

    fn var_blocks(&mut self) -> Result<Vec<VarDecl>> {
        let mut vars = vec![];
        loop {
            let mut class = match self.peek() {
                Some(Token::Word(Word::Var)) => VarClass::Local,
                Some(Token::Word(Word::VarInput)) => VarClass::Input,
                Some(Token::Word(Word::VarOutput)) => VarClass::Output,
                _ => return Ok(vars),
            };
            self.next();
            if class == VarClass::Local && self.peek_word(Word::Constant) {
                self.next();
                class = VarClass::Constant;
            }
            loop {
                match self.peek() {
                    Some(Token::Word(Word::EndVar)) => {
                        self.next();
                        self.optional_semicolon();
                        break;
                    }
                    Some(Token::Ident(_)) => self.var_decl(class, &mut vars)?,
                    _ => {
                        self.next();
                        return Err(self.fail("EXPECTED END_VAR"));
                    }
                }
            }
        }
    }

    fn var_decl(&mut self, class: VarClass, vars: &mut Vec<VarDecl>) -> Result<()> {
        let mut names = vec![];
        loop {
            let name = self.expect_ident()?;
            names.push((self.line, self.column(), name));
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::Colon) => break,
                _ => return Err(self.fail("EXPECTED : AFTER VARIABLE NAME")),
            }
        }
        let data_type = match self.next() {
            Some(Token::Word(Word::Bool)) => DataType::Bool,
            Some(Token::Word(Word::Int)) => DataType::Int,
            Some(Token::Word(Word::Dint)) => DataType::Dint,
            Some(Token::Word(Word::Dword)) => DataType::Dword,
            Some(Token::Word(Word::Real)) => DataType::Real,
            _ => {
                return Err(self.fail("EXPECTED DATA TYPE (BOOL, INT, DINT, DWORD, REAL)"));
            }
        };
        let export = self.peek_word(Word::Export);
        if export {
            self.next();
        }
        let mut init = None;
        if self.peek_is(&Token::Assign) {
            self.next();
            init = Some(self.expression()?);
        }
        self.expect(Token::Semicolon)?;
        for (line, column, name) in names {
            vars.push(VarDecl {
                line,
                column,
                name,
                data_type,
                class,
                export,
                init: init.clone(),
            });
        }
        Ok(())
    }

    /// Statements until a token that cannot begin one.
    fn block(&mut self) -> Result<Vec<Statement>> {
        let mut statements = vec![];
        loop {
            match self.peek() {
                Some(Token::Semicolon) => {
                    self.next();
                }
                Some(Token::Ident(_)) => statements.push(self.statement()?),
                Some(Token::Word(word)) => match word {
                    Word::If
                    | Word::Case
                    | Word::For
                    | Word::While
                    | Word::Repeat
                    | Word::Exit
                    | Word::Return => statements.push(self.statement()?),
                    _ => return Ok(statements),
                },
                _ => return Ok(statements),
            }
        }
    }

    fn statement(&mut self) -> Result<Statement> {
        let token = match self.next() {
            Some(t) => t,
            None => return Err(self.fail("EXPECTED STATEMENT")),
        };
        let line = self.line;
        match token {
            Token::Ident(name) => {
                let column = self.column();
                self.expect(Token::Assign)?;
                let expr = self.expression()?;
                self.expect(Token::Semicolon)?;
                Ok(Statement::Assign(line, column, name.clone(), expr))
            }
            Token::Word(Word::If) => self.r#if(line),
            Token::Word(Word::Case) => self.case(line),
            Token::Word(Word::For) => self.r#for(line),
            Token::Word(Word::While) => {
                let cond = self.expression()?;
                self.expect_word(Word::Do)?;
                let body = self.block()?;
                self.expect_word(Word::EndWhile)?;
                self.optional_semicolon();
                Ok(Statement::While(line, cond, body))
            }
            Token::Word(Word::Repeat) => {
                let body = self.block()?;
                self.expect_word(Word::Until)?;
                let cond = self.expression()?;
                self.expect_word(Word::EndRepeat)?;
                self.optional_semicolon();
                Ok(Statement::Repeat(line, body, cond))
            }
            Token::Word(Word::Exit) => {
                let column = self.column();
                self.expect(Token::Semicolon)?;
                Ok(Statement::Exit(line, column))
            }
            Token::Word(Word::Return) => {
                self.expect(Token::Semicolon)?;
                Ok(Statement::Return(line))
            }
            t => {
                let msg = format!("UNEXPECTED {}", t);
                Err(self.fail(&msg))
            }
        }
    }

    fn r#if(&mut self, line: u16) -> Result<Statement> {
        let mut branches = vec![];
        let cond = self.expression()?;
        self.expect_word(Word::Then)?;
        branches.push((cond, self.block()?));
        let mut otherwise = vec![];
        loop {
            match self.next() {
                Some(Token::Word(Word::Elsif)) => {
                    let cond = self.expression()?;
                    self.expect_word(Word::Then)?;
                    branches.push((cond, self.block()?));
                }
                Some(Token::Word(Word::Else)) => {
                    otherwise = self.block()?;
                    self.expect_word(Word::EndIf)?;
                    break;
                }
                Some(Token::Word(Word::EndIf)) => break,
                _ => return Err(self.fail("EXPECTED END_IF")),
            }
        }
        self.optional_semicolon();
        Ok(Statement::If(line, branches, otherwise))
    }

    fn case(&mut self, line: u16) -> Result<Statement> {
        let selector = self.expression()?;
        self.expect_word(Word::Of)?;
        let mut arms = vec![];
        let mut otherwise = vec![];
        loop {
            match self.peek() {
                Some(Token::Word(Word::Else)) => {
                    self.next();
                    otherwise = self.block()?;
                    self.expect_word(Word::EndCase)?;
                    break;
                }
                Some(Token::Word(Word::EndCase)) => {
                    self.next();
                    break;
                }
                _ => {
                    let labels = self.case_labels()?;
                    let body = self.block()?;
                    arms.push(CaseArm { labels, body });
                }
            }
        }
        self.optional_semicolon();
        Ok(Statement::Case(line, selector, arms, otherwise))
    }

    fn case_labels(&mut self) -> Result<Vec<CaseLabel>> {
        let mut labels = vec![];
        loop {
            let lo = self.signed_integer()?;
            if self.peek_is(&Token::Range) {
                self.next();
                let hi = self.signed_integer()?;
                if hi < lo {
                    return Err(self.fail("EMPTY CASE RANGE"));
                }
                labels.push(CaseLabel::Range(lo, hi));
            } else {
                labels.push(CaseLabel::Value(lo));
            }
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::Colon) => return Ok(labels),
                _ => return Err(self.fail("EXPECTED : AFTER CASE LABEL")),
            }
        }
    }

    fn signed_integer(&mut self) -> Result<i64> {
        let negative = self.peek_is(&Token::Operator(Operator::Minus));
        if negative {
            self.next();
        }
        match self.next() {
            Some(Token::Literal(Literal::Integer(n))) => Ok(if negative { -n } else { *n }),
            _ => Err(self.fail("EXPECTED INTEGER CASE LABEL")),
        }
    }

    fn r#for(&mut self, line: u16) -> Result<Statement> {
        let var = self.expect_ident()?;
        let column = self.column();
        self.expect(Token::Assign)?;
        let from = self.expression()?;
        self.expect_word(Word::To)?;
        let to = self.expression()?;
        let mut by = None;
        if self.peek_word(Word::By) {
            self.next();
            by = Some(self.expression()?);
        }
        self.expect_word(Word::Do)?;
        let body = self.block()?;
        self.expect_word(Word::EndFor)?;
        self.optional_semicolon();
        Ok(Statement::For(
            line,
            For {
                column,
                var,
                from,
                to,
                by,
                body,
            },
        ))
    }

    fn expression(&mut self) -> Result<Expression> {
        fn parse(this: &mut Parser, precedence: usize) -> Result<Expression> {
            let mut lhs = this.unary()?;
            loop {
                let op = match this.peek() {
                    Some(Token::Operator(op)) => *op,
                    _ => break,
                };
                let (op_precedence, binary) = match op_precedence(op) {
                    Some(p) => p,
                    None => break,
                };
                if op_precedence < precedence {
                    break;
                }
                this.next();
                let column = this.column();
                let rhs = parse(this, op_precedence + 1)?;
                lhs = Expression::Binary(column, binary, Box::new(lhs), Box::new(rhs));
            }
            Ok(lhs)
        }
        parse(self, 0)
    }

    fn unary(&mut self) -> Result<Expression> {
        match self.peek() {
            Some(Token::Operator(Operator::Minus)) => {
                self.next();
                let column = self.column();
                Ok(Expression::Negation(column, Box::new(self.unary()?)))
            }
            Some(Token::Operator(Operator::Not)) => {
                self.next();
                let column = self.column();
                Ok(Expression::Not(column, Box::new(self.unary()?)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expression> {
        match self.next() {
            Some(Token::LParen) => {
                let expr = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Ident(name)) => {
                let column = self.column();
                if self.peek_is(&Token::LParen) {
                    let args = self.expression_list()?;
                    Ok(Expression::Function(column, name.clone(), args))
                } else {
                    Ok(Expression::Var(column, name.clone()))
                }
            }
            Some(Token::Literal(Literal::Integer(n))) => Ok(Expression::Integer(self.column(), *n)),
            Some(Token::Literal(Literal::Real(n))) => Ok(Expression::Real(self.column(), *n)),
            Some(Token::Literal(Literal::Bool(b))) => Ok(Expression::Bool(self.column(), *b)),
            _ => Err(self.fail("EXPECTED EXPRESSION")),
        }
    }

    fn expression_list(&mut self) -> Result<Vec<Expression>> {
        self.expect(Token::LParen)?;
        let mut v: Vec<Expression> = vec![];
        if self.peek_is(&Token::RParen) {
            self.next();
            return Ok(v);
        }
        loop {
            v.push(self.expression()?);
            match self.next() {
                Some(Token::RParen) => return Ok(v),
                Some(Token::Comma) => continue,
                _ => return Err(self.fail("EXPECTED ) OR ,")),
            }
        }
    }
}

fn op_precedence(op: Operator) -> Option<(usize, BinaryOp)> {
    use Operator::*;
    Some(match op {
        Or => (1, BinaryOp::Or),
        Xor => (1, BinaryOp::Xor),
        And => (2, BinaryOp::And),
        Equal => (3, BinaryOp::Equal),
        NotEqual => (3, BinaryOp::NotEqual),
        Less => (3, BinaryOp::Less),
        LessEqual => (3, BinaryOp::LessEqual),
        Greater => (3, BinaryOp::Greater),
        GreaterEqual => (3, BinaryOp::GreaterEqual),
        Plus => (4, BinaryOp::Add),
        Minus => (4, BinaryOp::Subtract),
        Multiply => (5, BinaryOp::Multiply),
        Divide => (5, BinaryOp::Divide),
        Modulo => (5, BinaryOp::Modulo),
        Shl => (5, BinaryOp::Shl),
        Shr => (5, BinaryOp::Shr),
        Not => return None,
    })
}
