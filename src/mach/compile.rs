use super::codegen::{self, Codegen, Fragment};
use super::{
    Address, BytecodeProgram, DataType, Link, Opcode, Symbol, Val, Variable, MAX_INSTRUCTIONS,
    MAX_VARIABLES,
};
use crate::error;
use crate::lang::ast::{self, CaseLabel, Expression, Statement, VarClass};
use crate::lang::{lex, parse, Column, Error};
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// Deepest loop nesting accepted.
pub const MAX_LOOP_DEPTH: usize = 8;

/// Compiles ST-light source into bytecode. Compiling the same source
/// twice produces identical programs.
pub fn compile(source: &str) -> Result<BytecodeProgram> {
    let tokens = lex(source);
    let program = parse(&tokens)?;
    let vars = variables(&program.vars)?;
    let mut compiler = Compiler::new(&vars);
    compiler.block(&program.body)?;
    compiler.emit(Opcode::Halt)?;
    let ops = compiler.finish()?;
    Ok(BytecodeProgram::new(program.name, ops, vars))
}

fn variables(decls: &[ast::VarDecl]) -> Result<Vec<Variable>> {
    let mut vars: Vec<Variable> = vec![];
    for decl in decls {
        let line = Some(decl.line);
        if vars.iter().any(|v| v.name == decl.name) {
            return Err(error!(DuplicateVariable, line, ..&decl.column; &decl.name));
        }
        if vars.len() >= MAX_VARIABLES {
            return Err(error!(TooManyVariables, line, ..&decl.column));
        }
        let initial = match &decl.init {
            Some(expr) => {
                let val = codegen::constant(expr).map_err(|e| e.in_line_number(line))?;
                if (val.data_type() == DataType::Bool) != (decl.data_type == DataType::Bool) {
                    return Err(error!(TypeMismatch, line, ..&expr.column(); "INITIALIZER TYPE"));
                }
                val.cast(decl.data_type)
            }
            None if decl.class == VarClass::Constant => {
                return Err(error!(SyntaxError, line, ..&decl.column; "CONSTANT NEEDS A VALUE"));
            }
            None => Val::zero(decl.data_type),
        };
        vars.push(Variable {
            name: decl.name.clone(),
            data_type: decl.data_type,
            class: decl.class,
            export: decl.export,
            initial,
        });
    }
    Ok(vars)
}

/// A CASE label as a literal of the selector's type. Labels the selector
/// can never equal are rejected.
fn case_value(n: i64, data_type: DataType, col: &Column) -> Result<Val> {
    let val = match data_type {
        DataType::Int => i16::try_from(n).ok().map(Val::Int),
        DataType::Dint => i32::try_from(n).ok().map(Val::Dint),
        _ => u32::try_from(n).ok().map(Val::Dword),
    };
    match val {
        Some(val) => Ok(val),
        None => {
            let msg = format!("CASE LABEL {} OUT OF RANGE FOR {}", n, data_type);
            Err(error!(TypeMismatch, ..col; &msg))
        }
    }
}

struct Loop {
    exit: Symbol,
    residue: usize,
}

/// ## Statement code generation
///
/// `residue` counts values a statement leaves on the operand stack while
/// its body runs (the FOR limit). `EXIT` pops back to the loop's residue
/// before jumping out.

struct Compiler<'a> {
    gen: Codegen<'a>,
    ops: Vec<Opcode>,
    link: Link,
    loops: Vec<Loop>,
    residue: usize,
    line: u16,
}

impl<'a> Compiler<'a> {
    fn new(vars: &'a [Variable]) -> Compiler<'a> {
        Compiler {
            gen: Codegen::new(vars),
            ops: vec![],
            link: Link::new(),
            loops: vec![],
            residue: 0,
            line: 0,
        }
    }

    fn finish(mut self) -> Result<Vec<Opcode>> {
        self.link.link(&mut self.ops)?;
        Ok(self.ops)
    }

    fn emit(&mut self, op: Opcode) -> Result<Address> {
        if self.ops.len() >= MAX_INSTRUCTIONS {
            let msg = format!("MORE THAN {} INSTRUCTIONS", MAX_INSTRUCTIONS);
            return Err(error!(ProgramTooLong, Some(self.line); &msg));
        }
        self.ops.push(op);
        Ok(self.ops.len() - 1)
    }

    fn emit_fragment(&mut self, frag: Fragment) -> Result<()> {
        for op in frag.ops {
            self.emit(op)?;
        }
        Ok(())
    }

    fn emit_jump(&mut self, op: Opcode, symbol: Symbol) -> Result<()> {
        let addr = self.emit(op)?;
        self.link.link_addr_to_symbol(addr, Some(self.line), symbol);
        Ok(())
    }

    fn place(&mut self, symbol: Symbol) {
        self.link.insert(symbol, self.ops.len());
    }

    fn expression(&mut self, expr: &Expression) -> Result<Fragment> {
        self.gen.expression(expr)
    }

    fn condition(&mut self, expr: &Expression) -> Result<()> {
        let frag = self.expression(expr)?;
        if frag.data_type != DataType::Bool {
            return Err(error!(TypeMismatch, ..&expr.column(); "CONDITION MUST BE BOOL"));
        }
        self.emit_fragment(frag)
    }

    fn block(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> Result<()> {
        let line = match statement {
            Statement::Assign(line, ..)
            | Statement::If(line, ..)
            | Statement::Case(line, ..)
            | Statement::For(line, ..)
            | Statement::While(line, ..)
            | Statement::Repeat(line, ..)
            | Statement::Exit(line, ..)
            | Statement::Return(line) => *line,
        };
        self.line = line;
        let result = match statement {
            Statement::Assign(_, col, name, expr) => self.r#assign(col, name, expr),
            Statement::If(_, branches, r#else) => self.r#if(branches, r#else),
            Statement::Case(_, selector, arms, r#else) => self.r#case(selector, arms, r#else),
            Statement::For(_, r#for) => self.r#for(r#for),
            Statement::While(_, cond, body) => self.r#while(cond, body),
            Statement::Repeat(_, body, cond) => self.r#repeat(body, cond),
            Statement::Exit(_, col) => self.r#exit(col),
            Statement::Return(_) => self.emit(Opcode::Halt).map(|_| ()),
        };
        result.map_err(|e| e.in_line_number(Some(line)))
    }

    /// Index and type of an assignable variable.
    fn target(&self, col: &Column, name: &str) -> Result<(usize, DataType)> {
        let (idx, var) = self.gen.lookup(name, col)?;
        if var.class == VarClass::Constant {
            return Err(error!(ConstantAssignment, ..col; name));
        }
        Ok((idx, var.data_type))
    }

    fn r#assign(&mut self, col: &Column, name: &str, expr: &Expression) -> Result<()> {
        let (idx, data_type) = self.target(col, name)?;
        let mut frag = self.expression(expr)?;
        if (frag.data_type == DataType::Bool) != (data_type == DataType::Bool) {
            let msg = format!("CANNOT ASSIGN {} TO {}", frag.data_type, data_type);
            return Err(error!(TypeMismatch, ..&expr.column(); &msg));
        }
        frag.cast(data_type);
        self.emit_fragment(frag)?;
        self.emit(Opcode::Store(idx))?;
        Ok(())
    }

    fn r#if(
        &mut self,
        branches: &[(Expression, Vec<Statement>)],
        r#else: &[Statement],
    ) -> Result<()> {
        let end = self.link.next_symbol();
        for (cond, body) in branches {
            let next = self.link.next_symbol();
            self.condition(cond)?;
            self.emit_jump(Opcode::JumpIfFalse(0), next)?;
            self.block(body)?;
            self.emit_jump(Opcode::Jump(0), end)?;
            self.place(next);
        }
        self.block(r#else)?;
        self.place(end);
        Ok(())
    }

    fn r#case(
        &mut self,
        selector: &Expression,
        arms: &[ast::CaseArm],
        r#else: &[Statement],
    ) -> Result<()> {
        let frag = self.expression(selector)?;
        let data_type = frag.data_type;
        let col = selector.column();
        if !data_type.is_integer() {
            return Err(error!(TypeMismatch, ..&selector.column(); "CASE NEEDS AN INTEGER"));
        }
        self.emit_fragment(frag)?;
        let end = self.link.next_symbol();
        let targets: Vec<Symbol> = arms.iter().map(|_| self.link.next_symbol()).collect();
        for (arm, &target) in arms.iter().zip(targets.iter()) {
            for label in &arm.labels {
                match *label {
                    CaseLabel::Value(n) => {
                        self.emit(Opcode::Dup)?;
                        self.emit(Opcode::Literal(case_value(n, data_type, &col)?))?;
                        self.emit(Opcode::Eq(data_type))?;
                        self.emit_jump(Opcode::JumpIfTrue(0), target)?;
                    }
                    CaseLabel::Range(lo, hi) => {
                        let skip = self.link.next_symbol();
                        self.emit(Opcode::Dup)?;
                        self.emit(Opcode::Literal(case_value(lo, data_type, &col)?))?;
                        self.emit(Opcode::Ge(data_type))?;
                        self.emit_jump(Opcode::JumpIfFalse(0), skip)?;
                        self.emit(Opcode::Dup)?;
                        self.emit(Opcode::Literal(case_value(hi, data_type, &col)?))?;
                        self.emit(Opcode::Le(data_type))?;
                        self.emit_jump(Opcode::JumpIfTrue(0), target)?;
                        self.place(skip);
                    }
                }
            }
        }
        self.emit(Opcode::Pop)?;
        self.block(r#else)?;
        self.emit_jump(Opcode::Jump(0), end)?;
        for (arm, target) in arms.iter().zip(targets) {
            self.place(target);
            self.emit(Opcode::Pop)?;
            self.block(&arm.body)?;
            self.emit_jump(Opcode::Jump(0), end)?;
        }
        self.place(end);
        Ok(())
    }

    fn enter_loop(&mut self, exit: Symbol) -> Result<()> {
        if self.loops.len() >= MAX_LOOP_DEPTH {
            return Err(error!(SyntaxError; "LOOPS NESTED TOO DEEPLY"));
        }
        self.loops.push(Loop {
            exit,
            residue: self.residue,
        });
        Ok(())
    }

    fn r#for(&mut self, r#for: &ast::For) -> Result<()> {
        let (idx, data_type) = self.target(&r#for.column, &r#for.var)?;
        if !data_type.is_integer() {
            return Err(error!(TypeMismatch, ..&r#for.column; "FOR NEEDS AN INTEGER VARIABLE"));
        }
        let numeric = |frag: &mut Fragment, expr: &Expression| -> Result<()> {
            if frag.data_type == DataType::Bool {
                return Err(error!(TypeMismatch, ..&expr.column(); "FOR BOUND MUST BE NUMERIC"));
            }
            frag.cast(data_type);
            Ok(())
        };
        let mut from = self.expression(&r#for.from)?;
        numeric(&mut from, &r#for.from)?;
        let mut to = self.expression(&r#for.to)?;
        numeric(&mut to, &r#for.to)?;
        let step = match &r#for.by {
            Some(by) => {
                let mut frag = self.expression(by)?;
                numeric(&mut frag, by)?;
                frag
            }
            None => Fragment {
                ops: vec![Opcode::Literal(Val::Int(1).cast(data_type))],
                data_type,
            },
        };
        let sign = match &r#for.by {
            None => Some(1),
            Some(by) => by.integer_constant().map(i64::signum),
        };

        self.emit_fragment(from)?;
        self.emit(Opcode::Store(idx))?;
        self.emit_fragment(to)?;
        self.residue += 1;

        let top = self.link.next_symbol();
        let body = self.link.next_symbol();
        let exit = self.link.next_symbol();
        self.place(top);
        match sign {
            Some(sign) => {
                self.emit(Opcode::Dup)?;
                self.emit(Opcode::Load(idx))?;
                self.emit(if sign < 0 {
                    Opcode::Le(data_type)
                } else {
                    Opcode::Ge(data_type)
                })?;
                self.emit_jump(Opcode::JumpIfFalse(0), exit)?;
            }
            None => {
                let down = self.link.next_symbol();
                self.emit_fragment(Fragment {
                    ops: step.ops.clone(),
                    data_type,
                })?;
                self.emit(Opcode::Literal(Val::zero(data_type)))?;
                self.emit(Opcode::Lt(data_type))?;
                self.emit_jump(Opcode::JumpIfTrue(0), down)?;
                self.emit(Opcode::Dup)?;
                self.emit(Opcode::Load(idx))?;
                self.emit(Opcode::Ge(data_type))?;
                self.emit_jump(Opcode::JumpIfFalse(0), exit)?;
                self.emit_jump(Opcode::Jump(0), body)?;
                self.place(down);
                self.emit(Opcode::Dup)?;
                self.emit(Opcode::Load(idx))?;
                self.emit(Opcode::Le(data_type))?;
                self.emit_jump(Opcode::JumpIfFalse(0), exit)?;
            }
        }
        self.place(body);
        self.enter_loop(exit)?;
        self.block(&r#for.body)?;
        self.loops.pop();
        self.emit(Opcode::Load(idx))?;
        self.emit_fragment(step)?;
        self.emit(Opcode::Add(data_type))?;
        self.emit(Opcode::Store(idx))?;
        self.emit_jump(Opcode::Jump(0), top)?;
        self.place(exit);
        self.emit(Opcode::Pop)?;
        self.residue -= 1;
        Ok(())
    }

    fn r#while(&mut self, cond: &Expression, body: &[Statement]) -> Result<()> {
        let top = self.link.next_symbol();
        let exit = self.link.next_symbol();
        self.place(top);
        self.condition(cond)?;
        self.emit_jump(Opcode::JumpIfFalse(0), exit)?;
        self.enter_loop(exit)?;
        self.block(body)?;
        self.loops.pop();
        self.emit_jump(Opcode::Jump(0), top)?;
        self.place(exit);
        Ok(())
    }

    fn r#repeat(&mut self, body: &[Statement], cond: &Expression) -> Result<()> {
        let top = self.link.next_symbol();
        let exit = self.link.next_symbol();
        self.place(top);
        self.enter_loop(exit)?;
        self.block(body)?;
        self.loops.pop();
        self.condition(cond)?;
        self.emit_jump(Opcode::JumpIfFalse(0), top)?;
        self.place(exit);
        Ok(())
    }

    fn r#exit(&mut self, col: &Column) -> Result<()> {
        let (exit, residue) = match self.loops.last() {
            Some(l) => (l.exit, l.residue),
            None => return Err(error!(ExitOutsideLoop, ..col)),
        };
        for _ in residue..self.residue {
            self.emit(Opcode::Pop)?;
        }
        self.emit_jump(Opcode::Jump(0), exit)
    }
}
