//! Recursive-descent HOIL parser (component E, `SPEC_FULL.md` §4.E).
//!
//! No error recovery: the first malformed construct aborts the parse
//! with a [`Error::Parse`]. The grammar needs two tokens of lookahead
//! at a couple of points (block-label vs. statement, assignment vs.
//! bare instruction) that the lexer's single-token `peek_token` can't
//! give us, so the parser keeps its own small ring of already-lexed
//! tokens in front of the lexer.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::ast::*;
use crate::error::Error;
use crate::lexer::{Keyword, Lexer, Mnemonic, Token, TokenKind, TypeKeyword};
use crate::location::SourceLocation;

/// Parses a complete HOIL module from `source`, attributing
/// diagnostics to `filename`.
pub fn parse_module(source: &str, filename: impl Into<Rc<str>>) -> Result<Module, Error> {
    let mut parser = Parser::new(source, filename);
    parser.parse_module()
}

struct Parser {
    lexer: Lexer,
    lookahead: VecDeque<Token>,
}

impl Parser {
    fn new(source: &str, filename: impl Into<Rc<str>>) -> Self {
        Self {
            lexer: Lexer::new(source, filename),
            lookahead: VecDeque::new(),
        }
    }

    fn fill(&mut self, n: usize) -> Result<(), Error> {
        while self.lookahead.len() <= n {
            let t = self.lexer.next_token()?;
            self.lookahead.push_back(t);
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, Error> {
        self.fill(0)?;
        Ok(&self.lookahead[0])
    }

    fn peek2(&mut self) -> Result<&Token, Error> {
        self.fill(1)?;
        Ok(&self.lookahead[1])
    }

    fn bump(&mut self) -> Result<Token, Error> {
        self.fill(0)?;
        Ok(self.lookahead.pop_front().unwrap())
    }

    fn loc(&mut self) -> Result<SourceLocation, Error> {
        Ok(self.peek()?.location.clone())
    }

    fn error_here(&mut self, message: impl Into<String>) -> Error {
        let location = self.peek().map(|t| t.location.clone()).unwrap_or_else(|e| match e {
            Error::Syntax { location, .. } => location,
            _ => unreachable!(),
        });
        Error::Parse {
            location,
            message: message.into(),
        }
    }

    fn unexpected(&mut self, expected: &str) -> Error {
        let found = self.peek().map(|t| describe(&t.kind)).unwrap_or_else(|_| "<error>".to_string());
        self.error_here(format!("expected {expected}, found {found}"))
    }

    fn expect_kind(&mut self, kind: TokenKind, label: &str) -> Result<SourceLocation, Error> {
        if self.peek()?.kind == kind {
            Ok(self.bump()?.location)
        } else {
            Err(self.unexpected(label))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword, label: &str) -> Result<SourceLocation, Error> {
        self.expect_kind(TokenKind::Keyword(kw), label)
    }

    fn expect_ident(&mut self) -> Result<(String, SourceLocation), Error> {
        match self.peek()?.kind.clone() {
            TokenKind::Ident(name) => {
                let t = self.bump()?;
                Ok((name, t.location))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect_string(&mut self) -> Result<(String, SourceLocation), Error> {
        match self.peek()?.kind.clone() {
            TokenKind::StringLit(s) => {
                let t = self.bump()?;
                Ok((s, t.location))
            }
            _ => Err(self.unexpected("a string literal")),
        }
    }

    fn at(&mut self, kind: &TokenKind) -> Result<bool, Error> {
        Ok(&self.peek()?.kind == kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, Error> {
        if self.at(kind)? {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // ---- top level -----------------------------------------------

    fn parse_module(&mut self) -> Result<Module, Error> {
        self.expect_keyword(Keyword::Module, "'MODULE'")?;
        let (name, _) = self.expect_string()?;
        self.expect_kind(TokenKind::Semicolon, "';'")?;

        let mut declarations = Vec::new();
        while !self.at(&TokenKind::Eof)? {
            declarations.push(self.parse_declaration()?);
        }
        Ok(Module { name, declarations })
    }

    fn parse_declaration(&mut self) -> Result<Declaration, Error> {
        match self.peek()?.kind.clone() {
            TokenKind::Keyword(Keyword::Type) => self.parse_typedef().map(Declaration::TypeDef),
            TokenKind::Keyword(Keyword::Constant) => self.parse_constant().map(Declaration::Constant),
            TokenKind::Keyword(Keyword::Global) => self.parse_global().map(Declaration::Global),
            TokenKind::Keyword(Keyword::Function) => self.parse_function().map(Declaration::Function),
            TokenKind::Keyword(Keyword::Extern) => {
                self.parse_extern_function().map(Declaration::ExternFunction)
            }
            _ => Err(self.unexpected("a declaration ('TYPE', 'CONSTANT', 'GLOBAL', 'FUNCTION', or 'EXTERN')")),
        }
    }

    fn parse_typedef(&mut self) -> Result<TypeDef, Error> {
        let location = self.expect_keyword(Keyword::Type, "'TYPE'")?;
        let (name, _) = self.expect_ident()?;
        self.expect_kind(TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.at(&TokenKind::RBrace)? {
            let (fname, _) = self.expect_ident()?;
            self.expect_kind(TokenKind::Colon, "':'")?;
            let ty = self.parse_type()?;
            fields.push((fname, ty));
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect_kind(TokenKind::RBrace, "'}'")?;
        Ok(TypeDef { name, fields, location })
    }

    fn parse_constant(&mut self) -> Result<Constant, Error> {
        let location = self.expect_keyword(Keyword::Constant, "'CONSTANT'")?;
        let (name, _) = self.expect_ident()?;
        self.expect_kind(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        self.expect_kind(TokenKind::Eq, "'='")?;
        let value = self.parse_expr()?;
        self.expect_kind(TokenKind::Semicolon, "';'")?;
        Ok(Constant { name, ty, value, location })
    }

    fn parse_global(&mut self) -> Result<Global, Error> {
        let location = self.expect_keyword(Keyword::Global, "'GLOBAL'")?;
        let (name, _) = self.expect_ident()?;
        self.expect_kind(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        let value = if self.eat(&TokenKind::Eq)? {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect_kind(TokenKind::Semicolon, "';'")?;
        Ok(Global { name, ty, value, location })
    }

    fn parse_function(&mut self) -> Result<Function, Error> {
        let location = self.expect_keyword(Keyword::Function, "'FUNCTION'")?;
        let (name, _) = self.expect_ident()?;
        self.expect_kind(TokenKind::LParen, "'('")?;
        let params = self.parse_named_param_list()?;
        self.expect_kind(TokenKind::RParen, "')'")?;
        self.expect_kind(TokenKind::Arrow, "'->'")?;
        let ret_type = self.parse_type()?;
        let target = if self.eat(&TokenKind::Keyword(Keyword::Target))? {
            let (s, _) = self.expect_string()?;
            Some(s)
        } else {
            None
        };
        self.expect_kind(TokenKind::LBrace, "'{'")?;
        let mut blocks = Vec::new();
        while !self.at(&TokenKind::RBrace)? {
            blocks.push(self.parse_block()?);
        }
        self.expect_kind(TokenKind::RBrace, "'}'")?;
        if blocks.is_empty() {
            return Err(Error::Parse {
                location,
                message: "function body must have at least one block".to_string(),
            });
        }
        Ok(Function {
            name,
            params,
            ret_type,
            target,
            blocks,
            location,
        })
    }

    fn parse_extern_function(&mut self) -> Result<ExternFunction, Error> {
        let location = self.expect_keyword(Keyword::Extern, "'EXTERN'")?;
        self.expect_keyword(Keyword::Function, "'FUNCTION'")?;
        let (name, _) = self.expect_ident()?;
        self.expect_kind(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        let mut variadic = false;
        if !self.at(&TokenKind::RParen)? {
            loop {
                if self.at(&TokenKind::Dot)? {
                    self.expect_kind(TokenKind::Dot, "'.'")?;
                    self.expect_kind(TokenKind::Dot, "'.'")?;
                    self.expect_kind(TokenKind::Dot, "'.'")?;
                    variadic = true;
                    break;
                }
                // accept either a bare type or a `name: type` pair.
                if matches!(self.peek()?.kind, TokenKind::Ident(_)) && self.peek2()?.kind == TokenKind::Colon {
                    self.expect_ident()?;
                    self.expect_kind(TokenKind::Colon, "':'")?;
                }
                params.push(self.parse_type()?);
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect_kind(TokenKind::RParen, "')'")?;
        self.expect_kind(TokenKind::Arrow, "'->'")?;
        let ret_type = self.parse_type()?;
        self.expect_kind(TokenKind::Semicolon, "';'")?;
        Ok(ExternFunction {
            name,
            params,
            variadic,
            ret_type,
            location,
        })
    }

    fn parse_named_param_list(&mut self) -> Result<Vec<(String, Type)>, Error> {
        let mut params = Vec::new();
        if self.at(&TokenKind::RParen)? {
            return Ok(params);
        }
        loop {
            let (name, _) = self.expect_ident()?;
            self.expect_kind(TokenKind::Colon, "':'")?;
            let ty = self.parse_type()?;
            params.push((name, ty));
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(params)
    }

    // ---- types -----------------------------------------------------

    fn parse_type(&mut self) -> Result<Type, Error> {
        let tok = self.bump()?;
        match tok.kind {
            TokenKind::TypeKeyword(TypeKeyword::Void) => Ok(Type::Void),
            TokenKind::TypeKeyword(TypeKeyword::Bool) => Ok(Type::Bool),
            TokenKind::TypeKeyword(TypeKeyword::I8) => Ok(Type::Int { bits: 8, signed: true }),
            TokenKind::TypeKeyword(TypeKeyword::I16) => Ok(Type::Int { bits: 16, signed: true }),
            TokenKind::TypeKeyword(TypeKeyword::I32) => Ok(Type::Int { bits: 32, signed: true }),
            TokenKind::TypeKeyword(TypeKeyword::I64) => Ok(Type::Int { bits: 64, signed: true }),
            TokenKind::TypeKeyword(TypeKeyword::U8) => Ok(Type::Int { bits: 8, signed: false }),
            TokenKind::TypeKeyword(TypeKeyword::U16) => Ok(Type::Int { bits: 16, signed: false }),
            TokenKind::TypeKeyword(TypeKeyword::U32) => Ok(Type::Int { bits: 32, signed: false }),
            TokenKind::TypeKeyword(TypeKeyword::U64) => Ok(Type::Int { bits: 64, signed: false }),
            TokenKind::TypeKeyword(TypeKeyword::F16) => Ok(Type::Float { bits: 16 }),
            TokenKind::TypeKeyword(TypeKeyword::F32) => Ok(Type::Float { bits: 32 }),
            TokenKind::TypeKeyword(TypeKeyword::F64) => Ok(Type::Float { bits: 64 }),
            TokenKind::TypeKeyword(TypeKeyword::Ptr) => {
                self.expect_kind(TokenKind::Lt, "'<'")?;
                let elem = self.parse_type()?;
                self.expect_kind(TokenKind::Gt, "'>'")?;
                Ok(Type::Ptr {
                    elem: Box::new(elem),
                    memory_space: None,
                })
            }
            TokenKind::TypeKeyword(TypeKeyword::Vec) => {
                self.expect_kind(TokenKind::Lt, "'<'")?;
                let elem = self.parse_type()?;
                self.expect_kind(TokenKind::Comma, "','")?;
                let size = self.expect_int_literal()?;
                self.expect_kind(TokenKind::Gt, "'>'")?;
                Ok(Type::Vec {
                    elem: Box::new(elem),
                    size,
                })
            }
            TokenKind::TypeKeyword(TypeKeyword::Array) => {
                self.expect_kind(TokenKind::Lt, "'<'")?;
                let elem = self.parse_type()?;
                self.expect_kind(TokenKind::Comma, "','")?;
                let size = self.expect_int_literal()?;
                self.expect_kind(TokenKind::Gt, "'>'")?;
                Ok(Type::Array {
                    elem: Box::new(elem),
                    size,
                })
            }
            TokenKind::Ident(name) => Ok(Type::Named(name)),
            other => Err(Error::Parse {
                location: tok.location,
                message: format!("expected a type, found {}", describe(&other)),
            }),
        }
    }

    fn expect_int_literal(&mut self) -> Result<u32, Error> {
        let tok = self.bump()?;
        match tok.kind {
            TokenKind::IntLit(v) if v >= 0 => Ok(v as u32),
            other => Err(Error::Parse {
                location: tok.location,
                message: format!("expected a non-negative integer literal, found {}", describe(&other)),
            }),
        }
    }

    // ---- function bodies --------------------------------------------

    /// True when the lookahead is `identifier ':'`, the boundary of a
    /// new basic block.
    fn at_block_start(&mut self) -> Result<bool, Error> {
        Ok(matches!(self.peek()?.kind, TokenKind::Ident(_)) && self.peek2()?.kind == TokenKind::Colon)
    }

    fn parse_block(&mut self) -> Result<BasicBlock, Error> {
        let (label, location) = self.expect_ident()?;
        self.expect_kind(TokenKind::Colon, "':'")?;
        let mut stmts = Vec::new();
        while !self.at_block_start()? && !self.at(&TokenKind::RBrace)? {
            stmts.push(self.parse_stmt()?);
        }
        Ok(BasicBlock { label, stmts, location })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        let location = self.loc()?;
        match self.peek()?.kind.clone() {
            TokenKind::Mnemonic(Mnemonic::Br) => self.parse_branch(location),
            TokenKind::Mnemonic(Mnemonic::Ret) => self.parse_return(location),
            TokenKind::Ident(_) if self.peek2()?.kind == TokenKind::Eq => self.parse_assign(location),
            TokenKind::Mnemonic(_) => self.parse_bare_instruction(location),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn parse_assign(&mut self, location: SourceLocation) -> Result<Stmt, Error> {
        let (target, _) = self.expect_ident()?;
        self.expect_kind(TokenKind::Eq, "'='")?;
        let value = self.parse_rhs_expr()?;
        self.expect_kind(TokenKind::Semicolon, "';'")?;
        Ok(Stmt {
            kind: StmtKind::Assign { target, value },
            location,
        })
    }

    /// The right-hand side of an assignment is always an instruction:
    /// either a bare mnemonic applied to comma-separated operands
    /// (`ADD a, b`), represented as a synthetic [`ExprKind::Call`], or
    /// an ordinary call/identifier/literal expression.
    fn parse_rhs_expr(&mut self) -> Result<Expr, Error> {
        if let TokenKind::Mnemonic(m) = self.peek()?.kind {
            let loc = self.bump()?.location;
            let callee = Expr::new(ExprKind::Identifier(m.as_str().to_string()), loc.clone());
            let operands = self.parse_operand_list()?;
            return Ok(Expr::new(ExprKind::Call(Box::new(callee), operands), loc));
        }
        self.parse_expr()
    }

    fn parse_bare_instruction(&mut self, location: SourceLocation) -> Result<Stmt, Error> {
        let opcode = match self.bump()?.kind {
            TokenKind::Mnemonic(m) => m.as_str().to_string(),
            _ => unreachable!("caller checked for Mnemonic"),
        };
        let operands = self.parse_operand_list()?;
        self.expect_kind(TokenKind::Semicolon, "';'")?;
        Ok(Stmt {
            kind: StmtKind::Instruction { opcode, operands },
            location,
        })
    }

    /// A comma-separated operand list with no enclosing parentheses,
    /// up to (but not consuming) the terminating `;`.
    fn parse_operand_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut operands = Vec::new();
        if self.at(&TokenKind::Semicolon)? {
            return Ok(operands);
        }
        loop {
            operands.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(operands)
    }

    /// A `BR` with a non-identifier (or the 6-letter identifier
    /// `ALWAYS`) preceding the target means unconditional and takes a
    /// single target label; otherwise the leading operand is the
    /// condition expression and two labels (true, false) follow
    /// (`SPEC_FULL.md` §4.E).
    fn parse_branch(&mut self, location: SourceLocation) -> Result<Stmt, Error> {
        self.expect_kind(TokenKind::Mnemonic(Mnemonic::Br), "'BR'")?;
        let first = self.parse_expr()?;
        let is_unconditional = !matches!(&first.kind, ExprKind::Identifier(name) if name != "ALWAYS");
        let kind = if is_unconditional {
            self.expect_kind(TokenKind::Comma, "','")?;
            let (true_target, _) = self.expect_ident()?;
            StmtKind::Branch {
                cond: None,
                true_target,
                false_target: None,
            }
        } else {
            self.expect_kind(TokenKind::Comma, "','")?;
            let (true_target, _) = self.expect_ident()?;
            self.expect_kind(TokenKind::Comma, "','")?;
            let (false_target, _) = self.expect_ident()?;
            StmtKind::Branch {
                cond: Some(first),
                true_target,
                false_target: Some(false_target),
            }
        };
        self.expect_kind(TokenKind::Semicolon, "';'")?;
        Ok(Stmt { kind, location })
    }

    fn parse_return(&mut self, location: SourceLocation) -> Result<Stmt, Error> {
        self.expect_kind(TokenKind::Mnemonic(Mnemonic::Ret), "'RET'")?;
        let value = if self.at(&TokenKind::Semicolon)? {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_kind(TokenKind::Semicolon, "';'")?;
        Ok(Stmt {
            kind: StmtKind::Return { value },
            location,
        })
    }

    // ---- expressions -------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek()?.kind {
                TokenKind::Dot => {
                    self.bump()?;
                    let (field, _) = self.expect_ident()?;
                    let loc = expr.location.clone();
                    expr = Expr::new(ExprKind::FieldAccess(Box::new(expr), field), loc);
                }
                TokenKind::LBracket => {
                    self.bump()?;
                    let index = self.parse_expr()?;
                    self.expect_kind(TokenKind::RBracket, "']'")?;
                    let loc = expr.location.clone();
                    expr = Expr::new(ExprKind::Index(Box::new(expr), Box::new(index)), loc);
                }
                TokenKind::LParen => {
                    self.bump()?;
                    let mut args = Vec::new();
                    if !self.at(&TokenKind::RParen)? {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(&TokenKind::Comma)? {
                                break;
                            }
                        }
                    }
                    self.expect_kind(TokenKind::RParen, "')'")?;
                    let loc = expr.location.clone();
                    expr = Expr::new(ExprKind::Call(Box::new(expr), args), loc);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.bump()?;
        let location = tok.location;
        match tok.kind {
            TokenKind::IntLit(v) => Ok(Expr::new(ExprKind::IntLit(v), location)),
            TokenKind::FloatLit(v) => Ok(Expr::new(ExprKind::FloatLit(v), location)),
            TokenKind::StringLit(s) => Ok(Expr::new(ExprKind::StringLit(s), location)),
            TokenKind::Ident(name) => Ok(Expr::new(ExprKind::Identifier(name), location)),
            other => Err(Error::Parse {
                location,
                message: format!("expected an expression, found {}", describe(&other)),
            }),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::LBrace => "'{'".to_string(),
        TokenKind::RBrace => "'}'".to_string(),
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::Dot => "'.'".to_string(),
        TokenKind::Semicolon => "';'".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Arrow => "'->'".to_string(),
        TokenKind::Eq => "'='".to_string(),
        TokenKind::Lt => "'<'".to_string(),
        TokenKind::Gt => "'>'".to_string(),
        TokenKind::Keyword(_) => "a keyword".to_string(),
        TokenKind::TypeKeyword(_) => "a type keyword".to_string(),
        TokenKind::Mnemonic(m) => format!("mnemonic '{}'", m.as_str()),
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::IntLit(v) => format!("integer literal '{v}'"),
        TokenKind::FloatLit(v) => format!("float literal '{v}'"),
        TokenKind::StringLit(_) => "a string literal".to_string(),
        TokenKind::Eof => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Module {
        parse_module(src, "t.hoil").expect("parse should succeed")
    }

    #[test]
    fn minimal_module() {
        let m = parse(r#"MODULE "empty";"#);
        assert_eq!(m.name, "empty");
        assert!(m.declarations.is_empty());
    }

    #[test]
    fn typedef_with_fields() {
        let m = parse(
            r#"MODULE "t";
            TYPE Point { x: i32, y: i32 }"#,
        );
        let Declaration::TypeDef(td) = &m.declarations[0] else {
            panic!("expected typedef");
        };
        assert_eq!(td.name, "Point");
        assert_eq!(td.fields.len(), 2);
    }

    #[test]
    fn self_referential_typedef_via_pointer() {
        let m = parse(
            r#"MODULE "t";
            TYPE Node { next: ptr<Node>, value: i32 }"#,
        );
        assert_eq!(m.declarations.len(), 1);
    }

    #[test]
    fn constant_and_global() {
        let m = parse(
            r#"MODULE "t";
            CONSTANT FOO: i32 = 42;
            GLOBAL counter: i64 = 0;"#,
        );
        assert_eq!(m.declarations.len(), 2);
    }

    #[test]
    fn function_with_assign_and_bare_instruction() {
        let m = parse(
            r#"MODULE "t";
            FUNCTION add(a: i32, b: i32) -> i32 {
            entry:
                r1 = ADD a, b;
                STORE r1, a;
                RET r1;
            }"#,
        );
        let Declaration::Function(f) = &m.declarations[0] else {
            panic!("expected function");
        };
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].stmts.len(), 3);
        assert!(matches!(f.blocks[0].stmts[0].kind, StmtKind::Assign { .. }));
        assert!(matches!(f.blocks[0].stmts[1].kind, StmtKind::Instruction { .. }));
        assert!(matches!(f.blocks[0].stmts[2].kind, StmtKind::Return { .. }));
    }

    #[test]
    fn unconditional_branch() {
        let m = parse(
            r#"MODULE "t";
            FUNCTION f() -> void {
            start:
                BR ALWAYS, done;
            done:
                RET;
            }"#,
        );
        let Declaration::Function(f) = &m.declarations[0] else {
            panic!("expected function");
        };
        let StmtKind::Branch { cond, true_target, false_target } = &f.blocks[0].stmts[0].kind else {
            panic!("expected branch");
        };
        assert!(cond.is_none());
        assert_eq!(true_target, "done");
        assert!(false_target.is_none());
    }

    #[test]
    fn conditional_branch() {
        let m = parse(
            r#"MODULE "t";
            FUNCTION f(ready: bool) -> void {
            start:
                BR ready, yes, no;
            yes:
                RET;
            no:
                RET;
            }"#,
        );
        let Declaration::Function(f) = &m.declarations[0] else {
            panic!("expected function");
        };
        let StmtKind::Branch { cond, true_target, false_target } = &f.blocks[0].stmts[0].kind else {
            panic!("expected branch");
        };
        assert!(cond.is_some());
        assert_eq!(true_target, "yes");
        assert_eq!(false_target.as_deref(), Some("no"));
    }

    #[test]
    fn extern_function_variadic() {
        let m = parse(
            r#"MODULE "t";
            EXTERN FUNCTION printf(fmt: ptr<i8>, ...) -> i32;"#,
        );
        let Declaration::ExternFunction(ef) = &m.declarations[0] else {
            panic!("expected extern function");
        };
        assert!(ef.variadic);
        assert_eq!(ef.params.len(), 1);
    }

    #[test]
    fn field_access_and_index_and_call_chain() {
        let m = parse(
            r#"MODULE "t";
            FUNCTION f() -> i32 {
            entry:
                r1 = g(a.b[0]);
                RET r1;
            }"#,
        );
        let Declaration::Function(f) = &m.declarations[0] else {
            panic!("expected function");
        };
        let StmtKind::Assign { value, .. } = &f.blocks[0].stmts[0].kind else {
            panic!("expected assign");
        };
        assert!(matches!(value.kind, ExprKind::Call(..)));
    }

    #[test]
    fn malformed_source_is_a_parse_error_not_a_panic() {
        let err = parse_module("MODULE 1;", "t.hoil").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn missing_semicolon_is_rejected() {
        let err = parse_module(r#"MODULE "t""#, "t.hoil").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
