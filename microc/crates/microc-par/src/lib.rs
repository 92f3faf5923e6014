//! microc-par - Parser (Syntactic Analyzer)
//!
//! A single-pass recursive-descent parser, predictive with one token of
//! lookahead. Operator precedence is handled by the usual ladder of
//! precedence-level functions (`parse_assignment` down to `parse_unary`)
//! rather than a Pratt table, matching the reference codebase's style.
//!
//! Unlike a pure syntax-only parser, this one also seeds the symbol table as
//! it goes: every declaration registers a symbol, and every plain
//! identifier used as a value is resolved against the current scope right
//! then, so the analyzer downstream can trust that `ExprKind::Ident::symbol`
//! is already `Some(..)` for anything that is going to resolve at all.
//! Unresolved identifiers get an `undefined symbol` diagnostic here, not in
//! the analyzer.

pub mod ast;

use ast::{
    Ast, BinOp, Branch, Decl, ExprArena, ExprId, ExprKind, FnImpl, Iter, Loop, Return, Stmt,
    StructDecl, UnOp,
};
use microc_lex::{SpannedToken, Token};
use microc_types::{Builtins, SymbolClass, SymbolId, SymbolTable, Type};
use microc_util::diagnostic::{
    DiagnosticBuilder, E_PARSER_DUPLICATE_DEF, E_PARSER_EXPECTED_TOKEN, E_PARSER_UNEXPECTED_EOF,
};
use microc_util::{Handler, Span, Symbol};

/// Drives parsing of one token stream into an [`Ast`], mutating the shared
/// [`SymbolTable`] as declarations and identifier references are seen.
pub struct Parser<'a> {
    tokens: Vec<SpannedToken>,
    pos: usize,
    table: &'a mut SymbolTable,
    builtins: &'a Builtins,
    handler: &'a Handler,
    exprs: ExprArena,
    scopes: Vec<microc_types::ScopeId>,
    loop_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(
        tokens: Vec<SpannedToken>,
        table: &'a mut SymbolTable,
        builtins: &'a Builtins,
        handler: &'a Handler,
    ) -> Self {
        let root = table.root();
        Parser {
            tokens,
            pos: 0,
            table,
            builtins,
            handler,
            exprs: ExprArena::new(),
            scopes: vec![root],
            loop_depth: 0,
        }
    }

    pub fn parse(mut self) -> Ast {
        let mut items = Vec::new();
        while !self.at_eof() {
            if let Some(item) = self.parse_item() {
                items.push(item);
            } else {
                self.advance();
            }
        }
        Ast {
            items,
            exprs: self.exprs,
        }
    }

    // ---- token stream helpers ----------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn advance(&mut self) -> SpannedToken {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Span {
        let span = self.current_span();
        if self.check(&token) {
            self.advance();
        } else {
            self.expected(what);
        }
        span
    }

    fn expected(&mut self, what: &str) {
        let span = self.current_span();
        if self.at_eof() {
            DiagnosticBuilder::error(format!("expected {}, found end of file", what))
                .code(E_PARSER_UNEXPECTED_EOF)
                .span(span)
                .emit(self.handler);
            return;
        }
        DiagnosticBuilder::error(format!("expected {}, found '{}'", what, token_text(self.current())))
            .code(E_PARSER_EXPECTED_TOKEN)
            .span(span)
            .emit(self.handler);
    }

    fn current_scope(&self) -> microc_types::ScopeId {
        *self.scopes.last().unwrap()
    }

    fn push_scope(&mut self) {
        let parent = self.current_scope();
        let child = self.table.create_scope(parent);
        self.scopes.push(child);
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declares `name` in the current scope, reporting `duplicated
    /// identifier` if it's already bound there (not in an ancestor — shadowing
    /// an outer name is fine).
    fn declare(&mut self, class: SymbolClass, name: Symbol, ty: Type, span: Span) -> SymbolId {
        let scope = self.current_scope();
        if let Some(existing) = self.table.find(scope, name) {
            if self.table.get(existing).scope == scope {
                DiagnosticBuilder::error(format!("duplicated identifier '{}'", name.as_str()))
                    .code(E_PARSER_DUPLICATE_DEF)
                    .span(span)
                    .emit(self.handler);
            }
        }
        self.table.create(class, scope, name, ty)
    }

    /// Resolves a plain identifier used as a value against the current scope,
    /// emitting `undefined symbol` if nothing binds it.
    fn resolve(&mut self, name: Symbol, span: Span) -> Option<SymbolId> {
        let scope = self.current_scope();
        let found = self.table.find(scope, name);
        if found.is_none() {
            DiagnosticBuilder::error(format!("undefined symbol '{}'", name.as_str()))
                .span(span)
                .emit(self.handler);
        }
        found
    }

    // ---- items ---------------------------------------------------------

    fn parse_item(&mut self) -> Option<ast::Item> {
        match self.current() {
            Token::KwStruct => self.parse_struct_decl().map(ast::Item::DeclStruct),
            _ => self.parse_fn_or_global_decl(),
        }
    }

    fn parse_struct_decl(&mut self) -> Option<StructDecl> {
        let start = self.current_span();
        self.advance(); // `struct`
        let name = self.expect_ident("struct name")?;
        let symbol = self.declare(SymbolClass::Struct, name, Type::Void, start);
        self.expect(Token::LBrace, "'{'");

        self.push_scope();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            let (field_ty, field_name, _) = self.parse_typed_name("field declaration")?;
            self.expect(Token::Semi, "';'");
            let field_scope = self.current_scope();
            let field = self
                .table
                .create(SymbolClass::Variable, field_scope, field_name, field_ty);
            self.table.add_child(symbol, field);
        }
        self.pop_scope();
        self.expect(Token::RBrace, "'}'");
        self.expect(Token::Semi, "';'");

        // The struct's own type names itself, matching how builtins are set up.
        self.table.get_mut(symbol).ty = Type::basic(symbol);

        Some(StructDecl {
            name,
            symbol,
            span: start,
        })
    }

    /// A top-level `type name(...)` is a function; `type name;`/`type name = expr;`
    /// is a global variable declaration.
    fn parse_fn_or_global_decl(&mut self) -> Option<ast::Item> {
        let start = self.current_span();
        let (base_ty, name, _) = self.parse_typed_name("declaration")?;

        if self.check(&Token::LParen) {
            return self.parse_fn_impl(base_ty, name, start).map(ast::Item::FnImpl);
        }

        let symbol = self.declare(SymbolClass::Variable, name, base_ty.clone(), start);
        let init = self.parse_optional_initializer();
        self.expect(Token::Semi, "';'");
        Some(ast::Item::Decl(Decl {
            name,
            symbol,
            ty: base_ty,
            init,
            span: start,
        }))
    }

    fn parse_fn_impl(&mut self, ret_ty: Type, name: Symbol, start: Span) -> Option<FnImpl> {
        self.advance(); // `(`

        // Declared in the enclosing scope *before* its parameters so a call to
        // itself inside the body resolves; the type is a placeholder until the
        // parameter list is known.
        let symbol = self.declare(SymbolClass::Function, name, Type::Invalid, start);

        self.push_scope();
        let mut param_types = Vec::new();
        let mut param_symbols = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let (pty, pname, _) = self.parse_typed_name("parameter")?;
                let scope = self.current_scope();
                let psym = self.table.create(SymbolClass::Parameter, scope, pname, pty.clone());
                param_types.push(pty);
                param_symbols.push(psym);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'");

        self.table.get_mut(symbol).ty = Type::function(ret_ty.clone(), param_types);
        for p in &param_symbols {
            self.table.add_child(symbol, *p);
        }

        let body = self.parse_block_stmts();
        self.pop_scope();

        Some(FnImpl {
            name,
            symbol,
            params: param_symbols,
            ret_type: ret_ty,
            body,
            span: start,
        })
    }

    fn parse_optional_initializer(&mut self) -> Option<ExprId> {
        if self.eat(&Token::Eq) {
            Some(self.parse_expr())
        } else {
            None
        }
    }

    // ---- type specs ------------------------------------------------------

    /// Parses `base_type '*'* ident ('[' int ']')?` and returns the fully
    /// assembled type plus the declared name.
    fn parse_typed_name(&mut self, what: &str) -> Option<(Type, Symbol, Span)> {
        let span = self.current_span();
        let mut ty = self.parse_base_type()?;
        while self.eat(&Token::Star) {
            ty = ty.derive_ptr();
        }
        let name = self.expect_ident(what)?;
        if self.eat(&Token::LBracket) {
            let len = self.expect_int_literal();
            self.expect(Token::RBracket, "']'");
            ty = Type::array(ty, len as usize);
        }
        Some((ty, name, span))
    }

    fn parse_base_type(&mut self) -> Option<Type> {
        let span = self.current_span();
        let sym = match self.current().clone() {
            Token::KwInt => self.builtins.int,
            Token::KwChar => self.builtins.char,
            Token::KwBool => self.builtins.boolean,
            Token::KwVoid => self.builtins.void,
            Token::KwStruct => {
                self.advance();
                let name = self.expect_ident("struct name")?;
                let scope = self.current_scope();
                return match self.table.find(scope, name) {
                    Some(sym) => Some(Type::basic(sym)),
                    None => {
                        DiagnosticBuilder::error(format!("undefined symbol '{}'", name.as_str()))
                            .span(span)
                            .emit(self.handler);
                        Some(Type::Invalid)
                    }
                };
            }
            Token::Ident(name) => {
                let scope = self.current_scope();
                return match self.table.find(scope, name) {
                    Some(sym) if self.table.is_record_symbol(sym) => {
                        self.advance();
                        Some(Type::basic(sym))
                    }
                    _ => {
                        self.expected("a type");
                        None
                    }
                };
            }
            _ => {
                self.expected("a type");
                return None;
            }
        };
        self.advance();
        Some(Type::basic(sym))
    }

    fn expect_ident(&mut self, what: &str) -> Option<Symbol> {
        match self.current().clone() {
            Token::Ident(name) => {
                self.advance();
                Some(name)
            }
            _ => {
                self.expected(what);
                None
            }
        }
    }

    fn expect_int_literal(&mut self) -> i64 {
        match self.current().clone() {
            Token::Int(v) => {
                self.advance();
                v
            }
            _ => {
                self.expected("an integer literal");
                0
            }
        }
    }

    // ---- statements -------------------------------------------------------

    fn parse_block_stmts(&mut self) -> Vec<Stmt> {
        self.expect(Token::LBrace, "'{'");
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_eof() {
            stmts.push(self.parse_stmt());
        }
        self.expect(Token::RBrace, "'}'");
        stmts
    }

    fn parse_stmt(&mut self) -> Stmt {
        match self.current() {
            Token::LBrace => {
                self.push_scope();
                let body = self.parse_block_stmts();
                self.pop_scope();
                Stmt::Block(body)
            }
            Token::KwStruct => self
                .parse_struct_decl()
                .map(Stmt::DeclStruct)
                .unwrap_or(Stmt::Empty),
            Token::KwIf => self.parse_if_stmt(),
            Token::KwWhile => self.parse_while_stmt(),
            Token::KwFor => self.parse_for_stmt(),
            Token::KwReturn => self.parse_return_stmt(),
            Token::KwBreak => self.parse_break_stmt(),
            Token::Semi => {
                self.advance();
                Stmt::Empty
            }
            Token::KwInt | Token::KwChar | Token::KwBool | Token::KwVoid => self.parse_local_decl(),
            _ => {
                let e = self.parse_expr();
                self.expect(Token::Semi, "';'");
                Stmt::Expr(e)
            }
        }
    }

    fn parse_local_decl(&mut self) -> Stmt {
        let start = self.current_span();
        match self.parse_typed_name("declaration") {
            Some((ty, name, _)) => {
                let symbol = self.declare(SymbolClass::Variable, name, ty.clone(), start);
                let init = self.parse_optional_initializer();
                self.expect(Token::Semi, "';'");
                Stmt::Decl(Decl {
                    name,
                    symbol,
                    ty,
                    init,
                    span: start,
                })
            }
            None => Stmt::Empty,
        }
    }

    fn parse_if_stmt(&mut self) -> Stmt {
        let start = self.current_span();
        self.advance();
        self.expect(Token::LParen, "'('");
        let cond = self.parse_expr();
        self.expect(Token::RParen, "')'");
        let then_branch = Box::new(self.parse_stmt());
        let else_branch = if self.eat(&Token::KwElse) {
            Some(Box::new(self.parse_stmt()))
        } else {
            None
        };
        Stmt::Branch(Branch {
            cond,
            then_branch,
            else_branch,
            span: start,
        })
    }

    fn parse_while_stmt(&mut self) -> Stmt {
        let start = self.current_span();
        self.advance();
        self.expect(Token::LParen, "'('");
        let cond = self.parse_expr();
        self.expect(Token::RParen, "')'");
        self.loop_depth += 1;
        let body = Box::new(self.parse_stmt());
        self.loop_depth -= 1;
        Stmt::Loop(Loop { cond, body, span: start })
    }

    fn parse_for_stmt(&mut self) -> Stmt {
        let start = self.current_span();
        self.advance();
        self.expect(Token::LParen, "'('");
        self.push_scope();

        let init = if self.check(&Token::Semi) {
            self.advance();
            None
        } else if matches!(
            self.current(),
            Token::KwInt | Token::KwChar | Token::KwBool | Token::KwVoid
        ) {
            Some(Box::new(self.parse_local_decl()))
        } else {
            let e = self.parse_expr();
            self.expect(Token::Semi, "';'");
            Some(Box::new(Stmt::Expr(e)))
        };

        let cond = if self.check(&Token::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(Token::Semi, "';'");

        let step = if self.check(&Token::RParen) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(Token::RParen, "')'");

        self.loop_depth += 1;
        let body = Box::new(self.parse_stmt());
        self.loop_depth -= 1;
        self.pop_scope();

        Stmt::Iter(Iter {
            init,
            cond,
            step,
            body,
            span: start,
        })
    }

    fn parse_return_stmt(&mut self) -> Stmt {
        let start = self.current_span();
        self.advance();
        let value = if self.check(&Token::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(Token::Semi, "';'");
        Stmt::Return(Return { value, span: start })
    }

    fn parse_break_stmt(&mut self) -> Stmt {
        let span = self.current_span();
        self.advance();
        if self.loop_depth == 0 {
            DiagnosticBuilder::error("cannot break when not in loop or switch")
                .span(span)
                .emit(self.handler);
        }
        self.expect(Token::Semi, "';'");
        Stmt::Break(span)
    }

    // ---- expressions --------------------------------------------------
    //
    // Precedence ladder, loosest to tightest: comma, assignment, ternary,
    // logical-or, logical-and, bitwise-or, bitwise-xor, bitwise-and,
    // equality, relational, shift, additive, multiplicative, unary, postfix,
    // primary. `parse_expr` includes the comma operator; `parse_assignment`
    // is what function-call arguments and `for` clauses use instead, so a
    // comma there is correctly read as an argument separator.

    fn parse_expr(&mut self) -> ExprId {
        let mut lhs = self.parse_assignment();
        while self.check(&Token::Comma) {
            let span = self.current_span();
            self.advance();
            let rhs = self.parse_assignment();
            lhs = self.exprs.alloc(ExprKind::Comma(lhs, rhs), span);
        }
        lhs
    }

    fn parse_assignment(&mut self) -> ExprId {
        let lhs = self.parse_ternary();
        let compound = match self.current() {
            Token::PlusEq => Some(BinOp::Add),
            Token::MinusEq => Some(BinOp::Sub),
            Token::StarEq => Some(BinOp::Mul),
            Token::SlashEq => Some(BinOp::Div),
            Token::PercentEq => Some(BinOp::Mod),
            Token::AmpEq => Some(BinOp::BitAnd),
            Token::PipeEq => Some(BinOp::BitOr),
            Token::CaretEq => Some(BinOp::BitXor),
            _ => None,
        };
        if let Some(op) = compound {
            let span = self.current_span();
            self.advance();
            let rhs = self.parse_assignment();
            return self.exprs.alloc(ExprKind::CompoundAssign(op, lhs, rhs), span);
        }
        if self.check(&Token::Eq) {
            let span = self.current_span();
            self.advance();
            let rhs = self.parse_assignment();
            return self.exprs.alloc(ExprKind::Assign(lhs, rhs), span);
        }
        lhs
    }

    fn parse_ternary(&mut self) -> ExprId {
        let cond = self.parse_logical_or();
        if self.check(&Token::Question) {
            let span = self.current_span();
            self.advance();
            let then_e = self.parse_expr();
            self.expect(Token::Colon, "':'");
            let else_e = self.parse_ternary();
            return self.exprs.alloc(ExprKind::Ternary(cond, then_e, else_e), span);
        }
        cond
    }

    fn parse_binop_level(
        &mut self,
        next: impl Fn(&mut Self) -> ExprId + Copy,
        ops: &[(Token, BinOp)],
    ) -> ExprId {
        let mut lhs = next(self);
        'outer: loop {
            for (tok, op) in ops {
                if self.check(tok) {
                    let span = self.current_span();
                    self.advance();
                    let rhs = next(self);
                    lhs = self.exprs.alloc(ExprKind::Binary(*op, lhs, rhs), span);
                    continue 'outer;
                }
            }
            break;
        }
        lhs
    }

    fn parse_logical_or(&mut self) -> ExprId {
        self.parse_binop_level(Self::parse_logical_and, &[(Token::PipePipe, BinOp::Or)])
    }

    fn parse_logical_and(&mut self) -> ExprId {
        self.parse_binop_level(Self::parse_bit_or, &[(Token::AmpAmp, BinOp::And)])
    }

    fn parse_bit_or(&mut self) -> ExprId {
        self.parse_binop_level(Self::parse_bit_xor, &[(Token::Pipe, BinOp::BitOr)])
    }

    fn parse_bit_xor(&mut self) -> ExprId {
        self.parse_binop_level(Self::parse_bit_and, &[(Token::Caret, BinOp::BitXor)])
    }

    fn parse_bit_and(&mut self) -> ExprId {
        self.parse_binop_level(Self::parse_equality, &[(Token::Amp, BinOp::BitAnd)])
    }

    fn parse_equality(&mut self) -> ExprId {
        self.parse_binop_level(
            Self::parse_relational,
            &[(Token::EqEq, BinOp::Eq), (Token::Ne, BinOp::Ne)],
        )
    }

    fn parse_relational(&mut self) -> ExprId {
        self.parse_binop_level(
            Self::parse_shift,
            &[
                (Token::Lt, BinOp::Lt),
                (Token::Le, BinOp::Le),
                (Token::Gt, BinOp::Gt),
                (Token::Ge, BinOp::Ge),
            ],
        )
    }

    fn parse_shift(&mut self) -> ExprId {
        self.parse_binop_level(
            Self::parse_additive,
            &[(Token::Shl, BinOp::Shl), (Token::Shr, BinOp::Shr)],
        )
    }

    fn parse_additive(&mut self) -> ExprId {
        self.parse_binop_level(
            Self::parse_multiplicative,
            &[(Token::Plus, BinOp::Add), (Token::Minus, BinOp::Sub)],
        )
    }

    fn parse_multiplicative(&mut self) -> ExprId {
        self.parse_binop_level(
            Self::parse_unary,
            &[
                (Token::Star, BinOp::Mul),
                (Token::Slash, BinOp::Div),
                (Token::Percent, BinOp::Mod),
            ],
        )
    }

    fn parse_unary(&mut self) -> ExprId {
        let op = match self.current() {
            Token::Minus => Some(UnOp::Neg),
            Token::Bang => Some(UnOp::Not),
            Token::Tilde => Some(UnOp::BitNot),
            Token::Star => Some(UnOp::Deref),
            Token::Amp => Some(UnOp::AddrOf),
            Token::PlusPlus => Some(UnOp::Inc),
            Token::MinusMinus => Some(UnOp::Dec),
            _ => None,
        };
        if let Some(op) = op {
            let span = self.current_span();
            self.advance();
            let operand = self.parse_unary();
            return self.exprs.alloc(ExprKind::Unary(op, operand), span);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ExprId {
        let mut expr = self.parse_primary();
        loop {
            match self.current() {
                Token::LParen => {
                    let span = self.current_span();
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&Token::RParen) {
                        loop {
                            args.push(self.parse_assignment());
                            if !self.eat(&Token::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen, "')'");
                    expr = self.exprs.alloc(ExprKind::Call(expr, args), span);
                }
                Token::LBracket => {
                    let span = self.current_span();
                    self.advance();
                    let index = self.parse_expr();
                    self.expect(Token::RBracket, "']'");
                    expr = self.exprs.alloc(ExprKind::Index(expr, index), span);
                }
                Token::Dot => {
                    let span = self.current_span();
                    self.advance();
                    let field = self.expect_ident("a field name").unwrap_or(Symbol::intern(""));
                    expr = self.exprs.alloc(ExprKind::Field(expr, field), span);
                }
                Token::Arrow => {
                    let span = self.current_span();
                    self.advance();
                    let field = self.expect_ident("a field name").unwrap_or(Symbol::intern(""));
                    expr = self.exprs.alloc(ExprKind::Arrow(expr, field), span);
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> ExprId {
        let span = self.current_span();
        match self.current().clone() {
            Token::Int(v) => {
                self.advance();
                self.exprs.alloc(ExprKind::IntLit(v), span)
            }
            Token::KwTrue => {
                self.advance();
                self.exprs.alloc(ExprKind::BoolLit(true), span)
            }
            Token::KwFalse => {
                self.advance();
                self.exprs.alloc(ExprKind::BoolLit(false), span)
            }
            Token::Ident(name) => {
                self.advance();
                let symbol = self.resolve(name, span);
                self.exprs.alloc(ExprKind::Ident { name, symbol }, span)
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(Token::RParen, "')'");
                inner
            }
            Token::LBrace => {
                self.advance();
                let mut elems = Vec::new();
                if !self.check(&Token::RBrace) {
                    loop {
                        elems.push(self.parse_assignment());
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(Token::RBrace, "'}'");
                self.exprs.alloc(ExprKind::ArrayLit(elems), span)
            }
            _ => {
                self.expected("an expression");
                self.exprs.alloc(ExprKind::Invalid, span)
            }
        }
    }
}

fn token_text(token: &Token) -> String {
    match token {
        Token::Int(v) => v.to_string(),
        Token::Ident(s) => s.as_str().to_string(),
        Token::KwInt => "int".into(),
        Token::KwChar => "char".into(),
        Token::KwBool => "bool".into(),
        Token::KwVoid => "void".into(),
        Token::KwStruct => "struct".into(),
        Token::KwIf => "if".into(),
        Token::KwElse => "else".into(),
        Token::KwWhile => "while".into(),
        Token::KwFor => "for".into(),
        Token::KwReturn => "return".into(),
        Token::KwBreak => "break".into(),
        Token::KwTrue => "true".into(),
        Token::KwFalse => "false".into(),
        Token::LParen => "(".into(),
        Token::RParen => ")".into(),
        Token::LBrace => "{".into(),
        Token::RBrace => "}".into(),
        Token::LBracket => "[".into(),
        Token::RBracket => "]".into(),
        Token::Semi => ";".into(),
        Token::Comma => ",".into(),
        Token::Dot => ".".into(),
        Token::Arrow => "->".into(),
        Token::Amp => "&".into(),
        Token::Star => "*".into(),
        Token::Plus => "+".into(),
        Token::Minus => "-".into(),
        Token::PlusPlus => "++".into(),
        Token::MinusMinus => "--".into(),
        Token::Slash => "/".into(),
        Token::Percent => "%".into(),
        Token::Bang => "!".into(),
        Token::Tilde => "~".into(),
        Token::Pipe => "|".into(),
        Token::Caret => "^".into(),
        Token::Shl => "<<".into(),
        Token::Shr => ">>".into(),
        Token::AmpAmp => "&&".into(),
        Token::PipePipe => "||".into(),
        Token::Eq => "=".into(),
        Token::EqEq => "==".into(),
        Token::Ne => "!=".into(),
        Token::Lt => "<".into(),
        Token::Le => "<=".into(),
        Token::Gt => ">".into(),
        Token::Ge => ">=".into(),
        Token::Question => "?".into(),
        Token::Colon => ":".into(),
        Token::PlusEq => "+=".into(),
        Token::MinusEq => "-=".into(),
        Token::StarEq => "*=".into(),
        Token::SlashEq => "/=".into(),
        Token::PercentEq => "%=".into(),
        Token::AmpEq => "&=".into(),
        Token::PipeEq => "|=".into(),
        Token::CaretEq => "^=".into(),
        Token::Eof => "<eof>".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microc_util::FileId;

    fn parse(src: &str) -> (Ast, Handler) {
        let handler = Handler::new();
        let tokens = microc_lex::Lexer::new(src, FileId(0)).tokenize(&handler);
        let (mut table, builtins) = SymbolTable::with_builtins();
        let ast = {
            let parser = Parser::new(tokens, &mut table, &builtins, &handler);
            parser.parse()
        };
        (ast, handler)
    }

    #[test]
    fn parses_empty_function() {
        let (ast, handler) = parse("int main() { return 0; }");
        assert_eq!(ast.items.len(), 1);
        assert!(!handler.has_errors());
    }

    #[test]
    fn parses_global_variable_declaration() {
        let (ast, handler) = parse("int counter = 0;");
        assert_eq!(ast.items.len(), 1);
        assert!(!handler.has_errors());
    }

    #[test]
    fn parses_struct_with_fields() {
        let (ast, handler) = parse("struct Point { int x; int y; }");
        assert_eq!(ast.items.len(), 1);
        assert!(!handler.has_errors());
        if let ast::Item::DeclStruct(s) = &ast.items[0] {
            assert_eq!(s.name.as_str(), "Point");
        } else {
            panic!("expected a struct decl");
        }
    }

    #[test]
    fn resolves_recursive_call_to_its_own_function() {
        let (_ast, handler) = parse("int fact(int n) { return fact(n); }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn reports_undefined_symbol() {
        let (_ast, handler) = parse("int main() { return missing; }");
        assert!(handler.has_errors());
    }

    #[test]
    fn reports_duplicate_identifier_in_same_scope() {
        let (_ast, handler) = parse("int x; int x;");
        assert!(handler.has_errors());
    }

    #[test]
    fn shadowing_in_nested_scope_is_not_a_duplicate() {
        let (_ast, handler) = parse("int x; int main() { int x; return x; }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn reports_break_outside_loop() {
        let (_ast, handler) = parse("int main() { break; }");
        assert!(handler.has_errors());
    }

    #[test]
    fn break_inside_while_is_fine() {
        let (_ast, handler) = parse("int main() { while (1) { break; } return 0; }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn parses_for_loop_with_all_clauses() {
        let (_ast, handler) =
            parse("int main() { for (int i = 0; i < 10; i = i + 1) { } return 0; }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn parses_pointer_and_array_declarators() {
        let (ast, handler) = parse("int *p; int arr[4];");
        assert_eq!(ast.items.len(), 2);
        assert!(!handler.has_errors());
    }

    #[test]
    fn parses_member_access_and_arrow() {
        let (_ast, handler) =
            parse("struct Point { int x; } int main() { struct Point p; return p.x; }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn ternary_and_comma_parse() {
        let (_ast, handler) = parse("int main() { int x; x = 1 ? 2 : 3; return (x, 0); }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn parses_prefix_increment_and_decrement() {
        let (ast, handler) = parse("int main() { int x; return ++x + --x; }");
        assert!(!handler.has_errors());
        let ast::Item::FnImpl(f) = &ast.items[0] else { panic!("expected a function") };
        let Stmt::Return(r) = &f.body[1] else { panic!("expected a return statement") };
        let ExprKind::Binary(_, l, r) = ast.exprs.kind(r.value.unwrap()) else {
            panic!("expected a binary expression")
        };
        assert!(matches!(ast.exprs.kind(*l), ExprKind::Unary(UnOp::Inc, _)));
        assert!(matches!(ast.exprs.kind(*r), ExprKind::Unary(UnOp::Dec, _)));
    }
}
