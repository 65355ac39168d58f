//! Recursive-descent parser with explicit operator-precedence climbing
//! and advance-past-one-token error recovery. Core module — see
//! SPEC_FULL.md §4.2, grounded in `original_source/src/parser.c`.

use crate::ast::{Ast, BinaryOp, UnaryOp};
use crate::diagnostics::Diagnostics;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

pub struct Parser {
    lexer: Lexer,
    current: Token,
    pub diagnostics: Diagnostics,
}

pub struct ParseOutput {
    pub ast: Ast,
    pub lexer_errors: u32,
    pub parser_errors: u32,
}

/// Parses a whole program, returning the AST along with the independent
/// lexer and parser error counts (spec.md §7).
pub fn parse(input: &str) -> ParseOutput {
    let mut parser = Parser::new(input);
    let ast = parser.parse_program();
    ParseOutput {
        ast,
        lexer_errors: parser.lexer.diagnostics.count(),
        parser_errors: parser.diagnostics.count(),
    }
}

impl Parser {
    fn new(input: &str) -> Parser {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            diagnostics: Diagnostics::new(),
        }
    }

    fn is_eof(&self) -> bool {
        self.is_kind(TokenKind::Eof)
    }

    fn is_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    /// Consumes the current token if it matches `kind`, returning `true`.
    /// On mismatch, reports the error and leaves the token stream
    /// untouched so an enclosing loop can resynchronize.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.is_kind(kind) {
            self.advance();
            return true;
        }

        self.diagnostics.report(format!(
            "error: unexpected '{}' ({}), but expected {}. {}",
            self.current.lexeme(),
            self.current.kind.kind_label(),
            kind.kind_label(),
            self.current.location
        ));
        false
    }

    fn parse_program(&mut self) -> Ast {
        let mut stmts = Vec::new();
        while !self.is_eof() {
            stmts.push(self.parse_toplevel_statement());
        }
        Ast::Seq(stmts)
    }

    fn parse_block(&mut self) -> Ast {
        let mut stmts = Vec::new();
        self.expect(TokenKind::LBrace);
        while !self.is_eof() && !self.is_kind(TokenKind::RBrace) {
            stmts.push(self.parse_statement());
        }
        self.expect(TokenKind::RBrace);
        Ast::Seq(stmts)
    }

    fn parse_toplevel_statement(&mut self) -> Ast {
        match self.current.kind {
            TokenKind::KwArray => self.parse_array_statement(),
            TokenKind::KwFunc => self.parse_func_statement(),
            TokenKind::KwConst => self.parse_const_statement(),
            _ => {
                self.diagnostics.report(format!(
                    "error: unexpected '{}' ({}). Only 'array', 'func' or 'const' are allowed as toplevel statement. {}",
                    self.current.lexeme(),
                    self.current.kind.kind_label(),
                    self.current.location
                ));
                self.advance();
                Ast::Invalid
            }
        }
    }

    fn parse_statement(&mut self) -> Ast {
        match self.current.kind {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::KwIf => self.parse_if_statement(),
            TokenKind::KwWhile => self.parse_while_statement(),
            TokenKind::KwLoop => self.parse_loop_statement(),
            TokenKind::KwFor => self.parse_for_statement(),
            TokenKind::KwBreak => self.parse_break_statement(),
            TokenKind::KwContinue => self.parse_continue_statement(),
            TokenKind::KwPuti => self.parse_puti(),
            TokenKind::KwPutc => self.parse_putc(),
            TokenKind::KwGeti => self.parse_geti(),
            TokenKind::KwGetc => self.parse_getc(),
            TokenKind::KwReturn => self.parse_return_statement(),
            TokenKind::KwHalt => self.parse_halt_statement(),
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_if_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwIf);
        self.expect(TokenKind::LParen);
        let cond = Ast::group("Condition", self.parse_expr());
        self.expect(TokenKind::RParen);
        let then = Ast::group("Then-Clause", self.parse_statement());

        let els = if self.is_kind(TokenKind::KwElse) {
            self.advance();
            Some(Box::new(Ast::group("Else-Clause", self.parse_statement())))
        } else {
            None
        };

        Ast::If {
            cond: Box::new(cond),
            then: Box::new(then),
            els,
        }
    }

    fn parse_while_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwWhile);
        self.expect(TokenKind::LParen);
        let cond = Ast::group("Condition", self.parse_expr());
        self.expect(TokenKind::RParen);
        let body = Ast::group("Body-Clause", self.parse_statement());

        Ast::While {
            cond: Box::new(cond),
            body: Box::new(body),
        }
    }

    fn parse_loop_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwLoop);
        let body = self.parse_statement();
        Ast::LoopStatement(Box::new(body))
    }

    fn parse_for_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwFor);
        self.expect(TokenKind::LParen);

        let init = if !self.is_kind(TokenKind::Semicolon) {
            Ast::group("Init-Clause", self.parse_expr())
        } else {
            Ast::Empty
        };
        self.expect(TokenKind::Semicolon);

        let cond = if !self.is_kind(TokenKind::Semicolon) {
            Ast::group("Condition-Clause", self.parse_expr())
        } else {
            Ast::Empty
        };
        self.expect(TokenKind::Semicolon);

        let next = if !self.is_kind(TokenKind::RParen) {
            Ast::group("Next-Clause", self.parse_expr())
        } else {
            Ast::Empty
        };
        self.expect(TokenKind::RParen);

        let body = Ast::group("Body-Clause", self.parse_statement());

        Ast::ForStatement {
            init: Box::new(init),
            cond: Box::new(cond),
            next: Box::new(next),
            body: Box::new(body),
        }
    }

    fn parse_break_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwBreak);
        self.expect(TokenKind::Semicolon);
        Ast::Break
    }

    fn parse_continue_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwContinue);
        self.expect(TokenKind::Semicolon);
        Ast::Continue
    }

    fn parse_puti(&mut self) -> Ast {
        self.expect(TokenKind::KwPuti);
        let node = Ast::Puti(Box::new(self.parse_expr()));
        self.expect(TokenKind::Semicolon);
        node
    }

    fn parse_putc(&mut self) -> Ast {
        self.expect(TokenKind::KwPutc);
        let node = Ast::Putc(Box::new(self.parse_expr()));
        self.expect(TokenKind::Semicolon);
        node
    }

    /// `<<GetIStatement>> ::= 'geti' <Variable> ';'`
    fn parse_geti(&mut self) -> Ast {
        self.expect(TokenKind::KwGeti);
        let node = Ast::Geti(Box::new(self.parse_ident()));
        self.expect(TokenKind::Semicolon);
        node
    }

    /// `<<GetCStatement>> ::= 'getc' <Variable> ';'`
    fn parse_getc(&mut self) -> Ast {
        self.expect(TokenKind::KwGetc);
        let node = Ast::Getc(Box::new(self.parse_ident()));
        self.expect(TokenKind::Semicolon);
        node
    }

    /// `<<ArrayDeclStatement>> ::= 'array' <Ident> '[' <Integer> ']' ';'`
    fn parse_array_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwArray);
        let ident = self.parse_ident();
        self.expect(TokenKind::LBracket);
        let capacity = self.parse_integer_value();
        self.expect(TokenKind::RBracket);
        self.expect(TokenKind::Semicolon);

        Ast::ArrayDecl {
            ident: Box::new(ident),
            capacity,
        }
    }

    /// `<<ReturnStatement>> ::= 'return' <<Expr>> ';'`
    fn parse_return_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwReturn);
        let expr = self.parse_expr();
        self.expect(TokenKind::Semicolon);
        Ast::Return(Box::new(expr))
    }

    fn parse_halt_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwHalt);
        self.expect(TokenKind::Semicolon);
        Ast::Halt
    }

    /// `<<FuncParam>> ::= [ <Ident> { ',' <Ident> } ]`
    fn parse_func_param(&mut self) -> Ast {
        let mut params = Vec::new();
        if self.is_kind(TokenKind::Symbol) {
            params.push(self.parse_ident());
            while self.is_kind(TokenKind::Comma) {
                self.expect(TokenKind::Comma);
                params.push(self.parse_ident());
            }
        }
        Ast::FuncParam(params)
    }

    /// `<<FuncStatement>> ::= 'func' <Ident> '(' <<FuncParam>> ')' <<Block>>`
    fn parse_func_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwFunc);
        let ident = self.parse_ident();
        self.expect(TokenKind::LParen);
        let params = self.parse_func_param();
        self.expect(TokenKind::RParen);
        let body = self.parse_block();

        if !body.all_paths_return() {
            self.diagnostics.report(format!(
                "error: function '{}' has code path(s) not returning a value.",
                ident.ident_name()
            ));
        }

        Ast::Func {
            ident: Box::new(ident),
            params: Box::new(params),
            body: Box::new(body),
        }
    }

    /// `<<ConstStatement>> ::= 'const' <Ident> '=' <Integer> ';'`
    fn parse_const_statement(&mut self) -> Ast {
        self.expect(TokenKind::KwConst);
        let ident = self.parse_ident();
        self.expect(TokenKind::Eq);
        let value = self.parse_integer_value();
        self.expect(TokenKind::Semicolon);

        Ast::ConstStatement {
            ident: Box::new(ident),
            value,
        }
    }

    fn parse_expr_statement(&mut self) -> Ast {
        let expr = self.parse_expr();
        self.expect(TokenKind::Semicolon);
        Ast::Expr(Box::new(expr))
    }

    fn parse_expr(&mut self) -> Ast {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Ast {
        let location = self.current.location;
        let lhs = self.parse_or();

        if self.is_kind(TokenKind::Eq) {
            self.advance();

            if !lhs.is_assignable() {
                self.diagnostics.report(format!(
                    "error: left hand side of assignment should be variable or array. {}",
                    location
                ));
            }

            let rhs = self.parse_assign();
            return Ast::Assign {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn parse_or(&mut self) -> Ast {
        let mut lhs = self.parse_and();
        while self.is_kind(TokenKind::Bar) {
            self.advance();
            let rhs = self.parse_and();
            lhs = Ast::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn parse_and(&mut self) -> Ast {
        let mut lhs = self.parse_comparison();
        while self.is_kind(TokenKind::Amp) {
            self.advance();
            let rhs = self.parse_comparison();
            lhs = Ast::Binary {
                op: BinaryOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn parse_comparison(&mut self) -> Ast {
        let mut lhs = self.parse_addsub();
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::ExclaEq => BinaryOp::Neq,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_addsub();
            lhs = Ast::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn parse_addsub(&mut self) -> Ast {
        let mut lhs = self.parse_muldiv();
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_muldiv();
            lhs = Ast::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn parse_muldiv(&mut self) -> Ast {
        let mut lhs = self.parse_atomic();
        loop {
            let op = match self.current.kind {
                TokenKind::Asterisk => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_atomic();
            lhs = Ast::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn parse_atomic(&mut self) -> Ast {
        match self.current.kind {
            TokenKind::Integer | TokenKind::Char => return self.parse_integer(),
            TokenKind::Plus => {
                // unary plus is a no-op
                self.advance();
                return self.parse_atomic();
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_atomic();
                return Ast::Unary {
                    op: UnaryOp::Negative,
                    operand: Box::new(operand),
                };
            }
            TokenKind::Excla => {
                self.advance();
                let operand = self.parse_atomic();
                return Ast::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                };
            }
            TokenKind::Symbol => {
                let ident = self.parse_ident();
                if self.is_kind(TokenKind::LBracket) {
                    let index = self.parse_array_indexer();
                    return Ast::Array {
                        ident: Box::new(ident),
                        index: Box::new(index),
                    };
                } else if self.is_kind(TokenKind::LParen) {
                    let args = self.parse_func_call_arg();
                    return Ast::FuncCall {
                        ident: Box::new(ident),
                        args: Box::new(args),
                    };
                }
                return Ast::Variable(Box::new(ident));
            }
            TokenKind::LParen => {
                self.expect(TokenKind::LParen);
                let node = self.parse_expr();
                self.expect(TokenKind::RParen);
                return node;
            }
            _ => {}
        }

        self.diagnostics.report(format!(
            "error: unexpected '{}' ({}). {}",
            self.current.lexeme(),
            self.current.kind.kind_label(),
            self.current.location
        ));
        self.advance();
        Ast::Invalid
    }

    fn parse_array_indexer(&mut self) -> Ast {
        self.expect(TokenKind::LBracket);
        let indexer = self.parse_expr();
        self.expect(TokenKind::RBracket);
        indexer
    }

    fn parse_func_call_arg(&mut self) -> Ast {
        let mut args = Vec::new();
        self.expect(TokenKind::LParen);
        if !self.is_eof() && !self.is_kind(TokenKind::RParen) {
            args.push(self.parse_expr());
            while self.is_kind(TokenKind::Comma) {
                self.expect(TokenKind::Comma);
                args.push(self.parse_expr());
            }
        }
        self.expect(TokenKind::RParen);
        Ast::FuncCallArg(args)
    }

    fn parse_ident(&mut self) -> Ast {
        if self.is_kind(TokenKind::Symbol) {
            let name = self.current.text.clone();
            self.advance();
            return Ast::Ident(name);
        }
        Ast::Invalid
    }

    fn parse_integer(&mut self) -> Ast {
        let value = self.parse_integer_value();
        Ast::Integer(value)
    }

    fn parse_integer_value(&mut self) -> i32 {
        if self.is_kind(TokenKind::Integer) || self.is_kind(TokenKind::Char) {
            let value = self.current.int_value;
            self.advance();
            return value;
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Ast {
        let out = parse(src);
        assert_eq!(out.lexer_errors, 0, "unexpected lexer errors");
        assert_eq!(out.parser_errors, 0, "unexpected parser errors");
        out.ast
    }

    #[test]
    fn parses_minimal_function() {
        let ast = parse_ok("func main() { return 0; }");
        match ast {
            Ast::Seq(top) => {
                assert_eq!(top.len(), 1);
                assert!(matches!(top[0], Ast::Func { .. }));
            }
            _ => panic!("expected Seq"),
        }
    }

    #[test]
    fn precedence_climbing_binds_mul_tighter_than_add() {
        let ast = parse_ok("func main() { return 1 + 2 * 3; }");
        if let Ast::Seq(top) = ast {
            if let Ast::Func { body, .. } = &top[0] {
                if let Ast::Seq(stmts) = body.as_ref() {
                    if let Ast::Return(expr) = &stmts[0] {
                        match expr.as_ref() {
                            Ast::Binary {
                                op: BinaryOp::Add,
                                rhs,
                                ..
                            } => {
                                assert!(matches!(rhs.as_ref(), Ast::Binary { op: BinaryOp::Mul, .. }));
                            }
                            other => panic!("expected top-level Add, got {:?}", other),
                        }
                        return;
                    }
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn assignment_is_right_associative() {
        // array declarations are only valid at toplevel (see parse_statement's
        // omission of TT_KW_ARRAY in the original parser), so the arrays live
        // outside the function under test.
        let ast = parse_ok("array x[1]; array y[1]; func f() { x[0] = y[0] = 1; return 0; }");
        if let Ast::Seq(top) = ast {
            if let Ast::Func { body, .. } = &top[2] {
                if let Ast::Seq(stmts) = body.as_ref() {
                    if let Ast::Expr(expr) = &stmts[0] {
                        match expr.as_ref() {
                            Ast::Assign { rhs, .. } => {
                                assert!(matches!(rhs.as_ref(), Ast::Assign { .. }));
                            }
                            other => panic!("expected outer Assign, got {:?}", other),
                        }
                        return;
                    }
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn bad_assignment_target_still_recovers() {
        let out = parse("func f() { 1 = 2; return 0; }");
        assert_eq!(out.parser_errors, 1);
        if let Ast::Seq(top) = out.ast {
            assert!(matches!(top[0], Ast::Func { .. }));
        } else {
            panic!("expected Seq");
        }
    }

    #[test]
    fn toplevel_rejects_non_declarations() {
        let out = parse("1 + 1;");
        assert_eq!(out.parser_errors, 1);
    }

    #[test]
    fn missing_return_path_is_reported() {
        let out = parse("func f() { if (1) { return 1; } }");
        assert_eq!(out.parser_errors, 1);
    }

    #[test]
    fn if_else_both_returning_satisfies_reachability() {
        let out = parse("func f() { if (1) { return 1; } else { return 0; } }");
        assert_eq!(out.parser_errors, 0);
    }

    #[test]
    fn empty_for_clauses_parse() {
        let out = parse("func f() { for (;;) { break; } return 0; }");
        assert_eq!(out.parser_errors, 0);
        if let Ast::Seq(top) = out.ast {
            if let Ast::Func { body, .. } = &top[0] {
                if let Ast::Seq(stmts) = body.as_ref() {
                    match &stmts[0] {
                        Ast::ForStatement { init, cond, next, .. } => {
                            assert!(matches!(init.as_ref(), Ast::Empty));
                            assert!(matches!(cond.as_ref(), Ast::Empty));
                            assert!(matches!(next.as_ref(), Ast::Empty));
                        }
                        other => panic!("expected ForStatement, got {:?}", other),
                    }
                }
            }
        }
    }

    #[test]
    fn unexpected_token_inside_block_recovers_at_closing_brace() {
        let out = parse("func f() { @ return 0; }");
        assert!(out.lexer_errors >= 1);
        if let Ast::Seq(top) = out.ast {
            assert!(matches!(top[0], Ast::Func { .. }));
        } else {
            panic!("expected Seq");
        }
    }
}
