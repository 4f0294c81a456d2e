//! Recursive-descent parser for Vesper.
//!
//! Single-token lookahead, no backtracking. Produces one `Program`
//! root or fails with `VesperError::Parse` carrying the expected
//! construct and the offending token's position. An unterminated block
//! is a hard error; nothing is recovered.

use std::rc::Rc;

use crate::ast::{
    AssignOp, BinaryOp, ClassDecl, Expr, FunctionDecl, ImportClause, Literal, Program, Stmt,
    UnaryOp,
};
use crate::error::VesperError;
use crate::lexer::{Token, TokenKind, lex};

/// Parse a full source string into a `Program`.
pub fn parse(source: &str) -> Result<Program, VesperError> {
    let tokens = lex(source)?;
    parse_tokens(tokens)
}

/// Parse an already-lexed token stream.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, VesperError> {
    let mut parser = Parser { tokens, position: 0 };
    parser.parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn parse_program(&mut self) -> Result<Program, VesperError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Stmt, VesperError> {
        let stmt = match self.peek().kind {
            TokenKind::Let => self.parse_let()?,
            TokenKind::Def => self.parse_function()?,
            TokenKind::Class => self.parse_class()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Break => {
                self.advance();
                Stmt::Break
            }
            TokenKind::Continue => {
                self.advance();
                Stmt::Continue
            }
            TokenKind::Try => self.parse_try()?,
            TokenKind::Import => self.parse_import()?,
            _ => Stmt::Expression(self.parse_expr()?),
        };
        // Statement separators are optional.
        self.eat(TokenKind::Semi);
        Ok(stmt)
    }

    fn parse_let(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // let
        let name = self.expect_ident("variable name")?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_expr()?;
        Ok(Stmt::Let { name, value })
    }

    fn parse_function(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // def
        Ok(Stmt::Function(Rc::new(self.parse_function_decl()?)))
    }

    /// Parses `name(params) { body }`, shared by `def` and class methods.
    fn parse_function_decl(&mut self) -> Result<FunctionDecl, VesperError> {
        let name = self.expect_ident("function name")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.expect_ident("parameter name")?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.parse_block()?;
        Ok(FunctionDecl { name, params, body })
    }

    fn parse_class(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // class
        let name = self.expect_ident("class name")?;
        let superclass = if self.eat(TokenKind::Extends) {
            Some(self.expect_ident("superclass name")?)
        } else {
            None
        };
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut properties = Vec::new();
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.error("'}' to close class body"));
            }
            if self.eat(TokenKind::Def) {
                methods.push(Rc::new(self.parse_function_decl()?));
            } else {
                let prop = self.expect_ident("property or method declaration")?;
                self.expect(TokenKind::Assign, "'='")?;
                let value = self.parse_expr()?;
                properties.push((prop, value));
            }
            self.eat(TokenKind::Semi);
        }
        self.advance(); // }

        Ok(Stmt::Class(Rc::new(ClassDecl {
            name,
            superclass,
            properties,
            methods,
        })))
    }

    fn parse_if(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // if
        let mut branches = Vec::new();
        let condition = self.parse_expr()?;
        branches.push((condition, self.parse_block()?));

        let mut else_branch = None;
        loop {
            if self.eat(TokenKind::Elsif) {
                let condition = self.parse_expr()?;
                branches.push((condition, self.parse_block()?));
            } else if self.eat(TokenKind::Else) {
                else_branch = Some(self.parse_block()?);
                break;
            } else {
                break;
            }
        }

        Ok(Stmt::If {
            branches,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // while
        let condition = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body })
    }

    /// `for x = start to end [step expr] { body }`
    ///
    /// `step` is a reserved keyword, so the clause is unambiguous; a
    /// program cannot use `step` as a variable name.
    fn parse_for(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // for
        let variable = self.expect_ident("loop variable")?;
        self.expect(TokenKind::Assign, "'='")?;
        let start = self.parse_expr()?;
        self.expect(TokenKind::To, "'to'")?;
        let end = self.parse_expr()?;
        let step = if self.eat(TokenKind::Step) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(Stmt::For {
            variable,
            start,
            end,
            step,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // return
        // A value follows unless the statement visibly ends here.
        let value = if self.check(TokenKind::Semi)
            || self.check(TokenKind::RBrace)
            || self.check(TokenKind::Eof)
        {
            None
        } else {
            Some(self.parse_expr()?)
        };
        Ok(Stmt::Return(value))
    }

    fn parse_try(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // try
        let body = self.parse_block()?;

        let catch = if self.eat(TokenKind::Catch) {
            let param = if self.eat(TokenKind::LParen) {
                let name = self.expect_ident("catch parameter")?;
                self.expect(TokenKind::RParen, "')'")?;
                Some(name)
            } else {
                None
            };
            Some((param, self.parse_block()?))
        } else {
            None
        };

        let finally = if self.eat(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if catch.is_none() && finally.is_none() {
            return Err(self.error("'catch' or 'finally' after try block"));
        }
        Ok(Stmt::Try {
            body,
            catch,
            finally,
        })
    }

    fn parse_import(&mut self) -> Result<Stmt, VesperError> {
        self.advance(); // import

        let clause = if self.eat(TokenKind::LBrace) {
            let mut names = Vec::new();
            loop {
                let name = self.expect_ident("imported name")?;
                let alias = if self.eat(TokenKind::As) {
                    Some(self.expect_ident("import alias")?)
                } else {
                    None
                };
                names.push((name, alias));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace, "'}'")?;
            ImportClause::Named(names)
        } else if self.eat(TokenKind::Star) {
            self.expect(TokenKind::As, "'as'")?;
            ImportClause::Wildcard(self.expect_ident("import alias")?)
        } else {
            ImportClause::Default(self.expect_ident("imported name")?)
        };

        self.expect(TokenKind::From, "'from'")?;
        let token = self.expect(TokenKind::Str, "module path string")?;
        let source = token.text;
        Ok(Stmt::Import { clause, source })
    }

    /// A brace-delimited statement list. Reaching end of input before
    /// the closing brace is a hard, unrecovered error.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, VesperError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.error("'}' to close block"));
            }
            statements.push(self.parse_statement()?);
        }
        self.advance(); // }
        Ok(statements)
    }

    // -----------------------------------------------------------------
    // Expressions, lowest to highest precedence
    // -----------------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, VesperError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, VesperError> {
        let target = self.parse_or()?;
        let op = match self.peek().kind {
            TokenKind::Assign => AssignOp::Set,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            TokenKind::StarAssign => AssignOp::Mul,
            TokenKind::SlashAssign => AssignOp::Div,
            _ => return Ok(target),
        };
        self.advance();
        // Right-associative: a = b = c parses as a = (b = c). Target
        // validity is a runtime concern, not a parse error.
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            target: Box::new(target),
            op,
            value: Box::new(value),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, VesperError> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::OrOr) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, VesperError> {
        let mut left = self.parse_equality()?;
        while self.eat(TokenKind::AndAnd) {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, VesperError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, VesperError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, VesperError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, VesperError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, VesperError> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Postfix chain: calls, indexing, member access, left-associative.
    fn parse_postfix(&mut self) -> Result<Expr, VesperError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "')'")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let property = self.expect_ident("property name")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, VesperError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value: f64 = token
                    .text
                    .parse()
                    .map_err(|_| self.error("numeric literal"))?;
                Ok(Expr::Literal(Literal::Number(value)))
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(token.text)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Ident => {
                self.advance();
                Ok(Expr::Identifier(token.text))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expr()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::Array(elements))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                if !self.check(TokenKind::RBrace) {
                    loop {
                        let key = match self.peek().kind {
                            TokenKind::Ident | TokenKind::Str => {
                                let key = self.peek().text.clone();
                                self.advance();
                                key
                            }
                            _ => return Err(self.error("object key")),
                        };
                        self.expect(TokenKind::Colon, "':'")?;
                        let value = self.parse_expr()?;
                        entries.push((key, value));
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                Ok(Expr::Object(entries))
            }
            _ => Err(self.error("expression")),
        }
    }

    // -----------------------------------------------------------------
    // Token cursor helpers
    // -----------------------------------------------------------------

    fn peek(&self) -> &Token {
        // The stream always ends with Eof, so this cannot run past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, VesperError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String, VesperError> {
        let token = self.expect(TokenKind::Ident, expected)?;
        Ok(token.text)
    }

    fn error(&self, expected: &str) -> VesperError {
        let token = self.peek();
        VesperError::Parse {
            expected: expected.to_string(),
            found: token.describe(),
            line: token.line,
            column: token.column,
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Stmt {
        let program = parse(source).expect("parse");
        assert_eq!(program.statements.len(), 1, "expected one statement");
        program.statements.into_iter().next().unwrap()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let stmt = parse_one("1 + 2 * 3");
        let Stmt::Expression(Expr::Binary { op, right, .. }) = stmt else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn comparison_binds_tighter_than_logical_and() {
        let stmt = parse_one("a < b && c > d");
        let Stmt::Expression(Expr::Binary { op, .. }) = stmt else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::And);
    }

    #[test]
    fn assignment_is_right_associative() {
        let stmt = parse_one("a = b = 1");
        let Stmt::Expression(Expr::Assign { value, .. }) = stmt else {
            panic!("expected assignment");
        };
        assert!(matches!(*value, Expr::Assign { .. }));
    }

    #[test]
    fn compound_assignment_parses() {
        let stmt = parse_one("x += 2");
        let Stmt::Expression(Expr::Assign { op, .. }) = stmt else {
            panic!("expected assignment");
        };
        assert_eq!(op, AssignOp::Add);
    }

    #[test]
    fn postfix_chains_are_left_associative() {
        let stmt = parse_one("a.b[0](1, 2)");
        let Stmt::Expression(Expr::Call { callee, args }) = stmt else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(*callee, Expr::Index { .. }));
    }

    #[test]
    fn parses_function_declaration() {
        let stmt = parse_one("def add(a, b) { return a + b }");
        let Stmt::Function(decl) = stmt else {
            panic!("expected function");
        };
        assert_eq!(decl.name, "add");
        assert_eq!(decl.params, vec!["a", "b"]);
        assert_eq!(decl.body.len(), 1);
    }

    #[test]
    fn parses_if_elsif_else_chain() {
        let stmt = parse_one("if a { 1 } elsif b { 2 } elsif c { 3 } else { 4 }");
        let Stmt::If {
            branches,
            else_branch,
        } = stmt
        else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 3);
        assert!(else_branch.is_some());
    }

    #[test]
    fn parses_for_with_and_without_step() {
        let stmt = parse_one("for i = 1 to 10 { }");
        assert!(matches!(stmt, Stmt::For { step: None, .. }));

        let stmt = parse_one("for i = 10 to 0 step 0 - 2 { }");
        assert!(matches!(stmt, Stmt::For { step: Some(_), .. }));
    }

    #[test]
    fn step_cannot_be_used_as_a_variable_name() {
        // `step` is reserved; binding it is a parse error rather than a
        // silent mis-parse of a following for-loop.
        assert!(parse("let step = 1").is_err());
    }

    #[test]
    fn parses_class_with_superclass_properties_and_methods() {
        let stmt = parse_one(
            "class Dog extends Animal { legs = 4; def speak() { return \"woof\" } name = \"rex\" }",
        );
        let Stmt::Class(decl) = stmt else {
            panic!("expected class");
        };
        assert_eq!(decl.name, "Dog");
        assert_eq!(decl.superclass.as_deref(), Some("Animal"));
        assert_eq!(decl.properties.len(), 2);
        assert_eq!(decl.methods.len(), 1);
    }

    #[test]
    fn parses_try_catch_finally() {
        let stmt = parse_one("try { risky() } catch (e) { handle(e) } finally { cleanup() }");
        let Stmt::Try {
            catch, finally, ..
        } = stmt
        else {
            panic!("expected try");
        };
        assert!(catch.is_some());
        assert!(finally.is_some());
    }

    #[test]
    fn try_requires_catch_or_finally() {
        assert!(parse("try { 1 }").is_err());
    }

    #[test]
    fn parses_import_forms() {
        let named = parse_one("import { sin, cos as cosine } from \"math\"");
        let Stmt::Import {
            clause: ImportClause::Named(names),
            source,
        } = named
        else {
            panic!("expected named import");
        };
        assert_eq!(source, "math");
        assert_eq!(names[1], ("cos".to_string(), Some("cosine".to_string())));

        let wildcard = parse_one("import * as math from \"math\"");
        assert!(matches!(
            wildcard,
            Stmt::Import {
                clause: ImportClause::Wildcard(_),
                ..
            }
        ));

        let default = parse_one("import math from \"math\"");
        assert!(matches!(
            default,
            Stmt::Import {
                clause: ImportClause::Default(_),
                ..
            }
        ));
    }

    #[test]
    fn parses_array_and_object_literals() {
        let stmt = parse_one("let p = { x: 1, \"y\": [2, 3] }");
        let Stmt::Let { value, .. } = stmt else {
            panic!("expected let");
        };
        let Expr::Object(entries) = value else {
            panic!("expected object literal");
        };
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[1].1, Expr::Array(_)));
    }

    #[test]
    fn unterminated_block_is_a_hard_error() {
        let err = parse("while true { let x = 1").unwrap_err();
        let VesperError::Parse { expected, .. } = err else {
            panic!("expected parse error");
        };
        assert!(expected.contains("}"));
    }

    #[test]
    fn reports_position_of_unexpected_token() {
        let err = parse("let = 5").unwrap_err();
        let VesperError::Parse { line, column, .. } = err else {
            panic!("expected parse error");
        };
        assert_eq!((line, column), (1, 5));
    }
}
