//! Recursive-descent parser for the language.
//!
//! Builds a [`Program`] AST from the token stream produced by the lexer,
//! using an explicit operator-precedence ladder for expressions (with
//! assignment parsed as an expression, right-associatively, at the very top
//! of the ladder). The first syntactic error halts the parse; there is a
//! small synchronization routine used only to avoid looping after an error
//! while still surfacing that first error to the caller.
//!
//! ## Grammar (informal)
//!
//! ```text
//! program      := ACTION declaration* END
//! declaration  := funcDecl | varDecl | statement
//! funcDecl     := 'climax' IDENT '(' params? ')' block
//! varDecl      := 'maan lo' IDENT '=' expression
//! statement    := ifStmt | whileStmt | returnStmt | printStmt
//!               | breakStmt | block | exprStmt
//! ifStmt       := 'agar kismat rahi' '(' expression ')' block
//!                 ( 'nahi to' '(' expression ')' block )*
//!                 ( 'warna' block )?
//! whileStmt    := 'jab tak hai jaan' '(' expression ')' block
//! returnStmt   := 'dialogue wapas do' expression?
//! printStmt    := 'ek baat bataun:' expression (',' expression)*
//! breakStmt    := 'me bahar ja raha hu'
//! block        := '{' declaration* '}'
//! ```

use crate::ast::*;
use crate::error::{LangError, Position, Result};
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses the full token stream into a [`Program`].
    pub fn parse(&mut self) -> Result<Program> {
        log::trace!("parser: start, {} tokens", self.tokens.len());
        self.expect_kind(&TokenKind::Action, "the program-start keyword")?;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::End) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.expect_kind(&TokenKind::End, "the program-end keyword")?;
        log::trace!("parser: end, {} top-level statements", statements.len());
        Ok(Program { statements })
    }

    fn declaration(&mut self) -> Result<Statement> {
        if self.check(&TokenKind::Func) {
            return self.func_decl();
        }
        if self.check(&TokenKind::Let) {
            return self.var_decl();
        }
        self.statement()
    }

    fn func_decl(&mut self) -> Result<Statement> {
        let line = self.peek().line;
        self.advance(); // 'climax'
        let name = self.expect_identifier("a function name")?;

        self.expect_kind(&TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.expect_identifier("a parameter name")?);
            while self.match_kind(&TokenKind::Comma) {
                params.push(self.expect_identifier("a parameter name")?);
            }
        }
        self.expect_kind(&TokenKind::RParen, "')' after parameters")?;

        let body = self.block()?;
        Ok(Statement::FuncDecl { name, params, body, line })
    }

    fn var_decl(&mut self) -> Result<Statement> {
        let line = self.peek().line;
        self.advance(); // 'maan lo'
        let name = self.expect_identifier("a variable name")?;
        self.expect_kind(&TokenKind::Equal, "'=' after variable name")?;
        let initializer = self.expression()?;
        Ok(Statement::VarDecl { name, initializer, line })
    }

    fn statement(&mut self) -> Result<Statement> {
        match &self.peek().kind {
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Print => self.print_statement(),
            TokenKind::Break => {
                let line = self.peek().line;
                self.advance();
                Ok(Statement::Break { line })
            }
            TokenKind::LBrace => Ok(Statement::Block(self.block()?)),
            _ => self.expr_statement(),
        }
    }

    fn if_statement(&mut self) -> Result<Statement> {
        let line = self.peek().line;
        self.advance(); // 'agar kismat rahi'

        let mut conditions = Vec::new();
        let mut consequents = Vec::new();

        conditions.push(self.parenthesized_expression()?);
        consequents.push(self.block()?);

        while self.check(&TokenKind::ElseIf) {
            self.advance(); // 'nahi to'
            conditions.push(self.parenthesized_expression()?);
            consequents.push(self.block()?);
        }

        let alternate = if self.match_kind(&TokenKind::Else) { Some(self.block()?) } else { None };

        Ok(Statement::If { conditions, consequents, alternate, line })
    }

    fn while_statement(&mut self) -> Result<Statement> {
        let line = self.peek().line;
        self.advance(); // 'jab tak hai jaan'
        let condition = self.parenthesized_expression()?;
        let body = self.block()?;
        Ok(Statement::While { condition, body, line })
    }

    fn return_statement(&mut self) -> Result<Statement> {
        let line = self.peek().line;
        self.advance(); // 'dialogue wapas do'
        let has_value = !matches!(self.peek().kind, TokenKind::RBrace | TokenKind::End | TokenKind::Eof);
        let value = if has_value { Some(self.expression()?) } else { None };
        Ok(Statement::Return { value, line })
    }

    fn print_statement(&mut self) -> Result<Statement> {
        let line = self.peek().line;
        self.advance(); // 'ek baat bataun:'
        let mut arguments = vec![self.expression()?];
        while self.match_kind(&TokenKind::Comma) {
            arguments.push(self.expression()?);
        }
        Ok(Statement::Print { arguments, line })
    }

    fn expr_statement(&mut self) -> Result<Statement> {
        let line = self.peek().line;
        let expr = self.expression()?;
        Ok(Statement::ExprStmt { expr, line })
    }

    fn block(&mut self) -> Result<Block> {
        self.expect_kind(&TokenKind::LBrace, "'{' to start a block")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.expect_kind(&TokenKind::RBrace, "'}' to close a block")?;
        Ok(Block { statements })
    }

    fn parenthesized_expression(&mut self) -> Result<Expression> {
        self.expect_kind(&TokenKind::LParen, "'(' before condition")?;
        let expr = self.expression()?;
        self.expect_kind(&TokenKind::RParen, "')' after condition")?;
        Ok(expr)
    }

    // ---- expression ladder, lowest to highest precedence ----

    fn expression(&mut self) -> Result<Expression> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expression> {
        let target_position = self.peek().position();
        let expr = self.logical_or()?;

        if self.check(&TokenKind::Equal) {
            let line = self.peek().line;
            self.advance();
            let value = self.assignment()?;
            return match expr {
                Expression::Identifier { name, .. } => {
                    Ok(Expression::Assign { name, value: Box::new(value), line })
                }
                _ => Err(LangError::parser(
                    "Assignment target must be a plain identifier",
                    target_position,
                )),
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expression> {
        let mut expr = self.logical_and()?;
        while self.check(&TokenKind::OrOr) {
            let line = self.peek().line;
            self.advance();
            let right = self.logical_and()?;
            expr = Expression::Binary {
                operator: BinaryOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                line,
            };
        }
        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expression> {
        let mut expr = self.equality()?;
        while self.check(&TokenKind::AndAnd) {
            let line = self.peek().line;
            self.advance();
            let right = self.equality()?;
            expr = Expression::Binary {
                operator: BinaryOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                line,
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expression> {
        let mut expr = self.comparison()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::BangEqual => BinaryOp::NotEq,
                _ => break,
            };
            let line = self.peek().line;
            self.advance();
            let right = self.comparison()?;
            expr = Expression::Binary { operator, left: Box::new(expr), right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expression> {
        let mut expr = self.additive()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::LessEqual => BinaryOp::Le,
                TokenKind::GreaterEqual => BinaryOp::Ge,
                _ => break,
            };
            let line = self.peek().line;
            self.advance();
            let right = self.additive()?;
            expr = Expression::Binary { operator, left: Box::new(expr), right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expression> {
        let mut expr = self.multiplicative()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let line = self.peek().line;
            self.advance();
            let right = self.multiplicative()?;
            expr = Expression::Binary { operator, left: Box::new(expr), right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expression> {
        let mut expr = self.unary()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let line = self.peek().line;
            self.advance();
            let right = self.unary()?;
            expr = Expression::Binary { operator, left: Box::new(expr), right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expression> {
        let operator = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.call(),
        };
        let line = self.peek().line;
        self.advance();
        let operand = self.unary()?;
        Ok(Expression::Unary { operator, operand: Box::new(operand), line })
    }

    fn call(&mut self) -> Result<Expression> {
        let line = self.peek().line;
        let primary_position = self.peek().position();
        let primary = self.primary()?;

        if self.check(&TokenKind::LParen) {
            let callee = match primary {
                Expression::Identifier { name, .. } => name,
                _ => {
                    return Err(LangError::parser(
                        "Only a plain function name can be called",
                        primary_position,
                    ))
                }
            };
            self.advance(); // '('
            let mut arguments = Vec::new();
            if !self.check(&TokenKind::RParen) {
                arguments.push(self.expression()?);
                while self.match_kind(&TokenKind::Comma) {
                    arguments.push(self.expression()?);
                }
            }
            self.expect_kind(&TokenKind::RParen, "')' after arguments")?;

            if self.check(&TokenKind::LParen) {
                return Err(LangError::parser(
                    "Calling the result of a call is not supported",
                    self.peek().position(),
                ));
            }

            return Ok(Expression::Call { callee, arguments, line });
        }

        Ok(primary)
    }

    fn primary(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        let line = token.line;
        match token.kind {
            TokenKind::True => {
                self.advance();
                Ok(Expression::Literal { value: LiteralValue::Bool(true), line })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Literal { value: LiteralValue::Bool(false), line })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::Literal { value: LiteralValue::Unit, line })
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expression::Literal { value: LiteralValue::Number(n), line })
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expression::Literal { value: LiteralValue::Str(s), line })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier { name, line })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect_kind(&TokenKind::RParen, "')' to close grouping")?;
                Ok(Expression::Grouping { expr: Box::new(expr), line })
            }
            other => Err(LangError::parser(
                format!("Unexpected token {}", describe(&other)),
                token.position(),
            )),
        }
    }

    // ---- token stream helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_kind(&mut self, kind: &TokenKind, what: &str) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek().clone();
            Err(LangError::parser(
                format!("Expected {}, found {}", what, describe(&token.kind)),
                token.position(),
            ))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        let token = self.peek().clone();
        if let TokenKind::Identifier(name) = token.kind {
            self.advance();
            Ok(name)
        } else {
            Err(LangError::parser(
                format!("Expected {}, found {}", what, describe(&token.kind)),
                token.position(),
            ))
        }
    }

    fn position_at(&self, line: usize) -> Position {
        Position::new(line, self.peek().column)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(name) => format!("identifier '{}'", name),
        TokenKind::Number(n) => format!("number '{}'", n),
        TokenKind::Str(s) => format!("string \"{}\"", s),
        TokenKind::Eof => "end of input".to_string(),
        other => format!("'{:?}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Result<Program> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse()
    }

    #[test]
    fn missing_start_keyword_is_a_parser_error() {
        let err = parse("maan lo x = 1\npaisa vasool").unwrap_err();
        assert!(matches!(err, LangError::Parser { .. }));
    }

    #[test]
    fn missing_end_keyword_is_a_parser_error() {
        let err = parse("action!\nmaan lo x = 1").unwrap_err();
        assert!(matches!(err, LangError::Parser { .. }));
    }

    #[test]
    fn assignment_target_must_be_identifier() {
        let err = parse("action!\nek baat bataun: (1 + 2) = 3\npaisa vasool").unwrap_err();
        assert!(matches!(err, LangError::Parser { .. }));
    }

    #[test]
    fn precedence_binds_multiplication_tighter_than_addition() {
        let program = parse("action!\nek baat bataun: 1 + 2 * 3\npaisa vasool").unwrap();
        match &program.statements[0] {
            Statement::Print { arguments, .. } => match &arguments[0] {
                Expression::Binary { operator: BinaryOp::Add, right, .. } => {
                    assert!(matches!(**right, Expression::Binary { operator: BinaryOp::Mul, .. }));
                }
                other => panic!("expected addition at the top, got {:?}", other),
            },
            other => panic!("expected print statement, got {:?}", other),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse("action!\nmaan lo a = 0\nmaan lo b = 0\na = b = 5\npaisa vasool").unwrap();
        match &program.statements[2] {
            Statement::ExprStmt { expr: Expression::Assign { name, value, .. }, .. } => {
                assert_eq!(name, "a");
                assert!(matches!(**value, Expression::Assign { .. }));
            }
            other => panic!("expected nested assignment, got {:?}", other),
        }
    }

    #[test]
    fn if_elseif_else_chain_parses() {
        let program = parse(
            "action!\nagar kismat rahi (sach) { ek baat bataun: 1 } nahi to (galat) { ek baat bataun: 2 } warna { ek baat bataun: 3 }\npaisa vasool",
        )
        .unwrap();
        match &program.statements[0] {
            Statement::If { conditions, consequents, alternate, .. } => {
                assert_eq!(conditions.len(), 2);
                assert_eq!(consequents.len(), 2);
                assert!(alternate.is_some());
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }
}
