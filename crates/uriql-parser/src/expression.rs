//! Filter and orderby expression parser
//!
//! Recursive descent with precedence climbing over the clause lexer. The
//! parser can run standalone over a whole `$filter`/`$orderby` clause or
//! embedded inside an expand term's option list, sharing the enclosing
//! lexer; in the embedded case it stops at the first token that cannot
//! continue an expression (`;` or `)`), leaving that token current.

use rust_decimal::Decimal;
use std::str::FromStr;
use uriql_ast::{
    BinaryOp, Expression, Literal, OrderByToken, PropertyPath, SortDirection, TokenKind, UnaryOp,
};
use uriql_diagnostics::{
    Result, UriqlError, UQL0004, UQL0101, UQL0105, UQL0109, UQL0110,
};

use crate::lexer::ExpressionLexer;

/// Parser for `$filter`/`$orderby` expressions
#[derive(Debug)]
pub struct ExpressionParser<'l> {
    lexer: &'l mut ExpressionLexer,
    max_depth: usize,
    depth: usize,
}

/// Parse a complete `$filter` clause
pub fn parse_filter_clause(text: &str, max_depth: usize) -> Result<Expression> {
    let mut lexer = ExpressionLexer::new(text, true, false)?;
    let expr = ExpressionParser::new(&mut lexer, max_depth).parse_expression()?;
    expect_end(&lexer)?;
    Ok(expr)
}

/// Parse a complete `$orderby` clause
pub fn parse_order_by_clause(text: &str, max_depth: usize) -> Result<Vec<OrderByToken>> {
    let mut lexer = ExpressionLexer::new(text, true, false)?;
    let items = ExpressionParser::new(&mut lexer, max_depth).parse_order_by()?;
    expect_end(&lexer)?;
    Ok(items)
}

fn expect_end(lexer: &ExpressionLexer) -> Result<()> {
    let current = lexer.current_token();
    if !current.is_end() {
        return Err(UriqlError::syntax_at(
            UQL0110,
            format!("Expected end of clause, found {current}"),
            lexer.text(),
            current.position(),
        ));
    }
    Ok(())
}

impl<'l> ExpressionParser<'l> {
    /// Create a parser over an already-positioned lexer
    pub fn new(lexer: &'l mut ExpressionLexer, max_depth: usize) -> Self {
        Self {
            lexer,
            max_depth,
            depth: 0,
        }
    }

    /// Parse one expression; on return the current token is the first token
    /// past it
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or()
    }

    /// Parse a comma-separated orderby list
    pub fn parse_order_by(&mut self) -> Result<Vec<OrderByToken>> {
        let mut items = Vec::new();
        loop {
            let expression = self.parse_expression()?;
            let mut direction = SortDirection::default();
            let current = self.lexer.current_token();
            if current.is_identifier("asc") {
                self.lexer.next_token()?;
            } else if current.is_identifier("desc") {
                direction = SortDirection::Descending;
                self.lexer.next_token()?;
            }
            items.push(OrderByToken::new(expression, direction));

            if self.lexer.current_token().kind == TokenKind::Comma {
                self.lexer.next_token()?;
            } else {
                break;
            }
        }
        Ok(items)
    }

    fn recurse_enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(UriqlError::syntax(
                UQL0101,
                format!("Recursion limit of {} exceeded", self.max_depth),
                self.lexer.text(),
            ));
        }
        Ok(())
    }

    fn recurse_leave(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;
        while self.lexer.current_token().is_identifier("or") {
            self.lexer.next_token()?;
            let right = self.parse_and()?;
            left = Expression::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_comparison()?;
        while self.lexer.current_token().is_identifier("and") {
            self.lexer.next_token()?;
            let right = self.parse_comparison()?;
            left = Expression::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.current_operator(BinaryOp::is_comparison) {
            self.lexer.next_token()?;
            let right = self.parse_additive()?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) =
            self.current_operator(|op| matches!(op, BinaryOp::Add | BinaryOp::Sub))
        {
            self.lexer.next_token()?;
            let right = self.parse_multiplicative()?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;
        while let Some(op) =
            self.current_operator(|op| matches!(op, BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod))
        {
            self.lexer.next_token()?;
            let right = self.parse_unary()?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    /// The binary operator the current token spells, when `accept` admits it
    fn current_operator(&self, accept: impl Fn(&BinaryOp) -> bool) -> Option<BinaryOp> {
        let current = self.lexer.current_token();
        if current.kind != TokenKind::Identifier {
            return None;
        }
        BinaryOp::from_keyword(&current.text).filter(accept)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let current = self.lexer.current_token();
        if current.is_identifier("not") {
            self.recurse_enter()?;
            self.lexer.next_token()?;
            let operand = self.parse_unary()?;
            self.recurse_leave();
            return Ok(Expression::unary(UnaryOp::Not, operand));
        }
        if current.kind == TokenKind::Minus {
            self.recurse_enter()?;
            self.lexer.next_token()?;
            let operand = self.parse_unary()?;
            self.recurse_leave();
            return Ok(Expression::unary(UnaryOp::Negate, operand));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let current = self.lexer.current_token().clone();
        match current.kind {
            TokenKind::IntegerLiteral => {
                let value = i64::from_str(&current.text).map_err(|_| {
                    UriqlError::lexical(
                        UQL0004,
                        format!("Integer literal '{}' out of range", current.text),
                        self.lexer.text(),
                        current.position(),
                    )
                })?;
                self.lexer.next_token()?;
                Ok(Expression::Literal(Literal::Integer(value)))
            }
            TokenKind::DecimalLiteral => {
                let value = Decimal::from_str(&current.text).map_err(|_| {
                    UriqlError::lexical(
                        UQL0004,
                        format!("Decimal literal '{}' out of range", current.text),
                        self.lexer.text(),
                        current.position(),
                    )
                })?;
                self.lexer.next_token()?;
                Ok(Expression::Literal(Literal::Decimal(value)))
            }
            TokenKind::StringLiteral => {
                self.lexer.next_token()?;
                Ok(Expression::Literal(Literal::String(current.text)))
            }
            TokenKind::OpenParen => {
                self.recurse_enter()?;
                self.lexer.next_token()?;
                let expr = self.parse_expression()?;
                self.expect_close_paren()?;
                self.recurse_leave();
                Ok(expr)
            }
            TokenKind::Identifier => match current.text.as_str() {
                "true" => {
                    self.lexer.next_token()?;
                    Ok(Expression::Literal(Literal::Boolean(true)))
                }
                "false" => {
                    self.lexer.next_token()?;
                    Ok(Expression::Literal(Literal::Boolean(false)))
                }
                "null" => {
                    self.lexer.next_token()?;
                    Ok(Expression::Literal(Literal::Null))
                }
                _ => self.parse_identifier_expression(),
            },
            _ => Err(UriqlError::syntax_at(
                UQL0109,
                format!("Expected expression, found {current}"),
                self.lexer.text(),
                current.position(),
            )),
        }
    }

    /// Function call or property path, both starting with a (possibly
    /// dotted) identifier
    fn parse_identifier_expression(&mut self) -> Result<Expression> {
        let name = self.lexer.read_dotted_identifier(false)?;
        self.lexer.next_token()?;

        if self.lexer.current_token().kind == TokenKind::OpenParen {
            return self.parse_function_call(name);
        }

        let mut segments = vec![name];
        while self.lexer.current_token().kind == TokenKind::Slash {
            self.lexer.next_token()?;
            segments.push(self.lexer.read_dotted_identifier(false)?);
            self.lexer.next_token()?;
        }
        Ok(Expression::Property(PropertyPath::new(segments)))
    }

    fn parse_function_call(&mut self, name: String) -> Result<Expression> {
        self.recurse_enter()?;
        self.lexer.next_token()?; // past '('
        let mut args = Vec::new();
        if self.lexer.current_token().kind != TokenKind::CloseParen {
            loop {
                args.push(self.parse_expression()?);
                if self.lexer.current_token().kind == TokenKind::Comma {
                    self.lexer.next_token()?;
                } else {
                    break;
                }
            }
        }
        self.expect_close_paren()?;
        self.recurse_leave();
        Ok(Expression::FunctionCall(uriql_ast::FunctionCallExpr {
            name,
            args,
        }))
    }

    fn expect_close_paren(&mut self) -> Result<()> {
        let current = self.lexer.current_token();
        if current.kind != TokenKind::CloseParen {
            return Err(UriqlError::syntax_at(
                UQL0105,
                format!("Expected ')', found {current}"),
                self.lexer.text(),
                current.position(),
            ));
        }
        self.lexer.next_token()?;
        Ok(())
    }
}
