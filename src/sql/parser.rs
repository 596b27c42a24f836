// Filter expression parser - converts tokens to an expression tree

use super::lexer::Lexer;
use super::token::Token;
use crate::expression::{BinaryOperator, ColumnRef, ComparisonOp, ExpressionNode, InItems};
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(text: String) -> Self {
        let mut lexer = Lexer::new(text);
        let tokens = lexer.tokenize();
        Parser {
            tokens,
            position: 0,
        }
    }

    /// Parse a complete filter expression
    pub fn parse(&mut self) -> Result<ExpressionNode> {
        if self.match_token(&Token::Eof) {
            bail!("Empty filter expression");
        }
        if let Some(Token::Unterminated(quote)) = self
            .tokens
            .iter()
            .find(|token| matches!(token, Token::Unterminated(_)))
        {
            if *quote == '\'' {
                bail!("Unterminated string literal");
            }
            bail!("Unterminated quoted identifier: missing closing {}", quote);
        }
        let expr = self.parse_expression()?;
        if !self.match_token(&Token::Eof) {
            bail!("Unexpected token after expression: {}", self.current_token());
        }
        Ok(expr)
    }

    /// Parse expression
    fn parse_expression(&mut self) -> Result<ExpressionNode> {
        self.parse_or()
    }

    /// Parse OR expression
    fn parse_or(&mut self) -> Result<ExpressionNode> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = ExpressionNode::or(left, right);
        }

        Ok(left)
    }

    /// Parse AND expression
    fn parse_and(&mut self) -> Result<ExpressionNode> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = ExpressionNode::and(left, right);
        }

        Ok(left)
    }

    /// Parse NOT expression
    fn parse_not(&mut self) -> Result<ExpressionNode> {
        if self.match_token(&Token::Not) {
            self.advance();
            let operand = self.parse_not()?;
            Ok(ExpressionNode::not_expr(operand))
        } else {
            self.parse_comparison()
        }
    }

    /// Parse comparison expression
    fn parse_comparison(&mut self) -> Result<ExpressionNode> {
        let left = self.parse_bitwise()?;

        if self.match_token(&Token::Is) {
            self.advance();
            let negated = self.consume(&Token::Not);
            self.expect_token(Token::Null)?;
            return Ok(ExpressionNode::IsNull {
                expr: Box::new(left),
                negated,
            });
        }

        // NOT only binds here when it prefixes IN, BETWEEN or LIKE
        let negated = self.match_token(&Token::Not)
            && matches!(self.peek_token(), Token::In | Token::Between | Token::Like);
        if negated {
            self.advance();
        }

        if self.match_token(&Token::In) {
            self.advance();
            self.expect_token(Token::LeftParen)?;
            let items = if self.match_token(&Token::Select) {
                InItems::SubSelect(self.capture_subquery()?)
            } else {
                InItems::List(self.parse_expression_list()?)
            };
            self.expect_token(Token::RightParen)?;
            return Ok(ExpressionNode::InList {
                expr: Box::new(left),
                items,
                negated,
            });
        }

        if self.match_token(&Token::Between) {
            self.advance();
            let low = self.parse_bitwise()?;
            self.expect_token(Token::And)?;
            let high = self.parse_bitwise()?;
            return Ok(ExpressionNode::Between {
                expr: Box::new(left),
                low: Box::new(low),
                high: Box::new(high),
                negated,
            });
        }

        if self.match_token(&Token::Like) {
            self.advance();
            let pattern = self.parse_bitwise()?;
            return Ok(ExpressionNode::Like {
                expr: Box::new(left),
                pattern: Box::new(pattern),
                negated,
            });
        }

        let op = match self.current_token() {
            Token::Equal => Some(ComparisonOp::Eq),
            Token::NotEqual => Some(ComparisonOp::Ne),
            Token::Less => Some(ComparisonOp::Lt),
            Token::Greater => Some(ComparisonOp::Gt),
            Token::LessEqual => Some(ComparisonOp::Le),
            Token::GreaterEqual => Some(ComparisonOp::Ge),
            Token::Tilde => {
                self.advance();
                let right = self.parse_bitwise()?;
                return Ok(ExpressionNode::binary_op(
                    BinaryOperator::RegexMatch,
                    left,
                    right,
                ));
            }
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let right = self.parse_bitwise()?;
            Ok(ExpressionNode::compare(op, left, right))
        } else {
            Ok(left)
        }
    }

    /// Parse bitwise &, |, ^ expression
    fn parse_bitwise(&mut self) -> Result<ExpressionNode> {
        let mut left = self.parse_addition()?;

        loop {
            let op = match self.current_token() {
                Token::Ampersand => BinaryOperator::BitwiseAnd,
                Token::Pipe => BinaryOperator::BitwiseOr,
                Token::Caret => BinaryOperator::BitwiseXor,
                _ => break,
            };
            self.advance();
            let right = self.parse_addition()?;
            left = ExpressionNode::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse addition/subtraction/concatenation expression
    fn parse_addition(&mut self) -> Result<ExpressionNode> {
        let mut left = self.parse_multiplication()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                Token::Concat => BinaryOperator::Concat,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplication()?;
            left = ExpressionNode::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse multiplication/division expression
    fn parse_multiplication(&mut self) -> Result<ExpressionNode> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::Div => BinaryOperator::IntegerDiv,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = ExpressionNode::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse unary expression; a sign in front of a number is folded into it
    fn parse_unary(&mut self) -> Result<ExpressionNode> {
        match self.current_token() {
            Token::Plus => {
                self.advance();
                self.parse_unary()
            }
            Token::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(match operand {
                    ExpressionNode::Long(v) => ExpressionNode::Long(-v),
                    ExpressionNode::Double(v) => ExpressionNode::Double(-v),
                    other => ExpressionNode::Negative(Box::new(other)),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    /// Parse JSON access chains (`doc -> 'key'`)
    fn parse_postfix(&mut self) -> Result<ExpressionNode> {
        let mut left = self.parse_primary()?;

        while self.match_token(&Token::Arrow) {
            self.advance();
            let right = self.parse_primary()?;
            left = ExpressionNode::binary_op(BinaryOperator::JsonAccess, left, right);
        }

        Ok(left)
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<ExpressionNode> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                parse_number(&n)
            }
            Token::String(s) => {
                self.advance();
                Ok(ExpressionNode::String(s))
            }
            Token::True => {
                self.advance();
                Ok(ExpressionNode::Boolean(true))
            }
            Token::False => {
                self.advance();
                Ok(ExpressionNode::Boolean(false))
            }
            Token::Null => {
                self.advance();
                Ok(ExpressionNode::Null)
            }
            token @ (Token::Date | Token::Time | Token::Timestamp) => {
                self.advance();
                match self.current_token() {
                    Token::String(text) => {
                        self.advance();
                        parse_typed_literal(&token, &text)
                    }
                    // DATE(...) or a column that happens to be called `date`
                    _ => self.parse_identifier(token.to_string().to_lowercase()),
                }
            }
            Token::Identifier(name) => {
                self.advance();
                self.parse_identifier(name)
            }
            Token::LeftParen => {
                self.advance();

                if self.match_token(&Token::Select) {
                    let subquery = self.capture_subquery()?;
                    self.expect_token(Token::RightParen)?;
                    Ok(ExpressionNode::SubSelect(subquery))
                } else {
                    let expr = self.parse_expression()?;
                    self.expect_token(Token::RightParen)?;
                    Ok(ExpressionNode::Parenthesis(Box::new(expr)))
                }
            }
            Token::Exists => {
                self.advance();
                self.expect_token(Token::LeftParen)?;
                let subquery = self.capture_subquery()?;
                self.expect_token(Token::RightParen)?;
                Ok(ExpressionNode::Exists {
                    subquery,
                    negated: false,
                })
            }
            Token::Case => self.parse_case_expression(),
            Token::Cast => self.parse_cast_expression(),
            _ => bail!("Unexpected token: {}", self.current_token()),
        }
    }

    /// Parse what follows an identifier: a qualified column, a function call
    /// or a plain column
    fn parse_identifier(&mut self, name: String) -> Result<ExpressionNode> {
        if self.match_token(&Token::Dot) {
            self.advance();
            let column = self.expect_identifier()?;
            Ok(ExpressionNode::Column(ColumnRef::qualified(name, column)))
        } else if self.match_token(&Token::LeftParen) {
            self.advance();
            let args = if self.match_token(&Token::RightParen) {
                vec![]
            } else {
                self.parse_expression_list()?
            };
            self.expect_token(Token::RightParen)?;
            Ok(ExpressionNode::function(name, args))
        } else {
            Ok(ExpressionNode::Column(ColumnRef::new(name)))
        }
    }

    /// Parse CASE expression
    fn parse_case_expression(&mut self) -> Result<ExpressionNode> {
        self.expect_token(Token::Case)?;

        let operand = if !self.match_token(&Token::When) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        let mut when_clauses = vec![];

        while self.match_token(&Token::When) {
            self.advance();
            let condition = self.parse_expression()?;
            self.expect_token(Token::Then)?;
            let result = self.parse_expression()?;
            when_clauses.push((condition, result));
        }

        if when_clauses.is_empty() {
            bail!("CASE requires at least one WHEN clause");
        }

        let else_clause = if self.consume(&Token::Else) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect_token(Token::End)?;

        Ok(ExpressionNode::Case {
            operand,
            when_clauses,
            else_clause,
        })
    }

    /// Parse CAST expression
    fn parse_cast_expression(&mut self) -> Result<ExpressionNode> {
        self.expect_token(Token::Cast)?;
        self.expect_token(Token::LeftParen)?;

        let expr = self.parse_expression()?;

        self.expect_token(Token::As)?;

        let mut data_type = match self.current_token() {
            Token::Identifier(name) => name.to_uppercase(),
            token @ (Token::Date | Token::Time | Token::Timestamp) => token.to_string(),
            other => bail!("Expected data type, found {}", other),
        };
        self.advance();

        // Length or precision, e.g. VARCHAR(20) or DECIMAL(10, 2)
        if self.consume(&Token::LeftParen) {
            let mut params = vec![self.expect_number()?];
            while self.consume(&Token::Comma) {
                params.push(self.expect_number()?);
            }
            self.expect_token(Token::RightParen)?;
            data_type = format!("{}({})", data_type, params.join(", "));
        }

        self.expect_token(Token::RightParen)?;

        Ok(ExpressionNode::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    /// Parse list of expressions
    fn parse_expression_list(&mut self) -> Result<Vec<ExpressionNode>> {
        let mut expressions = vec![];

        loop {
            expressions.push(self.parse_expression()?);
            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(expressions)
    }

    /// Collect the text of a sub-select up to (not including) its closing
    /// parenthesis. The sub-select is kept as text only.
    fn capture_subquery(&mut self) -> Result<String> {
        let mut parts = Vec::new();
        let mut depth = 0usize;

        loop {
            match self.current_token() {
                Token::Eof => bail!("Unterminated sub-select"),
                Token::RightParen if depth == 0 => break,
                token => {
                    match token {
                        Token::LeftParen => depth += 1,
                        Token::RightParen => depth -= 1,
                        _ => {}
                    }
                    parts.push(token.to_string());
                    self.advance();
                }
            }
        }

        Ok(parts.join(" "))
    }

    // Helper methods

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Get the token after the current one
    fn peek_token(&self) -> Token {
        self.tokens
            .get(self.position + 1)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    /// Advance past `token` if it is current
    fn consume(&mut self, token: &Token) -> bool {
        if self.match_token(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> Result<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            bail!("Expected {}, found {}", token, self.current_token())
        }
    }

    /// Expect an identifier
    fn expect_identifier(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => bail!("Expected identifier, found {}", other),
        }
    }

    /// Expect a number
    fn expect_number(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                Ok(n)
            }
            other => bail!("Expected number, found {}", other),
        }
    }
}

/// Integral numbers become `Long`; decimals and integers too large for
/// `i64` become `Double`
fn parse_number(text: &str) -> Result<ExpressionNode> {
    if !text.contains('.') {
        if let Ok(v) = text.parse::<i64>() {
            return Ok(ExpressionNode::Long(v));
        }
    }
    match text.parse::<f64>() {
        Ok(v) => Ok(ExpressionNode::Double(v)),
        Err(_) => bail!("Invalid number: {}", text),
    }
}

/// Parse the string following a DATE, TIME or TIMESTAMP keyword
fn parse_typed_literal(keyword: &Token, text: &str) -> Result<ExpressionNode> {
    let node = match keyword {
        Token::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").map(ExpressionNode::Date),
        Token::Time => NaiveTime::parse_from_str(text, "%H:%M:%S%.f").map(ExpressionNode::Time),
        _ => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
            .map(ExpressionNode::Timestamp),
    };
    node.with_context(|| format!("Invalid {} literal '{}'", keyword, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ExpressionNode> {
        Parser::new(text.to_string()).parse()
    }

    #[test]
    fn test_parse_comparison() -> Result<()> {
        assert_eq!(
            parse("qty >= 10")?,
            ExpressionNode::ge(ExpressionNode::column("qty"), ExpressionNode::Long(10))
        );
        assert_eq!(
            parse("t.name != 'x'")?,
            ExpressionNode::ne(
                ExpressionNode::qualified_column("t", "name"),
                ExpressionNode::string("x")
            )
        );
        Ok(())
    }

    #[test]
    fn test_and_or_are_left_deep() -> Result<()> {
        let expr = parse("a = 1 OR b = 2 AND c = 3 OR d = 4")?;
        let expected = ExpressionNode::or(
            ExpressionNode::or(
                ExpressionNode::eq(ExpressionNode::column("a"), ExpressionNode::Long(1)),
                ExpressionNode::and(
                    ExpressionNode::eq(ExpressionNode::column("b"), ExpressionNode::Long(2)),
                    ExpressionNode::eq(ExpressionNode::column("c"), ExpressionNode::Long(3)),
                ),
            ),
            ExpressionNode::eq(ExpressionNode::column("d"), ExpressionNode::Long(4)),
        );
        assert_eq!(expr, expected);
        Ok(())
    }

    #[test]
    fn test_parse_negated_forms() -> Result<()> {
        assert!(matches!(
            parse("a NOT BETWEEN 1 AND 5")?,
            ExpressionNode::Between { negated: true, .. }
        ));
        assert!(matches!(
            parse("a NOT IN (1, 2)")?,
            ExpressionNode::InList { negated: true, .. }
        ));
        assert!(matches!(
            parse("a NOT LIKE 'x%'")?,
            ExpressionNode::Like { negated: true, .. }
        ));
        assert!(matches!(
            parse("a IS NOT NULL")?,
            ExpressionNode::IsNull { negated: true, .. }
        ));
        assert!(matches!(parse("NOT a = 1")?, ExpressionNode::Not(_)));
        Ok(())
    }

    #[test]
    fn test_parse_between_bounds() -> Result<()> {
        match parse("col BETWEEN 1 AND 10 AND x = 2")? {
            ExpressionNode::And(left, _) => match *left {
                ExpressionNode::Between { low, high, .. } => {
                    assert_eq!(*low, ExpressionNode::Long(1));
                    assert_eq!(*high, ExpressionNode::Long(10));
                }
                other => panic!("Expected BETWEEN, got {:?}", other),
            },
            other => panic!("Expected AND, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_parse_arithmetic_and_functions() -> Result<()> {
        let expr = parse("created > '2020-01-01' - days(2) + 3600000")?;
        let expected = ExpressionNode::gt(
            ExpressionNode::column("created"),
            ExpressionNode::add(
                ExpressionNode::sub(
                    ExpressionNode::string("2020-01-01"),
                    ExpressionNode::function("days", vec![ExpressionNode::Long(2)]),
                ),
                ExpressionNode::Long(3_600_000),
            ),
        );
        assert_eq!(expr, expected);

        assert_eq!(
            parse("a = 10 DIV 3")?,
            ExpressionNode::eq(
                ExpressionNode::column("a"),
                ExpressionNode::binary_op(
                    BinaryOperator::IntegerDiv,
                    ExpressionNode::Long(10),
                    ExpressionNode::Long(3)
                )
            )
        );
        Ok(())
    }

    #[test]
    fn test_parse_numbers_and_signs() -> Result<()> {
        assert_eq!(
            parse("a > -5")?,
            ExpressionNode::gt(ExpressionNode::column("a"), ExpressionNode::Long(-5))
        );
        assert_eq!(
            parse("a < 2.5")?,
            ExpressionNode::lt(ExpressionNode::column("a"), ExpressionNode::Double(2.5))
        );
        assert!(matches!(
            parse("a = -b")?,
            ExpressionNode::Comparison { right, .. } if matches!(*right, ExpressionNode::Negative(_))
        ));
        Ok(())
    }

    #[test]
    fn test_parse_typed_literals() -> Result<()> {
        assert_eq!(
            parse("d = DATE '2021-03-04'")?,
            ExpressionNode::eq(
                ExpressionNode::column("d"),
                ExpressionNode::Date(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap())
            )
        );
        assert!(matches!(
            parse("t < TIME '12:30:00'")?,
            ExpressionNode::Comparison { right, .. } if matches!(*right, ExpressionNode::Time(_))
        ));
        assert!(matches!(
            parse("ts >= TIMESTAMP '2021-03-04 05:06:07.250'")?,
            ExpressionNode::Comparison { right, .. } if matches!(*right, ExpressionNode::Timestamp(_))
        ));
        assert!(parse("d = DATE 'yesterday'").is_err());

        // A column named `date` still parses as a column
        assert_eq!(
            parse("date IS NULL")?,
            ExpressionNode::is_null(ExpressionNode::column("date"))
        );
        Ok(())
    }

    #[test]
    fn test_parse_sub_selects() -> Result<()> {
        assert_eq!(
            parse("col = (SELECT max(id) FROM t)")?,
            ExpressionNode::eq(
                ExpressionNode::column("col"),
                ExpressionNode::SubSelect("SELECT max ( id ) FROM t".to_string())
            )
        );
        assert!(matches!(
            parse("id IN (SELECT id FROM t)")?,
            ExpressionNode::InList {
                items: InItems::SubSelect(_),
                ..
            }
        ));
        assert!(matches!(
            parse("EXISTS (SELECT 1 FROM t)")?,
            ExpressionNode::Exists { .. }
        ));
        assert!(parse("id IN (SELECT id FROM t").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_unsupported_constructs() -> Result<()> {
        assert!(matches!(
            parse("(a = 1 OR b = 2)")?,
            ExpressionNode::Parenthesis(_)
        ));
        assert!(matches!(
            parse("CASE WHEN a = 1 THEN 2 ELSE 3 END = 2")?,
            ExpressionNode::Comparison { left, .. } if matches!(*left, ExpressionNode::Case { .. })
        ));
        assert!(matches!(
            parse("CAST(a AS VARCHAR(10)) = 'x'")?,
            ExpressionNode::Comparison { left, .. }
                if matches!(&*left, ExpressionNode::Cast { data_type, .. } if data_type == "VARCHAR(10)")
        ));
        for (text, op) in [
            ("a || b = 'x'", BinaryOperator::Concat),
            ("a & 1 = 1", BinaryOperator::BitwiseAnd),
            ("a ~ 'x'", BinaryOperator::RegexMatch),
            ("doc -> 'k' = 1", BinaryOperator::JsonAccess),
        ] {
            let expr = parse(text)?;
            let found = match &expr {
                ExpressionNode::BinaryOp { op, .. } => Some(*op),
                ExpressionNode::Comparison { left, .. } => match left.as_ref() {
                    ExpressionNode::BinaryOp { op, .. } => Some(*op),
                    _ => None,
                },
                _ => None,
            };
            assert_eq!(found, Some(op), "{}", text);
        }
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("a = ").is_err());
        assert!(parse("a = 1 b").is_err());
        assert!(parse("a ? 1").is_err());
        assert!(parse("a BETWEEN 1 OR 2").is_err());

        let err = parse("dept = 'eng AND id = 1").unwrap_err();
        assert!(err.to_string().contains("Unterminated string literal"));
        assert!(parse("\"order date = 1").is_err());
        assert!(parse("a = 'x''").is_err());
    }
}
