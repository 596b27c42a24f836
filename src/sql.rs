// SQL module - filter expression text to expression tree

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use token::*;

use crate::expression::ExpressionNode;
use anyhow::Result;

/// Parse filter text such as `qty > 5 AND name LIKE 'A%'`
pub fn parse_expression(text: &str) -> Result<ExpressionNode> {
    Parser::new(text.to_string()).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expression() -> Result<()> {
        let expr = parse_expression("a IS NULL")?;
        assert_eq!(expr, ExpressionNode::is_null(ExpressionNode::column("a")));
        Ok(())
    }
}
