//! Function-call parameter extraction.

use crate::config::FilterConfig;
use crate::expression::{ExpressionNode, FilterError, FilterResult, Literal};
use crate::filter::date::parse_date_millis;
use crate::filter::evaluator::{calendar_unit_millis, evaluate_arithmetic};
use log::trace;

/// Reduces a function call's arguments to literal values.
///
/// String arguments are read as dates when they match one of the configured
/// formats and kept verbatim otherwise.
pub struct FunctionParameterExtractor<'a> {
    config: &'a FilterConfig,
}

impl<'a> FunctionParameterExtractor<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self { config }
    }

    /// Extract the parameters of a function-call node
    pub fn extract(&self, node: &ExpressionNode) -> FilterResult<Vec<Literal>> {
        match node {
            ExpressionNode::Function { args, .. } => self.extract_args(args),
            other => Err(FilterError::unsupported(format!(
                "expected a function call, found {}",
                other.describe()
            ))),
        }
    }

    pub fn extract_args(&self, args: &[ExpressionNode]) -> FilterResult<Vec<Literal>> {
        args.iter().map(|arg| self.parameter(arg)).collect()
    }

    fn parameter(&self, node: &ExpressionNode) -> FilterResult<Literal> {
        match node {
            ExpressionNode::String(text) => {
                match parse_date_millis(text, &self.config.date_formats) {
                    Some(millis) => Ok(Literal::Long(millis)),
                    None => {
                        trace!("keeping function parameter '{}' as a string", text);
                        Ok(Literal::String(text.clone()))
                    }
                }
            }

            ExpressionNode::Long(_)
            | ExpressionNode::Double(_)
            | ExpressionNode::Date(_)
            | ExpressionNode::Time(_)
            | ExpressionNode::Timestamp(_)
            | ExpressionNode::Null => node.as_literal().ok_or_else(|| {
                FilterError::unsupported(format!("{} has no literal value", node.describe()))
            }),

            ExpressionNode::Column(col) => Ok(Literal::String(col.qualified_name())),

            ExpressionNode::Function { name, .. } if calendar_unit_millis(name).is_some() => {
                Ok(Literal::Long(evaluate_arithmetic(node, self.config)?))
            }

            ExpressionNode::Function { .. } => Ok(Literal::String(node.to_string())),

            ExpressionNode::BinaryOp { op, .. } if op.is_arithmetic() => {
                Ok(Literal::Long(evaluate_arithmetic(node, self.config)?))
            }

            other => Err(FilterError::unsupported(format!(
                "{} is not supported as a function parameter",
                other.describe()
            ))),
        }
    }
}
