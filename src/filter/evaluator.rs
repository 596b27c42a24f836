//! Arithmetic evaluation of object operands.
//!
//! Arithmetic trees are reduced with a postfix stack: operands are pushed in
//! source order and each operator pops the last two values, so `a - b` pops
//! `b` first and computes `a - b`. Calendar-unit calls (`days(2)`,
//! `hours(1)`, ...) set a pending multiplier that scales the next integer
//! literal into milliseconds. String and date literals evaluate to epoch
//! milliseconds.

use crate::config::FilterConfig;
use crate::expression::literal::{date_millis, time_millis, timestamp_millis};
use crate::expression::{BinaryOperator, ExpressionNode, FilterError, FilterResult};
use crate::filter::date::parse_date_millis;
use log::trace;

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Milliseconds per unit for calendar-unit function names
pub fn calendar_unit_millis(name: &str) -> Option<i64> {
    match name.to_ascii_lowercase().as_str() {
        "day" | "days" => Some(MILLIS_PER_DAY),
        "hour" | "hours" => Some(MILLIS_PER_HOUR),
        "minute" | "minutes" => Some(MILLIS_PER_MINUTE),
        "second" | "seconds" => Some(MILLIS_PER_SECOND),
        _ => None,
    }
}

/// Stack evaluator reducing an arithmetic tree to a single long
pub struct ArithmeticEvaluator<'a> {
    config: &'a FilterConfig,
    stack: Vec<i64>,
    /// Applied to the next integer literal, then reset to 1
    multiplier: i64,
}

impl<'a> ArithmeticEvaluator<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self {
            config,
            stack: Vec::new(),
            multiplier: 1,
        }
    }

    /// Evaluate an arithmetic tree
    pub fn evaluate(mut self, node: &ExpressionNode) -> FilterResult<i64> {
        self.visit(node)?;
        match (self.stack.pop(), self.stack.is_empty()) {
            (Some(value), true) => {
                trace!("evaluated '{}' to {}", node, value);
                Ok(value)
            }
            _ => Err(FilterError::unsupported(format!(
                "'{}' does not reduce to a single value",
                node
            ))),
        }
    }

    fn visit(&mut self, node: &ExpressionNode) -> FilterResult<()> {
        match node {
            ExpressionNode::BinaryOp { op, left, right } if op.is_arithmetic() => {
                self.visit(left)?;
                self.visit(right)?;
                self.apply(*op)
            }

            ExpressionNode::Long(value) => {
                let scaled = value.checked_mul(self.multiplier).ok_or_else(|| {
                    FilterError::unsupported(format!(
                        "arithmetic overflow scaling {} by {}",
                        value, self.multiplier
                    ))
                })?;
                self.multiplier = 1;
                self.stack.push(scaled);
                Ok(())
            }

            ExpressionNode::String(text) => {
                let millis = parse_date_millis(text, &self.config.date_formats).ok_or_else(
                    || FilterError::unsupported(format!("cannot parse '{}' as a date", text)),
                )?;
                self.stack.push(millis);
                Ok(())
            }

            ExpressionNode::Date(date) => {
                let millis = date_millis(*date).ok_or_else(|| {
                    FilterError::unsupported(format!("date {} is out of range", date))
                })?;
                self.stack.push(millis);
                Ok(())
            }

            ExpressionNode::Timestamp(ts) => {
                self.stack.push(timestamp_millis(*ts));
                Ok(())
            }

            ExpressionNode::Time(time) => {
                self.stack.push(time_millis(*time));
                Ok(())
            }

            ExpressionNode::Function { name, args } => match calendar_unit_millis(name) {
                Some(unit) => {
                    self.multiplier = unit;
                    for arg in args {
                        self.visit(arg)?;
                    }
                    Ok(())
                }
                None => Err(FilterError::unsupported(format!(
                    "function {} is not supported in arithmetic",
                    name
                ))),
            },

            other => Err(FilterError::unsupported(format!(
                "{} is not supported in arithmetic",
                other.describe()
            ))),
        }
    }

    /// Pop two operands and push `first op last`
    fn apply(&mut self, op: BinaryOperator) -> FilterResult<()> {
        let (last, first) = match (self.stack.pop(), self.stack.pop()) {
            (Some(last), Some(first)) => (last, first),
            _ => {
                return Err(FilterError::unsupported(format!(
                    "missing operand for {}",
                    op.describe()
                )))
            }
        };

        let result = match op {
            BinaryOperator::Add => first.checked_add(last),
            BinaryOperator::Sub => first.checked_sub(last),
            BinaryOperator::Mul => first.checked_mul(last),
            BinaryOperator::Div | BinaryOperator::IntegerDiv => {
                if last == 0 {
                    return Err(FilterError::unsupported("division by zero"));
                }
                first.checked_div(last)
            }
            other => {
                return Err(FilterError::unsupported(format!(
                    "{} is not supported in arithmetic",
                    other.describe()
                )))
            }
        };

        let value = result.ok_or_else(|| {
            FilterError::unsupported(format!(
                "arithmetic overflow in {} {} {}",
                first,
                op.as_str(),
                last
            ))
        })?;
        self.stack.push(value);
        Ok(())
    }
}

/// Reduce an arithmetic tree to a single long using `config`'s date formats
pub fn evaluate_arithmetic(node: &ExpressionNode, config: &FilterConfig) -> FilterResult<i64> {
    ArithmeticEvaluator::new(config).evaluate(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn eval(node: &ExpressionNode) -> FilterResult<i64> {
        evaluate_arithmetic(node, &FilterConfig::default())
    }

    fn days(n: i64) -> ExpressionNode {
        ExpressionNode::function("days", vec![ExpressionNode::Long(n)])
    }

    #[test]
    fn test_calendar_units() {
        assert_eq!(calendar_unit_millis("DAYS"), Some(86_400_000));
        assert_eq!(calendar_unit_millis("hour"), Some(3_600_000));
        assert_eq!(calendar_unit_millis("minutes"), Some(60_000));
        assert_eq!(calendar_unit_millis("second"), Some(1_000));
        assert_eq!(calendar_unit_millis("weeks"), None);
    }

    #[test]
    fn test_days_plus_millis() -> FilterResult<()> {
        let expr = ExpressionNode::add(days(2), ExpressionNode::Long(3_600_000));
        assert_eq!(eval(&expr)?, 176_400_000);
        Ok(())
    }

    #[test]
    fn test_multiplier_applies_once() -> FilterResult<()> {
        // hours(2) + 5 -> the multiplier is consumed by the 2
        let expr = ExpressionNode::add(
            ExpressionNode::function("hours", vec![ExpressionNode::Long(2)]),
            ExpressionNode::Long(5),
        );
        assert_eq!(eval(&expr)?, 2 * 3_600_000 + 5);
        Ok(())
    }

    #[test]
    fn test_date_string_difference() -> FilterResult<()> {
        let expr = ExpressionNode::sub(
            ExpressionNode::string("2020-01-01"),
            ExpressionNode::string("2019-12-31"),
        );
        assert_eq!(eval(&expr)?, 86_400_000);
        Ok(())
    }

    #[test]
    fn test_operand_order() -> FilterResult<()> {
        let sub = ExpressionNode::sub(ExpressionNode::Long(10), ExpressionNode::Long(3));
        assert_eq!(eval(&sub)?, 7);

        let div = ExpressionNode::binary_op(
            BinaryOperator::Div,
            ExpressionNode::Long(20),
            ExpressionNode::Long(4),
        );
        assert_eq!(eval(&div)?, 5);

        let int_div = ExpressionNode::binary_op(
            BinaryOperator::IntegerDiv,
            ExpressionNode::Long(7),
            ExpressionNode::Long(2),
        );
        assert_eq!(eval(&int_div)?, 3);

        // (10 - 3) - 2 and 10 - (3 - 2)
        let left_deep = ExpressionNode::sub(sub.clone(), ExpressionNode::Long(2));
        assert_eq!(eval(&left_deep)?, 5);
        let right_deep = ExpressionNode::sub(
            ExpressionNode::Long(10),
            ExpressionNode::sub(ExpressionNode::Long(3), ExpressionNode::Long(2)),
        );
        assert_eq!(eval(&right_deep)?, 9);
        Ok(())
    }

    #[test]
    fn test_typed_date_literal() -> FilterResult<()> {
        let date = NaiveDate::from_ymd_opt(1970, 1, 3).unwrap();
        let expr = ExpressionNode::sub(ExpressionNode::Date(date), days(1));
        assert_eq!(eval(&expr)?, 86_400_000);
        Ok(())
    }

    #[test]
    fn test_unparseable_date_fails() {
        let expr = ExpressionNode::add(ExpressionNode::string("soon"), ExpressionNode::Long(1));
        let err = eval(&expr).unwrap_err();
        assert!(err.to_string().contains("cannot parse 'soon'"));
    }

    #[test]
    fn test_rejected_nodes() {
        let modulo = ExpressionNode::binary_op(
            BinaryOperator::Modulo,
            ExpressionNode::Long(7),
            ExpressionNode::Long(2),
        );
        assert!(matches!(
            eval(&modulo),
            Err(FilterError::UnsupportedExpression(msg)) if msg.contains("modulo")
        ));

        let column = ExpressionNode::add(ExpressionNode::column("a"), ExpressionNode::Long(1));
        assert!(matches!(
            eval(&column),
            Err(FilterError::UnsupportedExpression(msg)) if msg.contains("column reference")
        ));

        let call = ExpressionNode::function("now", vec![]);
        assert!(matches!(
            eval(&call),
            Err(FilterError::UnsupportedExpression(msg)) if msg.contains("function now")
        ));
    }

    #[test]
    fn test_division_by_zero_and_overflow() {
        let div = ExpressionNode::binary_op(
            BinaryOperator::Div,
            ExpressionNode::Long(1),
            ExpressionNode::Long(0),
        );
        assert_eq!(
            eval(&div),
            Err(FilterError::unsupported("division by zero"))
        );

        let overflow = ExpressionNode::add(ExpressionNode::Long(i64::MAX), ExpressionNode::Long(1));
        assert!(eval(&overflow).is_err());
    }
}
