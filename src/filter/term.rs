//! Term extraction from a single leaf condition.
//!
//! A leaf is walked left to right. The first literal, column or function met
//! becomes the term's subject and every later value is appended to the
//! term's object values. The accepted node kinds form a closed whitelist;
//! everything else is rejected with `UnsupportedExpression`.

use crate::config::FilterConfig;
use crate::expression::{
    ColumnRef, ExpressionNode, FilterError, FilterResult, InItems, Literal, OperatorKind,
};
use crate::filter::evaluator::evaluate_arithmetic;
use crate::filter::function::FunctionParameterExtractor;
use log::debug;
use serde::Serialize;
use std::fmt;

/// Left-hand side of a term
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Subject {
    Column(ColumnRef),
    /// Function call with at most one parameter
    Function {
        name: String,
        argument: Option<Literal>,
    },
    /// Literal found in first position
    Value(Literal),
}

impl Subject {
    /// Column or function name the subject refers to
    pub fn name(&self) -> Option<&str> {
        match self {
            Subject::Column(col) => Some(&col.name),
            Subject::Function { name, .. } => Some(name),
            Subject::Value(_) => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Column(col) => write!(f, "{}", col),
            Subject::Function { name, argument } => match argument {
                Some(arg) => write!(f, "{}({})", name, arg),
                None => write!(f, "{}()", name),
            },
            Subject::Value(lit) => write!(f, "{}", lit),
        }
    }
}

/// Object value of a term
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    Literal(Literal),
    /// Column on the right-hand side; renderers must not quote it
    Column(ColumnRef),
}

impl Operand {
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Operand::Literal(lit) => Some(lit),
            Operand::Column(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(lit) => write!(f, "{}", lit),
            Operand::Column(col) => write!(f, "{}", col),
        }
    }
}

/// One extracted condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    pub subject: Subject,
    pub operator: OperatorKind,
    pub negated: bool,
    pub values: Vec<Operand>,
}

impl Term {
    /// First column appearing among the object values
    pub fn right_column(&self) -> Option<&ColumnRef> {
        self.values.iter().find_map(|value| match value {
            Operand::Column(col) => Some(col),
            Operand::Literal(_) => None,
        })
    }

    /// Object values that are literals
    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.values.iter().filter_map(Operand::as_literal)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("NOT ")?;
        }
        write!(f, "{} {}", self.subject, self.operator)?;
        match self.operator {
            OperatorKind::IsNull | OperatorKind::IsNotNull => Ok(()),
            OperatorKind::Between if self.values.len() == 2 => {
                write!(f, " {} AND {}", self.values[0], self.values[1])
            }
            OperatorKind::In => {
                f.write_str(" (")?;
                for (i, value) in self.values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str(")")
            }
            _ => {
                for value in &self.values {
                    write!(f, " {}", value)?;
                }
                Ok(())
            }
        }
    }
}

/// Collects the pieces of a term during a walk
#[derive(Default)]
struct TermBuilder {
    subject: Option<Subject>,
    operator: Option<OperatorKind>,
    negated: bool,
    values: Vec<Operand>,
}

impl TermBuilder {
    fn push_literal(&mut self, literal: Literal) {
        if self.subject.is_none() {
            self.subject = Some(Subject::Value(literal));
        } else {
            self.values.push(Operand::Literal(literal));
        }
    }

    /// Record a NOT; a second one on the same condition is rejected
    fn negate(&mut self) -> FilterResult<()> {
        if self.negated {
            return Err(FilterError::unsupported("double negation is not supported"));
        }
        self.negated = true;
        Ok(())
    }

    fn build(self, node: &ExpressionNode) -> FilterResult<Term> {
        let (subject, operator) = match (self.subject, self.operator) {
            (Some(subject), Some(operator)) => (subject, operator),
            _ => {
                return Err(FilterError::unsupported(format!(
                    "'{}' is not a complete condition",
                    node
                )))
            }
        };

        let arity = operator.arity();
        if !arity.accepts(self.values.len()) {
            return Err(FilterError::unsupported(format!(
                "{} expects {} value(s) but '{}' has {}",
                operator,
                arity,
                node,
                self.values.len()
            )));
        }

        if operator == OperatorKind::Like {
            match self.values.first() {
                Some(Operand::Literal(Literal::String(_))) => {}
                Some(other) => {
                    return Err(FilterError::unsupported(format!(
                        "LIKE pattern must be a string literal, found {}",
                        other
                    )))
                }
                None => {}
            }
        }

        Ok(Term {
            subject,
            operator,
            negated: self.negated,
            values: self.values,
        })
    }
}

/// Extracts a `Term` from one leaf condition
pub struct TermExtractor<'a> {
    config: &'a FilterConfig,
}

impl<'a> TermExtractor<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, node: &ExpressionNode) -> FilterResult<Term> {
        let mut builder = TermBuilder::default();
        self.visit_condition(node, &mut builder)?;
        let term = builder.build(node)?;
        debug!("extracted term: {}", term);
        Ok(term)
    }

    fn visit_condition(
        &self,
        node: &ExpressionNode,
        builder: &mut TermBuilder,
    ) -> FilterResult<()> {
        match node {
            ExpressionNode::Not(inner) => {
                builder.negate()?;
                self.visit_condition(inner, builder)
            }

            ExpressionNode::Comparison { op, left, right } => {
                builder.operator = Some((*op).into());
                self.visit_operand(left, builder)?;
                self.visit_operand(right, builder)
            }

            ExpressionNode::Between {
                expr,
                low,
                high,
                negated,
            } => {
                builder.operator = Some(OperatorKind::Between);
                if *negated {
                    builder.negate()?;
                }
                self.visit_operand(expr, builder)?;
                self.visit_operand(low, builder)?;
                self.visit_operand(high, builder)
            }

            ExpressionNode::InList {
                expr,
                items,
                negated,
            } => {
                let list = match items {
                    InItems::List(list) => list,
                    InItems::SubSelect(_) => {
                        return Err(FilterError::unsupported(
                            "sub-selects are not supported in IN expressions",
                        ))
                    }
                };
                builder.operator = Some(OperatorKind::In);
                if *negated {
                    builder.negate()?;
                }
                self.visit_operand(expr, builder)?;
                for item in list {
                    self.visit_operand(item, builder)?;
                }
                Ok(())
            }

            ExpressionNode::Like {
                expr,
                pattern,
                negated,
            } => {
                builder.operator = Some(OperatorKind::Like);
                if *negated {
                    builder.negate()?;
                }
                self.visit_operand(expr, builder)?;
                self.visit_operand(pattern, builder)
            }

            ExpressionNode::IsNull { expr, negated } => {
                builder.operator = Some(if *negated {
                    OperatorKind::IsNotNull
                } else {
                    OperatorKind::IsNull
                });
                self.visit_operand(expr, builder)
            }

            ExpressionNode::And(..) | ExpressionNode::Or(..) => Err(FilterError::unsupported(
                "nested AND/OR is not supported inside a condition",
            )),

            ExpressionNode::Parenthesis(_) => Err(FilterError::unsupported(
                "parenthesized expressions are not supported",
            )),

            ExpressionNode::SubSelect(_) => {
                Err(FilterError::unsupported("sub-selects are not supported"))
            }

            ExpressionNode::Long(_)
            | ExpressionNode::Double(_)
            | ExpressionNode::String(_)
            | ExpressionNode::Date(_)
            | ExpressionNode::Time(_)
            | ExpressionNode::Timestamp(_)
            | ExpressionNode::Null
            | ExpressionNode::Column(_)
            | ExpressionNode::Function { .. } => Err(FilterError::unsupported(format!(
                "{} '{}' is not a condition",
                node.describe(),
                node
            ))),

            other => Err(FilterError::unsupported(format!(
                "{} is not supported",
                other.describe()
            ))),
        }
    }

    fn visit_operand(&self, node: &ExpressionNode, builder: &mut TermBuilder) -> FilterResult<()> {
        match node {
            ExpressionNode::Long(_)
            | ExpressionNode::Double(_)
            | ExpressionNode::String(_)
            | ExpressionNode::Date(_)
            | ExpressionNode::Time(_)
            | ExpressionNode::Timestamp(_)
            | ExpressionNode::Null => {
                if let Some(literal) = node.as_literal() {
                    builder.push_literal(literal);
                }
                Ok(())
            }

            ExpressionNode::Column(col) => {
                if builder.subject.is_none() {
                    builder.subject = Some(Subject::Column(col.clone()));
                } else {
                    builder.values.push(Operand::Column(col.clone()));
                }
                Ok(())
            }

            ExpressionNode::Function { name, args } => {
                let extractor = FunctionParameterExtractor::new(self.config);
                if builder.subject.is_none() {
                    if args.len() > 1 {
                        return Err(FilterError::unsupported(
                            "functions with multiple parameters not allowed as subject",
                        ));
                    }
                    let argument = extractor.extract_args(args)?.into_iter().next();
                    builder.subject = Some(Subject::Function {
                        name: name.clone(),
                        argument,
                    });
                } else {
                    builder
                        .values
                        .extend(extractor.extract(node)?.into_iter().map(Operand::Literal));
                }
                Ok(())
            }

            ExpressionNode::BinaryOp { op, .. } if op.is_arithmetic() => {
                if builder.subject.is_none() {
                    return Err(FilterError::unsupported(
                        "arithmetic expressions are not allowed as subject",
                    ));
                }
                let value = evaluate_arithmetic(node, self.config)?;
                builder.values.push(Operand::Literal(Literal::Long(value)));
                Ok(())
            }

            ExpressionNode::SubSelect(_) => {
                Err(FilterError::unsupported("sub-selects are not supported"))
            }

            ExpressionNode::Parenthesis(_) => Err(FilterError::unsupported(
                "parenthesized expressions are not supported",
            )),

            ExpressionNode::Comparison { .. }
            | ExpressionNode::Between { .. }
            | ExpressionNode::InList { .. }
            | ExpressionNode::Like { .. }
            | ExpressionNode::IsNull { .. }
            | ExpressionNode::Not(_)
            | ExpressionNode::And(..)
            | ExpressionNode::Or(..) => Err(FilterError::unsupported(format!(
                "{} is not supported as an operand",
                node.describe()
            ))),

            other => Err(FilterError::unsupported(format!(
                "{} is not supported",
                other.describe()
            ))),
        }
    }
}

/// Extract a term with the default configuration
pub fn extract_term(node: &ExpressionNode) -> FilterResult<Term> {
    TermExtractor::new(&FilterConfig::default()).extract(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::BinaryOperator;

    fn col(name: &str) -> ExpressionNode {
        ExpressionNode::column(name)
    }

    #[test]
    fn test_comparison() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::ge(col("age"), ExpressionNode::Long(21)))?;
        assert_eq!(term.subject, Subject::Column(ColumnRef::new("age")));
        assert_eq!(term.operator, OperatorKind::Ge);
        assert!(!term.negated);
        assert_eq!(term.values, vec![Operand::Literal(Literal::Long(21))]);
        Ok(())
    }

    #[test]
    fn test_between_keeps_order() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::between(
            col("qty"),
            ExpressionNode::Long(1),
            ExpressionNode::Long(10),
        ))?;
        assert_eq!(term.operator, OperatorKind::Between);
        assert_eq!(
            term.literals().cloned().collect::<Vec<_>>(),
            vec![Literal::Long(1), Literal::Long(10)]
        );
        Ok(())
    }

    #[test]
    fn test_in_list() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::in_list(
            col("status"),
            vec![ExpressionNode::string("new"), ExpressionNode::string("open")],
        ))?;
        assert_eq!(term.operator, OperatorKind::In);
        assert_eq!(term.values.len(), 2);
        Ok(())
    }

    #[test]
    fn test_in_sub_select_rejected() {
        let node = ExpressionNode::InList {
            expr: Box::new(col("id")),
            items: InItems::SubSelect("SELECT id FROM t".into()),
            negated: false,
        };
        let err = extract_term(&node).unwrap_err();
        assert!(err.to_string().contains("sub-selects"));
    }

    #[test]
    fn test_empty_in_list_rejected() {
        let node = ExpressionNode::in_list(col("id"), vec![]);
        assert!(extract_term(&node).is_err());
    }

    #[test]
    fn test_is_null_flag() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::is_null(col("email")))?;
        assert_eq!(term.operator, OperatorKind::IsNull);
        assert!(term.values.is_empty());

        let term = extract_term(&ExpressionNode::is_not_null(col("email")))?;
        assert_eq!(term.operator, OperatorKind::IsNotNull);
        assert!(!term.negated);
        Ok(())
    }

    #[test]
    fn test_not_sets_negated() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::not_expr(ExpressionNode::eq(
            col("a"),
            ExpressionNode::Long(1),
        )))?;
        assert!(term.negated);
        assert_eq!(term.operator, OperatorKind::Eq);

        let term = extract_term(&ExpressionNode::Like {
            expr: Box::new(col("name")),
            pattern: Box::new(ExpressionNode::string("J%")),
            negated: true,
        })?;
        assert!(term.negated);
        assert_eq!(term.operator, OperatorKind::Like);
        Ok(())
    }

    #[test]
    fn test_double_negation_rejected() {
        let eq = ExpressionNode::eq(col("a"), ExpressionNode::Long(1));
        let err = extract_term(&ExpressionNode::not_expr(ExpressionNode::not_expr(eq)))
            .unwrap_err();
        assert!(err.to_string().contains("double negation"));

        let not_in = ExpressionNode::InList {
            expr: Box::new(col("a")),
            items: InItems::List(vec![ExpressionNode::Long(1)]),
            negated: true,
        };
        let err = extract_term(&ExpressionNode::not_expr(not_in)).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedExpression(_)));
    }

    #[test]
    fn test_like_pattern_must_be_string() -> FilterResult<()> {
        let err = extract_term(&ExpressionNode::like(col("name"), ExpressionNode::Long(1)))
            .unwrap_err();
        assert!(err.to_string().contains("LIKE pattern must be a string literal"));

        assert!(extract_term(&ExpressionNode::like(col("name"), col("other"))).is_err());

        let term = extract_term(&ExpressionNode::like(col("name"), ExpressionNode::string("A%")))?;
        assert_eq!(term.values, vec![Operand::Literal(Literal::string("A%"))]);
        Ok(())
    }

    #[test]
    fn test_right_column() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::lt(
            col("start"),
            ExpressionNode::qualified_column("t", "finish"),
        ))?;
        assert_eq!(term.right_column(), Some(&ColumnRef::qualified("t", "finish")));
        assert_eq!(term.literals().count(), 0);
        Ok(())
    }

    #[test]
    fn test_function_subject() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::eq(
            ExpressionNode::function("lower", vec![col("name")]),
            ExpressionNode::string("bob"),
        ))?;
        assert_eq!(
            term.subject,
            Subject::Function {
                name: "lower".to_string(),
                argument: Some(Literal::string("name")),
            }
        );
        assert_eq!(term.subject.name(), Some("lower"));

        let err = extract_term(&ExpressionNode::eq(
            ExpressionNode::function("concat", vec![col("a"), col("b")]),
            ExpressionNode::string("ab"),
        ))
        .unwrap_err();
        assert_eq!(
            err,
            FilterError::unsupported("functions with multiple parameters not allowed as subject")
        );
        Ok(())
    }

    #[test]
    fn test_function_object_values() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::gt(
            col("created"),
            ExpressionNode::function("from_date", vec![ExpressionNode::string("1970-01-02")]),
        ))?;
        assert_eq!(term.values, vec![Operand::Literal(Literal::Long(86_400_000))]);
        Ok(())
    }

    #[test]
    fn test_arithmetic_object() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::lt(
            col("elapsed"),
            ExpressionNode::add(
                ExpressionNode::function("days", vec![ExpressionNode::Long(2)]),
                ExpressionNode::Long(3_600_000),
            ),
        ))?;
        assert_eq!(term.values, vec![Operand::Literal(Literal::Long(176_400_000))]);

        let err = extract_term(&ExpressionNode::lt(
            ExpressionNode::add(ExpressionNode::Long(1), ExpressionNode::Long(2)),
            col("x"),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("not allowed as subject"));
        Ok(())
    }

    #[test]
    fn test_rejected_constructs() {
        let sub_select = ExpressionNode::eq(col("a"), ExpressionNode::SubSelect("SELECT 1".into()));
        assert!(extract_term(&sub_select)
            .unwrap_err()
            .to_string()
            .contains("sub-selects"));

        let bitwise = ExpressionNode::eq(
            col("flags"),
            ExpressionNode::binary_op(
                BinaryOperator::BitwiseAnd,
                ExpressionNode::Long(1),
                ExpressionNode::Long(2),
            ),
        );
        assert!(extract_term(&bitwise)
            .unwrap_err()
            .to_string()
            .contains("bitwise AND"));

        let paren = ExpressionNode::Parenthesis(Box::new(ExpressionNode::eq(
            col("a"),
            ExpressionNode::Long(1),
        )));
        assert!(extract_term(&paren).is_err());

        let exists = ExpressionNode::Exists {
            subquery: "SELECT 1".into(),
            negated: false,
        };
        assert!(extract_term(&exists)
            .unwrap_err()
            .to_string()
            .contains("EXISTS"));

        assert!(extract_term(&col("active")).is_err());
        assert!(extract_term(&ExpressionNode::and(
            ExpressionNode::eq(col("a"), ExpressionNode::Long(1)),
            ExpressionNode::eq(col("b"), ExpressionNode::Long(2)),
        ))
        .is_err());
    }

    #[test]
    fn test_value_count_checked() {
        // A zero-parameter function as the object leaves `=` without a value
        let node = ExpressionNode::eq(col("a"), ExpressionNode::function("now", vec![]));
        let err = extract_term(&node).unwrap_err();
        assert!(err.to_string().contains("expects exactly 1"));
    }

    #[test]
    fn test_term_display() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::not_expr(ExpressionNode::between(
            col("qty"),
            ExpressionNode::Long(1),
            ExpressionNode::Long(10),
        )))?;
        assert_eq!(term.to_string(), "NOT qty BETWEEN 1 AND 10");

        let term = extract_term(&ExpressionNode::in_list(
            col("id"),
            vec![ExpressionNode::Long(1), ExpressionNode::Long(2)],
        ))?;
        assert_eq!(term.to_string(), "id IN (1, 2)");
        Ok(())
    }
}
