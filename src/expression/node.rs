//! Expression AST definitions.
//!
//! `ExpressionNode` is the boundary type between a SQL expression parser and
//! the filter pipeline. It can represent more than the pipeline accepts: the
//! extra variants exist so unsupported input is rejected by name rather than
//! misparsed.

use crate::expression::literal::{ColumnRef, Literal};
use crate::expression::operator::{BinaryOperator, ComparisonOp};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Right-hand side of an IN expression
#[derive(Debug, Clone, PartialEq)]
pub enum InItems {
    List(Vec<ExpressionNode>),
    SubSelect(String),
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    // Literals
    Long(i64),
    Double(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Null,

    /// Column reference
    Column(ColumnRef),

    /// Function call
    Function {
        name: String,
        args: Vec<ExpressionNode>,
    },

    /// Binary scalar operation (arithmetic and friends)
    BinaryOp {
        op: BinaryOperator,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },

    /// Binary comparison
    Comparison {
        op: ComparisonOp,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },

    Between {
        expr: Box<ExpressionNode>,
        low: Box<ExpressionNode>,
        high: Box<ExpressionNode>,
        negated: bool,
    },

    InList {
        expr: Box<ExpressionNode>,
        items: InItems,
        negated: bool,
    },

    Like {
        expr: Box<ExpressionNode>,
        pattern: Box<ExpressionNode>,
        negated: bool,
    },

    IsNull {
        expr: Box<ExpressionNode>,
        negated: bool,
    },

    Not(Box<ExpressionNode>),
    And(Box<ExpressionNode>, Box<ExpressionNode>),
    Or(Box<ExpressionNode>, Box<ExpressionNode>),

    // Not supported by the filter pipeline
    Boolean(bool),
    Parenthesis(Box<ExpressionNode>),
    SubSelect(String),
    Exists {
        subquery: String,
        negated: bool,
    },
    Case {
        operand: Option<Box<ExpressionNode>>,
        when_clauses: Vec<(ExpressionNode, ExpressionNode)>,
        else_clause: Option<Box<ExpressionNode>>,
    },
    Cast {
        expr: Box<ExpressionNode>,
        data_type: String,
    },
    /// Unary minus applied to a non-literal
    Negative(Box<ExpressionNode>),
}

impl ExpressionNode {
    pub fn column(name: impl Into<String>) -> Self {
        ExpressionNode::Column(ColumnRef::new(name))
    }

    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        ExpressionNode::Column(ColumnRef::qualified(table, name))
    }

    pub fn string(val: impl Into<String>) -> Self {
        ExpressionNode::String(val.into())
    }

    pub fn function(name: impl Into<String>, args: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Function {
            name: name.into(),
            args,
        }
    }

    pub fn binary_op(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: ComparisonOp, left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::compare(ComparisonOp::Eq, left, right)
    }

    pub fn ne(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::compare(ComparisonOp::Ne, left, right)
    }

    pub fn gt(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::compare(ComparisonOp::Gt, left, right)
    }

    pub fn ge(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::compare(ComparisonOp::Ge, left, right)
    }

    pub fn lt(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::compare(ComparisonOp::Lt, left, right)
    }

    pub fn le(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::compare(ComparisonOp::Le, left, right)
    }

    pub fn add(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    pub fn sub(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    pub fn between(expr: ExpressionNode, low: ExpressionNode, high: ExpressionNode) -> Self {
        ExpressionNode::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    pub fn in_list(expr: ExpressionNode, list: Vec<ExpressionNode>) -> Self {
        ExpressionNode::InList {
            expr: Box::new(expr),
            items: InItems::List(list),
            negated: false,
        }
    }

    pub fn like(expr: ExpressionNode, pattern: ExpressionNode) -> Self {
        ExpressionNode::Like {
            expr: Box::new(expr),
            pattern: Box::new(pattern),
            negated: false,
        }
    }

    pub fn is_null(expr: ExpressionNode) -> Self {
        ExpressionNode::IsNull {
            expr: Box::new(expr),
            negated: false,
        }
    }

    pub fn is_not_null(expr: ExpressionNode) -> Self {
        ExpressionNode::IsNull {
            expr: Box::new(expr),
            negated: true,
        }
    }

    pub fn not_expr(expr: ExpressionNode) -> Self {
        ExpressionNode::Not(Box::new(expr))
    }

    pub fn and(left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::Or(Box::new(left), Box::new(right))
    }

    /// Build the literal node for a value
    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Integer(v) => ExpressionNode::Long(*v as i64),
            Literal::Long(v) => ExpressionNode::Long(*v),
            Literal::Double(v) => ExpressionNode::Double(*v),
            Literal::String(s) => ExpressionNode::String(s.clone()),
            Literal::Date(d) => ExpressionNode::Date(*d),
            Literal::Time(t) => ExpressionNode::Time(*t),
            Literal::Timestamp(ts) => ExpressionNode::Timestamp(*ts),
            Literal::Null => ExpressionNode::Null,
        }
    }

    /// The literal value of this node, if it is a literal
    pub fn as_literal(&self) -> Option<Literal> {
        match self {
            ExpressionNode::Long(v) => Some(Literal::Long(*v)),
            ExpressionNode::Double(v) => Some(Literal::Double(*v)),
            ExpressionNode::String(s) => Some(Literal::String(s.clone())),
            ExpressionNode::Date(d) => Some(Literal::Date(*d)),
            ExpressionNode::Time(t) => Some(Literal::Time(*t)),
            ExpressionNode::Timestamp(ts) => Some(Literal::Timestamp(*ts)),
            ExpressionNode::Null => Some(Literal::Null),
            _ => None,
        }
    }

    /// Whether this node is an AND/OR combinator
    pub fn is_combinator(&self) -> bool {
        matches!(self, ExpressionNode::And(..) | ExpressionNode::Or(..))
    }

    /// Short description of the node kind, used to name rejected constructs
    pub fn describe(&self) -> &'static str {
        match self {
            ExpressionNode::Long(_) => "integer literal",
            ExpressionNode::Double(_) => "decimal literal",
            ExpressionNode::String(_) => "string literal",
            ExpressionNode::Date(_) => "date literal",
            ExpressionNode::Time(_) => "time literal",
            ExpressionNode::Timestamp(_) => "timestamp literal",
            ExpressionNode::Null => "NULL literal",
            ExpressionNode::Column(_) => "column reference",
            ExpressionNode::Function { .. } => "function call",
            ExpressionNode::BinaryOp { op, .. } => op.describe(),
            ExpressionNode::Comparison { .. } => "comparison",
            ExpressionNode::Between { .. } => "BETWEEN expression",
            ExpressionNode::InList { .. } => "IN expression",
            ExpressionNode::Like { .. } => "LIKE expression",
            ExpressionNode::IsNull { .. } => "IS NULL expression",
            ExpressionNode::Not(_) => "NOT expression",
            ExpressionNode::And(..) => "AND expression",
            ExpressionNode::Or(..) => "OR expression",
            ExpressionNode::Boolean(_) => "boolean literal",
            ExpressionNode::Parenthesis(_) => "parenthesized expression",
            ExpressionNode::SubSelect(_) => "sub-select",
            ExpressionNode::Exists { .. } => "EXISTS expression",
            ExpressionNode::Case { .. } => "CASE expression",
            ExpressionNode::Cast { .. } => "CAST expression",
            ExpressionNode::Negative(_) => "signed expression",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[ExpressionNode]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn not_prefix(negated: bool) -> &'static str {
    if negated {
        "NOT "
    } else {
        ""
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(literal) = self.as_literal() {
            return write!(f, "{}", literal);
        }
        match self {
            ExpressionNode::Column(col) => write!(f, "{}", col),
            ExpressionNode::Function { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            ExpressionNode::BinaryOp { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            ExpressionNode::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            ExpressionNode::Between {
                expr,
                low,
                high,
                negated,
            } => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                expr,
                not_prefix(*negated),
                low,
                high
            ),
            ExpressionNode::InList {
                expr,
                items,
                negated,
            } => {
                write!(f, "{} {}IN (", expr, not_prefix(*negated))?;
                match items {
                    InItems::List(list) => write_list(f, list)?,
                    InItems::SubSelect(sql) => f.write_str(sql)?,
                }
                f.write_str(")")
            }
            ExpressionNode::Like {
                expr,
                pattern,
                negated,
            } => write!(f, "{} {}LIKE {}", expr, not_prefix(*negated), pattern),
            ExpressionNode::IsNull { expr, negated } => {
                write!(f, "{} IS {}NULL", expr, not_prefix(*negated))
            }
            ExpressionNode::Not(inner) => write!(f, "NOT {}", inner),
            ExpressionNode::And(left, right) => write!(f, "{} AND {}", left, right),
            ExpressionNode::Or(left, right) => write!(f, "{} OR {}", left, right),
            ExpressionNode::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            ExpressionNode::Parenthesis(inner) => write!(f, "({})", inner),
            ExpressionNode::SubSelect(sql) => write!(f, "({})", sql),
            ExpressionNode::Exists { subquery, negated } => {
                write!(f, "{}EXISTS ({})", not_prefix(*negated), subquery)
            }
            ExpressionNode::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                f.write_str("CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {}", operand)?;
                }
                for (condition, result) in when_clauses {
                    write!(f, " WHEN {} THEN {}", condition, result)?;
                }
                if let Some(else_clause) = else_clause {
                    write!(f, " ELSE {}", else_clause)?;
                }
                f.write_str(" END")
            }
            ExpressionNode::Cast { expr, data_type } => {
                write!(f, "CAST({} AS {})", expr, data_type)
            }
            ExpressionNode::Negative(inner) => write!(f, "-{}", inner),
            // Literals are rendered above
            _ => Ok(()),
        }
    }
}
